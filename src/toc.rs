use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::formats::{GroupKey, NavEntry, NavGroup, NavigationTree, PageRecord, SequenceKey};

/// Major number reported for the catch-all group of unnumbered pages.
pub const CATCH_ALL_MAJOR: u32 = 999;

static SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?-").unwrap());

impl GroupKey {
    pub fn major(self) -> u32 {
        match self {
            GroupKey::Section(major) => major,
            GroupKey::CatchAll => CATCH_ALL_MAJOR,
        }
    }
}

/// Parses `1-overview` as `{1, None}` and `4.1-api` as `{4, Some(1)}`.
pub fn parse_sequence(slug: &str) -> Option<SequenceKey> {
    let caps = SEQUENCE_RE.captures(slug)?;
    let major = caps[1].parse().ok()?;
    let minor = match caps.get(2) {
        Some(m) => Some(m.as_str().parse().ok()?),
        None => None,
    };
    Some(SequenceKey { major, minor })
}

#[derive(Debug, Default)]
struct GroupBuilder {
    heading: Option<NavEntry>,
    entries: Vec<NavEntry>,
}

/// Groups pages into numbered sections for the sidebar.
///
/// Within a section the first page without a minor number becomes the
/// heading; every other page is listed beneath it by ascending minor number.
/// Unnumbered pages keep their input order in a catch-all group that always
/// comes last.
pub fn organize(pages: &[PageRecord]) -> NavigationTree {
    let mut groups: BTreeMap<GroupKey, GroupBuilder> = BTreeMap::new();
    let mut next_catch_all_minor = 1u32;

    for page in pages {
        let (key, minor) = match parse_sequence(&page.slug) {
            Some(SequenceKey { major, minor }) => (GroupKey::Section(major), minor),
            None => {
                let minor = next_catch_all_minor;
                next_catch_all_minor += 1;
                (GroupKey::CatchAll, Some(minor))
            }
        };

        let entry = NavEntry {
            title: page.title.clone(),
            slug: page.slug.clone(),
            minor,
        };
        let group = groups.entry(key).or_default();
        if minor.is_none() && group.heading.is_none() {
            group.heading = Some(entry);
        } else {
            group.entries.push(entry);
        }
    }

    let groups = groups
        .into_iter()
        .map(|(key, mut group)| {
            group
                .entries
                .sort_by_key(|entry| entry.minor.unwrap_or(u32::MAX));
            NavGroup {
                key,
                heading: group.heading,
                entries: group.entries,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(groups = groups.len(), "organized navigation tree");
    NavigationTree { groups }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, slug: &str) -> PageRecord {
        PageRecord {
            title: title.to_owned(),
            content: String::new(),
            slug: slug.to_owned(),
            original_filename: None,
            order: 0,
        }
    }

    fn slugs(entries: &[NavEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.slug.as_str()).collect()
    }

    #[test]
    fn parses_major_and_minor() {
        assert_eq!(
            parse_sequence("4.12-api"),
            Some(SequenceKey {
                major: 4,
                minor: Some(12)
            })
        );
        assert_eq!(
            parse_sequence("1000-big"),
            Some(SequenceKey {
                major: 1000,
                minor: None
            })
        );
        assert_eq!(parse_sequence("overview"), None);
        assert_eq!(parse_sequence("7"), None);
    }

    #[test]
    fn heading_and_sorted_sub_pages() {
        let tree = organize(&[
            page("API", "2.10-api"),
            page("Overview", "1-overview"),
            page("Setup", "2-setup"),
            page("Install", "2.2-install"),
            page("Arch", "1.1-architecture"),
        ]);
        assert_eq!(tree.groups.len(), 2);
        assert_eq!(tree.groups[0].key, GroupKey::Section(1));
        assert_eq!(
            tree.groups[0].heading.as_ref().map(|h| h.slug.as_str()),
            Some("1-overview")
        );
        assert_eq!(slugs(&tree.groups[0].entries), vec!["1.1-architecture"]);
        assert_eq!(
            tree.groups[1].heading.as_ref().map(|h| h.slug.as_str()),
            Some("2-setup")
        );
        assert_eq!(slugs(&tree.groups[1].entries), vec!["2.2-install", "2.10-api"]);
    }

    #[test]
    fn group_without_heading_still_lists_sub_pages() {
        let tree = organize(&[page("B", "3.2-b"), page("A", "3.1-a")]);
        assert_eq!(tree.groups[0].heading, None);
        assert_eq!(slugs(&tree.groups[0].entries), vec!["3.1-a", "3.2-b"]);
    }

    #[test]
    fn catch_all_is_last_and_keeps_encounter_order() {
        let tree = organize(&[
            page("Zeta", "zeta"),
            page("Big", "1000-big"),
            page("Alpha", "alpha"),
            page("Late", "999-late"),
        ]);
        let keys = tree.groups.iter().map(|g| g.key).collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                GroupKey::Section(999),
                GroupKey::Section(1000),
                GroupKey::CatchAll
            ]
        );
        let last = &tree.groups[2];
        assert_eq!(last.key.major(), CATCH_ALL_MAJOR);
        assert_eq!(slugs(&last.entries), vec!["zeta", "alpha"]);
        assert_eq!(last.entries[1].minor, Some(2));
    }

    #[test]
    fn second_unnumbered_page_in_a_section_is_not_lost() {
        let tree = organize(&[
            page("Intro", "1-intro"),
            page("Intro again", "1-intro-1"),
            page("Detail", "1.1-detail"),
        ]);
        assert_eq!(
            tree.groups[0].heading.as_ref().map(|h| h.slug.as_str()),
            Some("1-intro")
        );
        assert_eq!(slugs(&tree.groups[0].entries), vec!["1.1-detail", "1-intro-1"]);
    }
}
