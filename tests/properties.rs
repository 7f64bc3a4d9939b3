//! Property-based tests for the conversion core.

use std::collections::HashSet;

use proptest::prelude::*;
use wikidocify::aggregate::PageCandidate;
use wikidocify::formats::{GroupKey, PageRecord};
use wikidocify::nav::NavigationSignals;
use wikidocify::resolve::{resolve, sort_pages};
use wikidocify::scan::{PUSH_MARKER, scan_segments};
use wikidocify::toc::organize;
use wikidocify::unescape::normalize;

/// Printable text with only properly paired escapes and no bare quote.
fn escaped_literal_strategy() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        "[a-zA-Z0-9 #.,:;!?(){}<>/-]{1,8}",
        Just("\\\"".to_owned()),
        Just("\\\\".to_owned()),
        Just("\\n".to_owned()),
        Just("\\u00e9".to_owned()),
    ];
    prop::collection::vec(token, 0..20).prop_map(|tokens| tokens.concat())
}

/// Text dense in backslashes and escape-like sequences.
fn escape_heavy_strategy() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        Just("\\".to_owned()),
        Just("\\\\".to_owned()),
        Just("\\n".to_owned()),
        Just("\\\"".to_owned()),
        Just("\\/".to_owned()),
        Just("\\u0026".to_owned()),
        Just("\\ud83d".to_owned()),
        Just("\\ude00".to_owned()),
        Just("u00e9".to_owned()),
        "[a-z\"/ ]{1,3}",
    ];
    prop::collection::vec(token, 0..24).prop_map(|tokens| tokens.concat())
}

fn title_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-c]{1,3}",
        "[A-C][a-c]{0,2}[!?]?",
        "[1-3] [a-c]{1,2}",
        "[1-3]\\.[1-3] [a-c]{1,2}",
        "[!?]{1,2}",
    ]
}

fn slug_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[1-9]{1,2}-[a-c]{1,3}",
        "[1-9]\\.[1-9]{1,2}-[a-c]{1,3}",
        "[a-c]{1,4}",
    ]
}

fn candidate(title: String, filename: Option<String>) -> PageCandidate {
    PageCandidate {
        content: format!("# {title}\n\nbody"),
        title,
        candidate_filename: filename,
    }
}

proptest! {
    #[test]
    fn scanner_returns_the_literal_it_was_given(literal in escaped_literal_strategy()) {
        let payload = format!("{PUSH_MARKER}{literal}\"])");
        prop_assert_eq!(scan_segments(&payload, PUSH_MARKER), vec![literal.as_str()]);
    }

    #[test]
    fn normalizer_is_idempotent(text in escape_heavy_strategy()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn normalizer_is_idempotent_on_arbitrary_text(text in ".{0,64}") {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn resolved_slugs_are_pairwise_distinct(
        pages in prop::collection::vec(
            (title_strategy(), prop::option::of(slug_strategy())),
            1..16,
        )
    ) {
        let candidates = pages
            .into_iter()
            .map(|(title, filename)| candidate(title, filename))
            .collect::<Vec<_>>();
        let count = candidates.len();
        let resolved = resolve(candidates, &NavigationSignals::default());

        let distinct = resolved.iter().map(|p| p.slug.as_str()).collect::<HashSet<_>>();
        prop_assert_eq!(distinct.len(), count);
        prop_assert!(resolved.iter().all(|p| !p.slug.is_empty()));
    }

    #[test]
    fn equal_sort_keys_keep_encounter_order(
        keys in prop::collection::vec((0u32..3, prop_oneof![Just("Alpha"), Just("Beta")]), 1..20)
    ) {
        let pages = keys
            .iter()
            .enumerate()
            .map(|(idx, (order, title))| PageRecord {
                title: (*title).to_owned(),
                content: idx.to_string(),
                slug: format!("page-{idx}"),
                original_filename: None,
                order: *order,
            })
            .collect::<Vec<_>>();

        let sorted = sort_pages(pages);
        for pair in sorted.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!((a.order, &a.title) <= (b.order, &b.title));
            if (a.order, &a.title) == (b.order, &b.title) {
                let (ia, ib) = (a.content.parse::<usize>(), b.content.parse::<usize>());
                prop_assert!(ia.ok() < ib.ok());
            }
        }
    }

    #[test]
    fn catch_all_group_is_always_last(
        slugs in prop::collection::vec(slug_strategy(), 1..24)
    ) {
        let pages = slugs
            .iter()
            .map(|slug| PageRecord {
                title: slug.clone(),
                content: String::new(),
                slug: slug.clone(),
                original_filename: None,
                order: 0,
            })
            .collect::<Vec<_>>();
        let tree = organize(&pages);

        let keys = tree.groups.iter().map(|g| g.key).collect::<Vec<_>>();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(&keys, &sorted);

        let has_unnumbered = slugs.iter().any(|s| !s.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert_eq!(keys.last() == Some(&GroupKey::CatchAll), has_unnumbered);

        let listed = tree
            .groups
            .iter()
            .map(|g| g.entries.len() + usize::from(g.heading.is_some()))
            .sum::<usize>();
        prop_assert_eq!(listed, pages.len());
    }
}
