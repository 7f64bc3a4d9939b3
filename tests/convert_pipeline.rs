use wikidocify::extract::convert;
use wikidocify::formats::{GroupKey, LiveAnchor, PageRecord};

const BODY: &str = "This section walks through the component in enough detail that the \
    merged page clears the minimum size a page needs to be kept.";

/// Wraps `text` in a streamed push script, escaping it like the server does.
fn push(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("<script>self.__next_f.push([1,\"{escaped}\"])</script>")
}

fn page_markup(scripts: &[String], body_html: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>acme/widget | DeepWiki</title></head>\
         <body>{body_html}{}</body></html>",
        scripts.concat()
    )
}

fn slugs(pages: &[PageRecord]) -> Vec<&str> {
    pages.iter().map(|p| p.slug.as_str()).collect()
}

fn sidebar_payload() -> String {
    push(r#"{"sidebar":[{"title":"Overview","href":"/acme/widget/1-overview"}]}"#)
}

#[test]
fn same_title_fragments_become_one_page_with_one_heading() {
    let markup = page_markup(
        &[
            push(&format!("# 1-overview\n\n{BODY}")),
            push("# 1-overview\n## Details\nMore text about the details."),
        ],
        "",
    );
    let conversion = convert(&markup, &[]);

    assert_eq!(conversion.pages.len(), 1);
    let page = &conversion.pages[0];
    assert_eq!(page.slug, "1-overview");
    assert_eq!(page.content.matches("# 1-overview").count(), 1);
    assert!(page.content.contains("## Details"));
}

#[test]
fn dotted_section_title_keeps_its_number() {
    let markup = page_markup(&[push(&format!("# 4.1 Backend API Reference\n\n{BODY}"))], "");
    let conversion = convert(&markup, &[]);
    assert_eq!(slugs(&conversion.pages), vec!["4.1-backend-api-reference"]);
}

#[test]
fn fragment_too_short_contributes_nothing() {
    let short = "# Guide\nmarkerX";
    assert_eq!(short.chars().count(), 15);

    let markup = page_markup(&[push(&format!("# Guide\n\n{BODY}")), push(short)], "");
    let conversion = convert(&markup, &[]);

    assert_eq!(conversion.pages.len(), 1);
    assert!(!conversion.pages[0].content.contains("markerX"));
}

#[test]
fn navigation_hint_beats_title_slug() {
    let markup = page_markup(
        &[sidebar_payload(), push(&format!("# Overview\n\n{BODY}"))],
        "",
    );
    let conversion = convert(&markup, &[]);

    assert_eq!(slugs(&conversion.pages), vec!["1-overview"]);
    assert_eq!(conversion.pages[0].original_filename, None);
    assert_eq!(conversion.pages[0].order, 0);
}

#[test]
fn colliding_slugs_get_suffixes_in_encounter_order() {
    let markup = page_markup(
        &[
            push(&format!("# Setup\n\n{BODY}")),
            push(&format!("# Setup!\n\n{BODY}")),
        ],
        "",
    );
    let conversion = convert(&markup, &[]);

    let by_title = conversion
        .pages
        .iter()
        .map(|p| (p.title.as_str(), p.slug.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(by_title, vec![("Setup", "setup"), ("Setup!", "setup-1")]);
}

#[test]
fn live_anchor_overrides_payload_and_markup_navigation() {
    let scripts = [sidebar_payload(), push(&format!("# Overview\n\n{BODY}"))];
    let markup = page_markup(&scripts, r#"<nav><a href="/acme/widget/1-start">Overview</a></nav>"#);

    let without_live = convert(&markup, &[]);
    assert_eq!(slugs(&without_live.pages), vec!["1-start"]);

    let live = [LiveAnchor {
        text: "Overview".to_owned(),
        href: "https://deepwiki.test/acme/widget/1-intro".to_owned(),
    }];
    let with_live = convert(&markup, &live);
    assert_eq!(slugs(&with_live.pages), vec!["1-intro"]);
}

#[test]
fn pages_are_ordered_and_grouped_into_sections() {
    let markup = page_markup(
        &[
            push(&format!("# 2 Usage\n\n{BODY}")),
            push(&format!("# Glossary\n\n{BODY}")),
            push(&format!("# 1 Overview\n\n{BODY}")),
            push(&format!("# 2.1 Configuration\n\n{BODY}")),
            push(&format!("# 10 Appendix\n\n{BODY}")),
        ],
        "",
    );
    let conversion = convert(&markup, &[]);

    assert_eq!(
        slugs(&conversion.pages),
        vec![
            "1-overview",
            "glossary",
            "2-usage",
            "2.1-configuration",
            "10-appendix"
        ]
    );

    let groups = &conversion.navigation_tree.groups;
    let keys = groups.iter().map(|g| g.key).collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec![
            GroupKey::Section(1),
            GroupKey::Section(2),
            GroupKey::Section(10),
            GroupKey::CatchAll
        ]
    );
    let usage = &groups[1];
    assert_eq!(
        usage.heading.as_ref().map(|h| h.slug.as_str()),
        Some("2-usage")
    );
    assert_eq!(usage.entries.len(), 1);
    assert_eq!(usage.entries[0].slug, "2.1-configuration");
    assert_eq!(groups[3].entries[0].slug, "glossary");
}

#[test]
fn escaped_quotes_and_backslashes_survive_decoding() {
    let markup = page_markup(
        &[push(&format!(
            "# Strings\n\nUse \"double quotes\" and a path like C:\\Users.\n\n{BODY}"
        ))],
        "",
    );
    let conversion = convert(&markup, &[]);

    assert_eq!(conversion.pages.len(), 1);
    let content = &conversion.pages[0].content;
    assert!(content.contains("Use \"double quotes\""));
    assert!(content.contains(r"C:\Users."));
}
