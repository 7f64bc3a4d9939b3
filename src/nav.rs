use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::formats::{LiveAnchor, NavigationHint};
use crate::fragment::{NUMBERED_SLUG, heading_title};
use crate::scan::{PUSH_MARKER, scan_segments};
use crate::unescape::normalize;

static STRUCTURE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)"routes?":\s*\[([^\]]+)\]"#,
        r#"(?i)"paths?":\s*\[([^\]]+)\]"#,
        r#"(?i)"links?":\s*\[([^\]]+)\]"#,
        r#"(?i)"pages":\s*\[([^\]]+)\]"#,
        r#"(?i)"navigation":\s*\[([^\]]+)\]"#,
        r#"(?i)"sidebar":\s*\[([^\]]+)\]"#,
        r#"(?i)"menuItems":\s*\[([^\]]+)\]"#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static HREF_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)\{{[^}}]*"(?:href|path|route)":\s*"(?:[^"]*/)?{NUMBERED_SLUG}"[^}}]*\}}"#
    ))
    .unwrap()
});

static COLOCATED_RE: LazyLock<Regex> = LazyLock::new(|| {
    let link = format!(r#""(?:href|path|route)":\s*"(?:[^"]*/)?({NUMBERED_SLUG})""#);
    let title = r#""title":\s*"([^"]+)""#;
    Regex::new(&format!(
        r#"(?i)\{{[^}}]*?(?:{title}[^}}]*?{link}|{link}[^}}]*?{title})[^}}]*\}}"#
    ))
    .unwrap()
});

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title":\s*"([^"]+)""#).unwrap());
static ORDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""order":\s*(\d+)"#).unwrap());
static LEVEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""level":\s*(\d+)"#).unwrap());

static SLUG_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{NUMBERED_SLUG}$")).unwrap());
static LOOSE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+.*-[a-zA-Z]").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Weak structural signals gathered from one conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSignals {
    pub hints: Vec<NavigationHint>,
    /// Title to original filename; later sources overwrite earlier ones.
    pub filenames: HashMap<String, String>,
}

impl NavigationSignals {
    pub fn filename_for(&self, title: &str) -> Option<&str> {
        self.filenames.get(title).map(String::as_str)
    }

    /// Order of the first hint naming exactly this title.
    pub fn order_for(&self, title: &str) -> Option<u32> {
        self.hints
            .iter()
            .filter(|hint| hint.title == title)
            .find_map(|hint| hint.order)
    }
}

/// Gathers navigation hints from the payloads and folds anchor destinations
/// into the title to filename map.
///
/// Write order is payload hints, then `markup_anchors`, then `live_anchors`,
/// so a live-rendered anchor wins over everything else for the same title.
pub fn collect(
    payloads: &[String],
    markup_anchors: &[(String, String)],
    live_anchors: &[LiveAnchor],
) -> NavigationSignals {
    let decoded = payloads.iter().map(|p| normalize(p)).collect::<Vec<_>>();

    let mut hints = decoded
        .iter()
        .flat_map(|text| structural_hints(text))
        .collect::<Vec<_>>();
    if hints.is_empty() {
        let texts = payloads
            .iter()
            .flat_map(|payload| decoded_segments(payload))
            .collect::<Vec<_>>();
        hints = infer_hints_from_headings(&texts);
        tracing::debug!(
            hints = hints.len(),
            "no structural navigation found; inferred order from headings"
        );
    }

    let mut filenames = HashMap::new();
    for hint in &hints {
        if let Some(filename) = &hint.filename {
            filenames.insert(hint.title.clone(), filename.clone());
        }
    }

    for (title, filename) in markup_anchors {
        filenames.insert(title.clone(), filename.clone());
    }

    for anchor in live_anchors {
        let text = collapse_whitespace(&anchor.text);
        if text.is_empty() {
            continue;
        }
        let Some(filename) = filename_from_href(&anchor.href) else {
            continue;
        };
        tracing::debug!(title = %text, filename = %filename, "live anchor");
        filenames.insert(text, filename);
    }

    tracing::info!(
        hints = hints.len(),
        filenames = filenames.len(),
        "collected navigation signals"
    );

    NavigationSignals { hints, filenames }
}

/// Decoded pushed strings of a payload, or the whole decoded payload when it
/// holds no pushed string literal.
fn decoded_segments(payload: &str) -> Vec<String> {
    let segments = scan_segments(payload, PUSH_MARKER);
    if segments.is_empty() {
        return vec![normalize(payload)];
    }
    segments.into_iter().map(normalize).collect()
}

/// Hints from structural keys (`routes`, `sidebar`, ...) and from link
/// objects whose destination ends in a numbered slug.
pub fn structural_hints(text: &str) -> Vec<NavigationHint> {
    let mut hints = Vec::new();

    for re in STRUCTURE_RES.iter() {
        for caps in re.captures_iter(text) {
            hints.extend(parse_navigation_items(&caps[1]));
        }
    }

    for found in HREF_OBJECT_RE.find_iter(text) {
        hints.extend(parse_navigation_items(found.as_str()));
    }

    hints
}

/// Reads hints out of a JSON-like fragment.
///
/// Objects that carry both a title and a numbered link yield filename hints;
/// otherwise titles are paired positionally with any `order`/`level` values.
pub fn parse_navigation_items(content: &str) -> Vec<NavigationHint> {
    let mut items = Vec::new();

    for caps in COLOCATED_RE.captures_iter(content) {
        let title = caps.get(1).or_else(|| caps.get(4));
        let filename = caps.get(2).or_else(|| caps.get(3));
        let (Some(title), Some(filename)) = (title, filename) else {
            continue;
        };
        items.push(NavigationHint {
            title: title.as_str().to_owned(),
            filename: Some(filename.as_str().to_owned()),
            order: Some(items.len() as u32),
            level: Some(0),
        });
    }
    if !items.is_empty() {
        return items;
    }

    let orders = numbers(&ORDER_RE, content);
    let levels = numbers(&LEVEL_RE, content);
    TITLE_RE
        .captures_iter(content)
        .enumerate()
        .map(|(idx, caps)| NavigationHint {
            title: caps[1].to_owned(),
            filename: None,
            order: Some(orders.get(idx).copied().unwrap_or(idx as u32)),
            level: Some(levels.get(idx).copied().unwrap_or(0)),
        })
        .collect()
}

fn numbers(re: &Regex, content: &str) -> Vec<u32> {
    re.captures_iter(content)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Sequential hints from the order `# Heading` lines appear across payloads.
pub fn infer_hints_from_headings(texts: &[String]) -> Vec<NavigationHint> {
    texts
        .iter()
        .flat_map(|text| text.lines())
        .filter_map(heading_title)
        .filter(|title| title.chars().count() > 2)
        .enumerate()
        .map(|(idx, title)| NavigationHint {
            title: title.to_owned(),
            filename: None,
            order: Some(idx as u32),
            level: Some(0),
        })
        .collect()
}

/// Numbered slug from the last, or else second-to-last, path segment.
pub fn filename_from_href(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    let segments = path.trim_matches('/').split('/').collect::<Vec<_>>();
    segments
        .iter()
        .rev()
        .take(2)
        .find(|segment| SLUG_SEGMENT_RE.is_match(segment))
        .map(|segment| (*segment).to_owned())
}

/// `(title, filename)` pairs from `<a href>` elements in the page markup.
///
/// When no anchor carries a strict numbered slug, any path segment that starts
/// with a digit and has a hyphen before a letter is accepted instead.
pub fn markup_anchors(raw_markup: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(raw_markup);
    let anchors = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|el| {
            let href = el.value().attr("href")?.to_owned();
            let text = collapse_whitespace(&el.text().collect::<String>());
            (!href.is_empty() && !text.is_empty()).then_some((text, href))
        })
        .collect::<Vec<_>>();

    let strict = anchors
        .iter()
        .filter_map(|(text, href)| Some((text.clone(), filename_from_href(href)?)))
        .collect::<Vec<_>>();
    if !strict.is_empty() {
        tracing::debug!(anchors = anchors.len(), matched = strict.len(), "markup anchors");
        return strict;
    }

    let loose = anchors
        .iter()
        .filter(|(_, href)| href.contains('-'))
        .filter_map(|(text, href)| {
            let segment = href
                .trim_matches('/')
                .split('/')
                .find(|segment| LOOSE_SEGMENT_RE.is_match(segment))?;
            Some((text.clone(), segment.to_owned()))
        })
        .collect::<Vec<_>>();
    tracing::debug!(anchors = anchors.len(), matched = loose.len(), "loose markup anchors");
    loose
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
