use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Call that streams a payload chunk into the client-side router.
pub const PUSH_CALL: &str = "self.__next_f.push";

/// Opening of a pushed string literal; the segment starts right after it.
pub const PUSH_MARKER: &str = "self.__next_f.push([1,\"";

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("static selector"));

/// Returns the text of every `<script>` element that streams payload chunks,
/// in document order.
pub fn discover_payloads(raw_markup: &str) -> Vec<String> {
    let document = Html::parse_document(raw_markup);
    let mut payloads = Vec::new();
    let mut total_scripts = 0usize;

    for script in document.select(&SCRIPT_SELECTOR) {
        total_scripts += 1;
        let text = script.text().collect::<String>();
        if text.contains(PUSH_CALL) {
            payloads.push(text);
        }
    }

    tracing::debug!(
        scripts = total_scripts,
        payloads = payloads.len(),
        "discovered streamed payloads"
    );
    payloads
}

/// Returns the raw (still escaped) text following each occurrence of `marker`
/// up to the first unescaped double quote.
///
/// An occurrence whose string literal is never closed produces nothing.
pub fn scan_segments<'a>(payload: &'a str, marker: &str) -> Vec<&'a str> {
    if marker.is_empty() {
        return Vec::new();
    }

    payload
        .match_indices(marker)
        .filter_map(|(idx, _)| scan_one(&payload[idx + marker.len()..]))
        .collect()
}

fn scan_one(rest: &str) -> Option<&str> {
    let mut escaped = false;
    for (idx, ch) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => return Some(&rest[..idx]),
            _ => {}
        }
    }
    None
}
