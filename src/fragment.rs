use std::sync::LazyLock;

use regex::Regex;

use crate::formats::ContentFragment;

/// Numbered page slug such as `1-overview` or `4.1-backend-api-reference`.
///
/// Each numeric component is capped at three digits so that years like
/// `2024-release` are not mistaken for section numbers.
pub const NUMBERED_SLUG: &str = r"\d{1,3}(?:\.\d{1,3})?-[a-zA-Z][a-zA-Z0-9-]*";

/// Fragments whose trimmed text is at most this many characters are noise.
pub const MIN_FRAGMENT_CHARS: usize = 20;

const MIN_SLUG_CHARS: usize = 5;

static QUOTED_SLUG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(&format!(r#""({NUMBERED_SLUG})""#)).unwrap(),
        Regex::new(&format!(r"'({NUMBERED_SLUG})'")).unwrap(),
    ]
});

static ENCODED_SLUG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(&format!(r"&quot;({NUMBERED_SLUG})&quot;")).unwrap(),
        Regex::new(&format!(r"(?i)%22({NUMBERED_SLUG})%22")).unwrap(),
    ]
});

static ROUTE_KEY_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)"pathname":\s*"[^"]*/([^"/]+)""#,
        r#"(?i)"href":\s*"[^"]*/([^"/]+)""#,
        r#"(?i)"slug":\s*"([^"]+)""#,
        r#"(?i)"params":\s*\{[^}]*"slug":\s*"([^"]*)""#,
        r#"(?i)"query":\s*\{[^}]*"slug":\s*"([^"]*)""#,
        r#"(?i)"page":\s*\{[^}]*"slug":\s*"([^"]*)""#,
        r#"(?i)"route":\s*"[^"]*/([^"/]+)""#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static ROUTE_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").unwrap());

type FilenameRule = fn(&str) -> Option<String>;

/// Tried in order; the first rule that yields a candidate wins.
///
/// Route keys are the weakest signal, so an encoded numbered slug outranks them
/// even though both are looked for after the plain quoted form.
const FILENAME_RULES: &[(&str, FilenameRule)] = &[
    ("quoted numbered slug", quoted_numbered_slug),
    ("encoded numbered slug", encoded_numbered_slug),
    ("route key", route_key_slug),
];

/// Builds a fragment from normalized text, or `None` when it is too short to
/// carry content.
pub fn classify(text: String) -> Option<ContentFragment> {
    if text.trim().chars().count() <= MIN_FRAGMENT_CHARS {
        return None;
    }

    let title = extract_title(&text).map(str::to_owned);
    let candidate_filename = candidate_filename(&text);
    if let Some(title) = title.as_deref() {
        tracing::debug!(title, filename = ?candidate_filename, "classified fragment");
    }

    Some(ContentFragment {
        title,
        body: text,
        candidate_filename,
    })
}

/// Returns the text of the first top-level (`# `) heading line.
pub fn extract_title(text: &str) -> Option<&str> {
    text.lines().find_map(heading_title)
}

/// Returns the heading text when `line` is a single-`#` markdown heading.
pub fn heading_title(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("# ")?.trim();
    if rest.is_empty() || rest.starts_with('#') {
        return None;
    }
    Some(rest)
}

/// Guesses the page's original filename from identifiers embedded in its text.
pub fn candidate_filename(text: &str) -> Option<String> {
    FILENAME_RULES.iter().find_map(|(name, rule)| {
        let found = rule(text)?;
        tracing::debug!(rule = name, filename = %found, "filename candidate");
        Some(found)
    })
}

fn quoted_numbered_slug(text: &str) -> Option<String> {
    QUOTED_SLUG_RES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .map(|caps| caps[1].to_owned())
        .filter(|slug| slug.len() >= MIN_SLUG_CHARS)
        .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

fn encoded_numbered_slug(text: &str) -> Option<String> {
    ENCODED_SLUG_RES.iter().find_map(|re| {
        re.captures_iter(text)
            .map(|caps| caps[1].to_owned())
            .find(|slug| slug.len() >= MIN_SLUG_CHARS)
    })
}

fn route_key_slug(text: &str) -> Option<String> {
    let candidates = route_candidates(text);
    candidates
        .iter()
        .filter(|c| c.contains('-'))
        .min_by_key(|c| c.chars().count())
        .or_else(|| candidates.iter().min_by_key(|c| c.chars().count()))
        .cloned()
}

fn route_candidates(text: &str) -> Vec<String> {
    ROUTE_KEY_RES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .map(|caps| caps[1].to_owned())
        .filter(|c| is_route_candidate(c))
        .collect()
}

fn is_route_candidate(candidate: &str) -> bool {
    candidate.chars().count() > 2
        && !candidate.chars().all(|c| c.is_ascii_digit())
        && ROUTE_CANDIDATE_RE.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_first_single_hash_heading() {
        let text = "intro\n## Sub\n#NoSpace\n# Real Title \n# Second";
        assert_eq!(extract_title(text), Some("Real Title"));
    }

    #[test]
    fn hash_hash_and_empty_headings_are_not_titles() {
        assert_eq!(extract_title("## Only sub\n# \n# # odd"), None);
    }

    #[test]
    fn short_fragments_are_discarded() {
        assert_eq!(classify("# Tiny page body".to_owned()), None);
    }

    #[test]
    fn classify_keeps_untitled_fragments() {
        let fragment = classify("plain streamed text without any heading".to_owned())
            .expect("long enough to classify");
        assert_eq!(fragment.title, None);
    }

    #[test]
    fn prefers_shortest_then_smallest_quoted_slug() {
        let text = r#"{"a":"2-setup","b":"10-zzzz","c":"1-setup","d":'3-xy'}"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("1-setup"));
    }

    #[test]
    fn quoted_slug_must_have_five_characters() {
        let text = r#"{"a":"1-ab","pathname":"/org/repo/getting-started"}"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("getting-started"));
    }

    #[test]
    fn dotted_sections_are_recognised() {
        let text = r#"see "4.1-backend-api-reference" for details"#;
        assert_eq!(
            candidate_filename(text).as_deref(),
            Some("4.1-backend-api-reference")
        );
    }

    #[test]
    fn four_digit_years_are_not_section_numbers() {
        let text = r#"released in "2024-spring" edition"#;
        assert_eq!(candidate_filename(text), None);
    }

    #[test]
    fn encoded_slug_outranks_route_keys() {
        let text = r#"{"slug":"installation-guide"} &quot;2-install&quot; %223-later%22"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("2-install"));
    }

    #[test]
    fn route_candidates_prefer_hyphenated_then_shortest() {
        let text = r#"{"slug":"overview"},{"href":"/x/getting-started"},{"route":"/x/setup-a"}"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("setup-a"));

        let text = r#"{"slug":"overview"},{"slug":"api"},{"slug":"12345"}"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("api"));
    }

    #[test]
    fn nested_params_slug_is_a_route_candidate() {
        let text = r#"{"params": {"id": 3, "slug": "config_ref"}}"#;
        assert_eq!(candidate_filename(text).as_deref(), Some("config_ref"));
    }

    #[test]
    fn escaped_quotes_are_plain_quotes_once_normalized() {
        let text = crate::unescape::normalize(r#"see \\\"2-install\\\" for setup"#);
        assert_eq!(text, r#"see "2-install" for setup"#);
        assert_eq!(candidate_filename(&text).as_deref(), Some("2-install"));
    }

    #[test]
    fn no_signal_means_no_candidate() {
        assert_eq!(candidate_filename("# Overview\n\nJust prose."), None);
    }
}
