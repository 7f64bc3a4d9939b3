use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::aggregate::PageCandidate;
use crate::formats::PageRecord;
use crate::nav::NavigationSignals;

/// Order assigned to pages no navigation hint mentions; sorts last.
pub const UNORDERED: u32 = 9999;

/// Slug used when a title slugifies to nothing.
const FALLBACK_SLUG: &str = "page";

static NUMBERED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)*)[.\s-]*(.*)$").unwrap());
static NON_SLUG_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_-]+").unwrap());
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)").unwrap());

struct SlugInput<'a> {
    title: &'a str,
    candidate_filename: Option<&'a str>,
    signals: &'a NavigationSignals,
}

type SlugRule = fn(&SlugInput<'_>) -> Option<String>;

/// Tried in order; the first rule that yields a slug wins.
const SLUG_RULES: &[(&str, SlugRule)] = &[
    ("fragment filename", fragment_filename),
    ("navigation filename", navigation_filename),
    ("numbered title", numbered_title_slug),
    ("title", title_slug),
];

/// Assigns slugs and orders in encounter order, then sorts into reading order.
pub fn resolve(candidates: Vec<PageCandidate>, signals: &NavigationSignals) -> Vec<PageRecord> {
    let mut assigned = HashSet::new();
    let pages = candidates
        .into_iter()
        .map(|candidate| {
            let slug = resolve_slug(
                &candidate.title,
                candidate.candidate_filename.as_deref(),
                signals,
            );
            let slug = unique_slug(slug, &mut assigned);
            let order = signals.order_for(&candidate.title).unwrap_or(UNORDERED);
            PageRecord {
                title: candidate.title,
                content: candidate.content,
                slug,
                original_filename: candidate.candidate_filename,
                order,
            }
        })
        .collect::<Vec<_>>();

    sort_pages(pages)
}

pub fn resolve_slug(
    title: &str,
    candidate_filename: Option<&str>,
    signals: &NavigationSignals,
) -> String {
    let input = SlugInput {
        title,
        candidate_filename,
        signals,
    };
    SLUG_RULES
        .iter()
        .find_map(|(name, rule)| {
            let slug = rule(&input)?;
            tracing::debug!(title, rule = name, slug = %slug, "resolved slug");
            Some(slug)
        })
        .unwrap_or_else(|| FALLBACK_SLUG.to_owned())
}

fn fragment_filename(input: &SlugInput<'_>) -> Option<String> {
    input.candidate_filename.map(str::to_owned)
}

fn navigation_filename(input: &SlugInput<'_>) -> Option<String> {
    input.signals.filename_for(input.title).map(str::to_owned)
}

fn numbered_title_slug(input: &SlugInput<'_>) -> Option<String> {
    let caps = NUMBERED_TITLE_RE.captures(input.title)?;
    let number = &caps[1];
    let rest = slugify(&caps[2]);
    if rest.is_empty() {
        Some(number.to_owned())
    } else {
        Some(format!("{number}-{rest}"))
    }
}

fn title_slug(input: &SlugInput<'_>) -> Option<String> {
    Some(slugify(input.title)).filter(|slug| !slug.is_empty())
}

/// Lowercases, strips punctuation, and joins words with single hyphens.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped = NON_SLUG_CHARS_RE.replace_all(&lower, "");
    let joined = SEPARATOR_RUN_RE.replace_all(&stripped, "-");
    joined.trim_matches('-').to_owned()
}

/// Appends `-1`, `-2`, ... until `slug` is unused, then records it.
pub fn unique_slug(slug: String, assigned: &mut HashSet<String>) -> String {
    let mut unique = slug.clone();
    let mut counter = 1;
    while assigned.contains(&unique) {
        unique = format!("{slug}-{counter}");
        counter += 1;
    }
    assigned.insert(unique.clone());
    unique
}

/// Stable sort by leading number of the slug, else of the title, else hint
/// order, tie-broken by slug or title text.
pub fn sort_pages(mut pages: Vec<PageRecord>) -> Vec<PageRecord> {
    pages.sort_by_cached_key(sort_key);
    pages
}

fn sort_key(page: &PageRecord) -> (u64, String) {
    if let Some(number) = leading_number(&page.slug) {
        return (number, page.slug.clone());
    }
    if let Some(number) = leading_number(&page.title) {
        return (number, page.title.clone());
    }
    (u64::from(page.order), page.title.clone())
}

fn leading_number(text: &str) -> Option<u64> {
    LEADING_NUMBER_RE.captures(text)?[1].parse().ok()
}
