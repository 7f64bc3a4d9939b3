use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Commit reference used when the markup names none.
pub const DEFAULT_COMMIT: &str = "main";

const COMMIT_CHARS: usize = 8;

static GITHUB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)github\.com/([^/\s"'<>\\]+/[^/\s"'<>\\?#)]+)"#).unwrap()
});

static COMMIT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)commit[/_:\s]+([a-f0-9]{7,40})",
        r"(?i)sha[/_:\s]+([a-f0-9]{7,40})",
        r"(?i)revision[/_:\s]+([a-f0-9]{7,40})",
        r"(?i)github\.com/[^/]+/[^/]+/blob/([a-f0-9]{7,40})",
        r#"(?i)"commit"[^"]*"([a-f0-9]{7,40})""#,
        r#"(?i)"sha"[^"]*"([a-f0-9]{7,40})""#,
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SOURCES_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)Sources:[ \t]*(.+)$").unwrap());
static SOURCE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^:\]]+):(\d+)(?:-(\d+))?\]\(\)").unwrap());

/// Source repository that the documented project lives in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub repo_url: Option<String>,
    pub commit: String,
}

impl RepoInfo {
    /// Finds the repository URL and commit referenced by the markup.
    ///
    /// A two-segment `project_name` such as `owner/repo` stands in for the
    /// repository when the markup never links to one.
    pub fn detect(raw_markup: &str, project_name: &str) -> Self {
        let repo_url = GITHUB_REPO_RE
            .captures_iter(raw_markup)
            .map(|caps| caps[1].trim_end_matches('/').trim_end_matches(".git").to_owned())
            .find(|repo| repo.split('/').all(|part| !part.is_empty()))
            .map(|repo| format!("https://github.com/{repo}"))
            .or_else(|| {
                project_name
                    .contains('/')
                    .then(|| format!("https://github.com/{project_name}"))
            });

        let commit = COMMIT_RES
            .iter()
            .find_map(|re| re.captures(raw_markup))
            .map(|caps| caps[1].chars().take(COMMIT_CHARS).collect::<String>());

        match (&repo_url, &commit) {
            (None, _) => tracing::warn!("no source repository found"),
            (Some(repo), None) => {
                tracing::warn!(repo = %repo, commit = DEFAULT_COMMIT, "no commit found")
            }
            (Some(repo), Some(commit)) => {
                tracing::info!(repo = %repo, commit = %commit, "source repository")
            }
        }

        Self {
            repo_url,
            commit: commit.unwrap_or_else(|| DEFAULT_COMMIT.to_owned()),
        }
    }
}

/// Fills in the empty `[path:start-end]()` links on `Sources:` lines so they
/// point at the lines in the repository.
pub fn rewrite_sources(content: &str, repo: &RepoInfo) -> String {
    let Some(repo_url) = repo.repo_url.as_deref() else {
        return content.to_owned();
    };

    SOURCES_LINE_RE
        .replace_all(content, |line: &Captures<'_>| {
            let links = SOURCE_LINK_RE.replace_all(&line[1], |link: &Captures<'_>| {
                source_link(link, repo_url, &repo.commit)
            });
            format!("Sources: {links}")
        })
        .into_owned()
}

fn source_link(link: &Captures<'_>, repo_url: &str, commit: &str) -> String {
    let path = &link[1];
    let start = &link[2];
    match link.get(3) {
        Some(end) => {
            let end = end.as_str();
            format!("[{path}:{start}-{end}]({repo_url}/blob/{commit}/{path}#L{start}-L{end})")
        }
        None => format!("[{path}:{start}]({repo_url}/blob/{commit}/{path}#L{start})"),
    }
}
