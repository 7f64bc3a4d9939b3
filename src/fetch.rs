use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use url::Url;

use crate::cli::FetchArgs;

pub const USER_AGENT_ENV: &str = "WIKIDOCIFY_USER_AGENT";
pub const DEFAULT_USER_AGENT: &str = concat!("wikidocify/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl FetchConfig {
    pub fn new(timeout_secs: u64, user_agent: Option<String>) -> Self {
        let user_agent = user_agent
            .map(|ua| ua.trim().to_owned())
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned());
        Self {
            user_agent,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    /// Reads the user agent override from `WIKIDOCIFY_USER_AGENT`.
    pub fn from_env(timeout_secs: u64) -> Self {
        Self::new(timeout_secs, std::env::var(USER_AGENT_ENV).ok())
    }
}

pub fn parse_site_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("parse --url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("--url must be http/https: {url}");
    }
    Ok(url)
}

/// GETs the page and returns its body as text.
pub fn fetch_markup(url: &Url, config: &FetchConfig) -> anyhow::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(config.timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")?;

    tracing::info!(url = %url, "fetching site markup");
    let response = client
        .get(url.clone())
        .header(USER_AGENT, &config.user_agent)
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("GET {url}: unexpected status {status}");
    }
    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        && !content_type.to_ascii_lowercase().contains("html")
    {
        tracing::warn!(url = %url, content_type, "response is not html");
    }

    let markup = response
        .text()
        .with_context(|| format!("read response body: {url}"))?;
    tracing::debug!(bytes = markup.len(), "fetched site markup");
    Ok(markup)
}

pub fn run(args: FetchArgs) -> anyhow::Result<()> {
    let url = parse_site_url(&args.url)?;
    let config = FetchConfig::from_env(args.timeout_secs);
    let markup = fetch_markup(&url, &config)?;

    let out_path = PathBuf::from(&args.out);
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output parent dir: {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&out_path)
        .with_context(|| format!("create markup file: {}", out_path.display()))?;
    file.write_all(markup.as_bytes())
        .with_context(|| format!("write markup file: {}", out_path.display()))?;

    tracing::info!(out = %out_path.display(), bytes = markup.len(), "saved site markup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert!(parse_site_url("ftp://example.com/o/r").is_err());
        assert!(parse_site_url("not a url").is_err());
        assert!(parse_site_url("https://example.com/o/r").is_ok());
    }

    #[test]
    fn blank_user_agent_falls_back_to_default() {
        let config = FetchConfig::new(0, Some("  ".to_owned()));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.timeout, Duration::from_secs(1));

        let config = FetchConfig::new(5, Some("docs-bot/2".to_owned()));
        assert_eq!(config.user_agent, "docs-bot/2");
    }
}
