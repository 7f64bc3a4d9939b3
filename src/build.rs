use std::path::PathBuf;

use anyhow::Context as _;

use crate::cli::BuildArgs;
use crate::fetch::FetchConfig;
use crate::site::{SiteInfo, WriteOptions};

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let out_dir = PathBuf::from(&args.out);
    // Fail before fetching; the writer clears the directory later when forced.
    if !args.force {
        crate::site::prepare_output_dir(&out_dir, false).context("check output directory")?;
    }

    let (markup, fetched_url) = match (&args.url, &args.html) {
        (Some(url), _) => {
            let url = crate::fetch::parse_site_url(url)?;
            let config = FetchConfig::from_env(args.timeout_secs);
            tracing::info!(url = %url, out = %out_dir.display(), "build: fetch");
            let markup = crate::fetch::fetch_markup(&url, &config).context("fetch")?;
            (markup, Some(url.to_string()))
        }
        (None, Some(html)) => {
            tracing::info!(html = %html, out = %out_dir.display(), "build: read markup");
            let markup = std::fs::read_to_string(html)
                .with_context(|| format!("read site markup: {html}"))?;
            (markup, None)
        }
        (None, None) => anyhow::bail!("either --url or --html is required"),
    };
    let site_url = args.base_url.or(fetched_url).unwrap_or_default();

    let live_anchors = crate::extract::read_live_anchors(args.anchors.as_deref())?;

    tracing::info!("build: convert");
    let conversion = crate::extract::convert(&markup, &live_anchors);

    tracing::info!("build: write site");
    let info = SiteInfo::from_markup(&markup, &site_url);
    let options = WriteOptions {
        force: args.force,
        multilingual: args.multilingual,
    };
    crate::site::write_site(&out_dir, &info, conversion, options).context("write site")?;

    Ok(())
}
