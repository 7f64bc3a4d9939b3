use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::ExtractArgs;
use crate::formats::{Conversion, LiveAnchor};
use crate::scan::{PUSH_MARKER, discover_payloads, scan_segments};
use crate::unescape::normalize;

/// Converts one site's markup into ordered pages and a navigation tree.
///
/// `live_anchors` are anchors seen by a rendering collaborator and may be
/// empty. Never fails: a site with no recognisable content yields no pages.
pub fn convert(raw_markup: &str, live_anchors: &[LiveAnchor]) -> Conversion {
    let payloads = discover_payloads(raw_markup);
    let markup_anchors = crate::nav::markup_anchors(raw_markup);
    let signals = crate::nav::collect(&payloads, &markup_anchors, live_anchors);

    let fragments = payloads
        .iter()
        .flat_map(|payload| scan_segments(payload, PUSH_MARKER))
        .filter_map(|segment| crate::fragment::classify(normalize(segment)));
    let candidates = crate::aggregate::aggregate(fragments);
    let pages = crate::resolve::resolve(candidates, &signals);
    let navigation_tree = crate::toc::organize(&pages);

    tracing::info!(
        payloads = payloads.len(),
        pages = pages.len(),
        groups = navigation_tree.groups.len(),
        "converted site markup"
    );

    Conversion {
        pages,
        navigation_tree,
    }
}

/// Reads a JSON array of live anchors; no path means no anchors.
pub fn read_live_anchors(path: Option<&str>) -> anyhow::Result<Vec<LiveAnchor>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let json =
        std::fs::read_to_string(path).with_context(|| format!("read live anchors: {path}"))?;
    let anchors: Vec<LiveAnchor> =
        serde_json::from_str(&json).with_context(|| format!("parse live anchors: {path}"))?;
    tracing::debug!(anchors = anchors.len(), "loaded live anchors");
    Ok(anchors)
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let markup = std::fs::read_to_string(&args.html)
        .with_context(|| format!("read site markup: {}", args.html))?;
    let live_anchors = read_live_anchors(args.anchors.as_deref())?;

    let conversion = convert(&markup, &live_anchors);
    if conversion.pages.is_empty() {
        tracing::warn!(html = %args.html, "no pages extracted");
    }

    let out_dir = PathBuf::from(&args.out);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create extract output dir: {}", out_dir.display()))?;

    let pages_path = out_dir.join("pages.jsonl");
    let mut pages_jsonl = BufWriter::new(open_output(&pages_path, args.force)?);
    for page in &conversion.pages {
        serde_json::to_writer(&mut pages_jsonl, page).context("write page record json")?;
        pages_jsonl
            .write_all(b"\n")
            .context("write page record newline")?;
    }
    pages_jsonl
        .flush()
        .with_context(|| format!("flush pages: {}", pages_path.display()))?;

    let toc_path = out_dir.join("toc.yaml");
    let yaml =
        serde_yaml::to_string(&conversion.navigation_tree).context("serialize navigation tree")?;
    open_output(&toc_path, args.force)?
        .write_all(yaml.as_bytes())
        .with_context(|| format!("write toc: {}", toc_path.display()))?;

    tracing::info!(
        pages = conversion.pages.len(),
        out = %out_dir.display(),
        "wrote extracted pages"
    );
    Ok(())
}

fn open_output(path: &Path, force: bool) -> anyhow::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options
        .open(path)
        .with_context(|| format!("create output: {}", path.display()))
}
