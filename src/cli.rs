use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Log at debug level when `RUST_LOG` is not set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Fetch(FetchArgs),
    Extract(ExtractArgs),
    Build(BuildArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Site URL (must be http/https).
    #[arg(long)]
    pub url: String,

    /// Output file for the fetched markup.
    #[arg(long)]
    pub out: String,

    /// HTTP request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Saved site markup (created by `fetch`).
    #[arg(long)]
    pub html: String,

    /// JSON array of `{ "text", "href" }` anchors observed in a rendered page.
    #[arg(long)]
    pub anchors: Option<String>,

    /// Output directory for `pages.jsonl` and `toc.yaml`.
    #[arg(long)]
    pub out: String,

    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Site URL to fetch (must be http/https).
    #[arg(long, conflicts_with = "html", required_unless_present = "html")]
    pub url: Option<String>,

    /// Saved site markup to convert instead of fetching.
    #[arg(long)]
    pub html: Option<String>,

    /// Output directory for the generated docsify site.
    #[arg(long)]
    pub out: String,

    /// JSON array of `{ "text", "href" }` anchors observed in a rendered page.
    #[arg(long)]
    pub anchors: Option<String>,

    /// Site URL used for project naming (default: `--url`).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Clear a non-empty output directory first.
    #[arg(long)]
    pub force: bool,

    /// Write `zh-cn/` and `en/` page trees behind a language-selection page.
    #[arg(long)]
    pub multilingual: bool,

    /// HTTP request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}
