use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = wikidocify::cli::Cli::parse();
    wikidocify::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        wikidocify::cli::Command::Fetch(args) => {
            wikidocify::fetch::run(args).context("fetch")?;
        }
        wikidocify::cli::Command::Extract(args) => {
            wikidocify::extract::run(args).context("extract")?;
        }
        wikidocify::cli::Command::Build(args) => {
            wikidocify::build::run(args).context("build")?;
        }
    }

    Ok(())
}
