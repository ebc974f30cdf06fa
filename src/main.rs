use anyhow::{Context, Result};
use apiprobe::cli::{self, Args};
use apiprobe::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let guard = logging::init(args.logging_config()?).context("failed to initialize logging")?;
    tracing::debug!(
        "logging to console={} file={:?}",
        guard.console_output(),
        guard.log_file_path()
    );

    cli::run(args).await
}
