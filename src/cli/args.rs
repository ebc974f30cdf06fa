use crate::core::OutputFormat;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run only the test whose `name` matches exactly
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Run only the tests defined in this file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, value_enum, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Override the configured concurrency (0 = available parallelism)
    #[arg(long, value_name = "N", help_heading = "Run Overrides")]
    pub concurrent: Option<usize>,

    /// Stop admitting new tests after the first failure
    #[arg(long, help_heading = "Run Overrides")]
    pub stop_on_fail: bool,

    /// Show URL and status for passing tests too
    #[arg(long, help_heading = "Output Options")]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Test name; also used for the file name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Path relative to baseUrl
    #[arg(value_name = "URL")]
    pub url: String,

    /// HTTP method
    #[arg(long, default_value = "GET", value_name = "METHOD")]
    pub method: String,

    /// Replace an existing file with the same name
    #[arg(long)]
    pub force: bool,
}
