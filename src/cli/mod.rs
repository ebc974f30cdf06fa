pub mod args;
pub mod commands;

pub use args::{CreateArgs, RunArgs};
use crate::core::config::DEFAULT_CONFIG_FILE;
use crate::logging::{ConsoleOutput, LoggingConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
COMMANDS:\n{subcommands}\n";

#[derive(Parser, Debug)]
#[command(name = "apiprobe")]
#[command(version = crate::VERSION)]
#[command(about = "Parallel HTTP endpoint checks driven by declarative YAML expectations")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: create a test, list what was discovered, then run the suite."
)]
pub struct Args {
    /// Global run configuration
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE, value_name = "FILE")]
    pub config: PathBuf,

    /// Tracing level or directive (RUST_LOG wins when set)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Console sink for logs
    #[arg(long, global = true, value_enum, value_name = "SINK")]
    pub log_console: Option<ConsoleOutput>,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn logging_config(&self) -> crate::Result<LoggingConfig> {
        LoggingConfig::load(
            self.log_level.as_deref(),
            self.log_file.clone(),
            self.log_console,
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(
        about = "Run endpoint tests",
        long_about = "Run loads every test document, applies transforms, and checks each endpoint concurrently. Exits non-zero when any test fails.",
        after_help = "Examples:\n    apiprobe run\n    apiprobe run --name 'Health Check'\n    apiprobe run --file test/configs/users.yaml --format json"
    )]
    Run(RunArgs),
    #[command(about = "List discovered tests")]
    List,
    #[command(
        about = "Show available transforms",
        long_about = "Extensions lists built-in and user transforms, the active precedence, and any manifest problems."
    )]
    Extensions,
    #[command(about = "Show the effective configuration")]
    Info,
    #[command(
        about = "Create a new test file",
        after_help = "Example:\n    apiprobe create 'Health Check' /health --method GET"
    )]
    Create(CreateArgs),
}

pub async fn run(args: Args) -> crate::Result<()> {
    let config_path = args.config;
    match args.command {
        Command::Run(run_args) => commands::run(&config_path, run_args).await,
        Command::List => commands::list(&config_path),
        Command::Extensions => commands::extensions(&config_path),
        Command::Info => commands::info(&config_path),
        Command::Create(create_args) => commands::create(&config_path, create_args),
    }
}
