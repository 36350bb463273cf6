use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// envscope - detect the environment this process runs in
#[derive(Parser, Debug)]
#[command(name = "envscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every detector and print the results
    Detect(DetectArgs),

    /// Print a one-line environment summary
    Summary,

    /// Test a single environment flag
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Run detectors concurrently
    #[arg(long = "async")]
    pub asynchronous: bool,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Flag to test
    #[arg(value_enum)]
    pub flag: CheckFlag,
}

/// Boolean facts `check` can test.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckFlag {
    Windows,
    Macos,
    Linux,
    Container,
    Docker,
    Wsl,
    Kubernetes,
    Ci,
    Cloud,
    Serverless,
    Elevated,
    Development,
    Production,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
