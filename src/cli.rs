use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Disk Cleaner - Fast disk usage analyzer and cleanup tool
#[derive(Parser, Debug)]
#[command(name = "disk-cleaner")]
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
    /// Analyze disk usage and list the largest items
    Analyze(AnalyzeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Directory (or file) to scan [default: home directory]
    pub path: Option<PathBuf>,

    /// Only show hidden files and folders
    #[arg(short = 'H', long)]
    pub only_hidden: bool,

    /// Minimum size threshold (e.g. 100KB, 10MB, 1GB)
    #[arg(short, long, value_name = "SIZE")]
    pub threshold: Option<String>,

    /// Show top N largest items
    #[arg(short = 'n', long, value_name = "N", allow_negative_numbers = true)]
    pub top: Option<i64>,

    /// Enable interactive deletion mode
    #[arg(short, long)]
    pub delete: bool,

    /// Write a CSV report of every item above the threshold
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Output the ranked items as JSON
    #[arg(long, conflicts_with = "delete")]
    pub json: bool,

    /// Do not follow symbolic links while scanning
    #[arg(short = 'P', long)]
    pub no_follow_symlinks: bool,
}
