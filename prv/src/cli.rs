use crate::pypi::DEFAULT_INDEX_URL;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Verify that Python requirements files can be satisfied from the package index
#[derive(Parser, Debug, Clone)]
#[command(name = "prv")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Requirements files to verify
    #[arg(value_name = "PATH", default_value = "requirements.txt")]
    pub paths: Vec<PathBuf>,

    /// Base URL of the PyPI JSON API
    #[arg(long, value_name = "URL", default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// Timeout for a single registry lookup, in seconds
    #[arg(short, long, value_name = "SECS", default_value_t = 5)]
    pub timeout: u64,

    /// Maximum number of concurrent registry lookups
    #[arg(short, long, value_name = "N", default_value_t = 10)]
    pub jobs: usize,

    /// Give up on lookups still pending after this many seconds
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Also verify files referenced with -r / -c
    #[arg(short = 'r', long)]
    pub follow_refs: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Pretty,
    /// Machine-readable JSON report
    Json,
}
