use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "devlog",
    version,
    about = "View Cursor debug logs with streamed text deltas coalesced"
)]
pub struct Args {
    /// Path to the JSONL log file.
    pub file: PathBuf,

    /// Show raw payload JSON and high-frequency noise.
    #[arg(short, long)]
    pub verbose: bool,

    /// Keep reading as the file grows, like `tail -f`.
    #[arg(short, long)]
    pub follow: bool,

    /// Only show the last N lines (0 = all). Ignored with --follow.
    #[arg(long, default_value_t = 0)]
    pub last: usize,

    /// Config file to use instead of the default locations.
    #[arg(long)]
    pub config: Option<PathBuf>,
}
