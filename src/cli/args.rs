use std::path::PathBuf;

use clap::Parser;

use crate::config::types::{Side, ThrottleConfig};

#[derive(Parser, Debug)]
#[command(
    name = "trickle",
    version,
    about = "Copy a byte stream no faster than a given rate"
)]
pub struct Cli {
    /// Source file ("-" or omitted for stdin)
    pub source: Option<PathBuf>,

    /// Destination file ("-" or omitted for stdout)
    pub dest: Option<PathBuf>,

    /// Bandwidth limit (e.g., "10MB/s", "500KiB/s", "unlimited")
    #[arg(short, long)]
    pub rate: Option<String>,

    /// Largest amount that may pass without waiting (default: one second of --rate)
    #[arg(short, long)]
    pub burst: Option<String>,

    /// Preferred size of each throttled chunk (default: 32KiB, capped by --burst)
    #[arg(long)]
    pub buffer_size: Option<String>,

    /// Which side of the copy to throttle
    #[arg(long, value_enum)]
    pub side: Option<Side>,

    /// Give up waiting for bandwidth after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Show a progress bar on stderr
    #[arg(short, long)]
    pub progress: bool,

    /// Config file (default: <config dir>/trickle/config.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for verbose, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode: suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Throttle settings given on the command line, to overlay on the file.
    pub fn throttle_overrides(&self) -> ThrottleConfig {
        ThrottleConfig {
            rate: self.rate.clone(),
            burst: self.burst.clone(),
            buffer_size: self.buffer_size.clone(),
            timeout_secs: self.timeout,
            side: self.side,
        }
    }
}

/// `None` for "-" or a missing path, meaning a standard stream.
pub fn file_arg(path: &Option<PathBuf>) -> Option<&PathBuf> {
    path.as_ref().filter(|p| p.as_os_str() != "-")
}
