//! Transfer statistics and the completion summary.

use std::time::{Duration, Instant};

use bytesize::ByteSize;

/// Byte total and wall-clock time for one copy.
pub struct TransferStats {
    pub bytes_done: u64,
    pub started: Instant,
}

impl TransferStats {
    pub fn start() -> Self {
        Self {
            bytes_done: 0,
            started: Instant::now(),
        }
    }

    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes_done += bytes;
    }

    /// Wall-clock elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Average throughput in bytes per second.
    pub fn throughput_bps(&self) -> u64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.bytes_done as f64 / secs) as u64
        } else {
            0
        }
    }

    /// One-line summary, e.g. `Completed: 1.0 MiB in 1.0s @ 1000.0 KiB/s`.
    pub fn summary(&self) -> String {
        format!(
            "Completed: {} in {:.1}s @ {}/s",
            ByteSize(self.bytes_done),
            self.elapsed().as_secs_f64(),
            ByteSize(self.throughput_bps()),
        )
    }

    /// Print the summary to stderr unless quiet.
    pub fn print_summary(&self, quiet: bool) {
        if quiet {
            return;
        }
        eprintln!("{}", self.summary());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stats_start_at_zero() {
        let stats = TransferStats::start();
        assert_eq!(stats.bytes_done, 0);
        assert_eq!(stats.throughput_bps(), 0);
    }

    #[test]
    fn add_bytes_accumulates() {
        let mut stats = TransferStats::start();
        stats.add_bytes(100);
        stats.add_bytes(200);
        assert_eq!(stats.bytes_done, 300);
    }

    #[test]
    fn summary_mentions_completion() {
        let mut stats = TransferStats::start();
        stats.add_bytes(2048);
        let line = stats.summary();
        assert!(line.starts_with("Completed: "));
        assert!(line.contains("/s"));
    }

    #[test]
    fn quiet_suppresses_output() {
        let stats = TransferStats::start();
        stats.print_summary(true);
    }
}
