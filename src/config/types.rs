use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::bandwidth::{parse_bandwidth, parse_size};
use crate::error::TrickleError;
use crate::throttle::Limit;

/// Verbosity level controlling tracing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (info level)
    Normal,
    /// Verbose output (debug level)
    Verbose,
    /// Maximum output (trace level)
    Trace,
}

impl From<(bool, u8)> for Verbosity {
    /// Convert from (quiet_flag, verbose_count) to Verbosity.
    ///
    /// - quiet=true -> Quiet (regardless of verbose count)
    /// - verbose=0  -> Normal
    /// - verbose=1  -> Verbose
    /// - verbose=2+ -> Trace
    fn from((quiet, verbose_count): (bool, u8)) -> Self {
        if quiet {
            Verbosity::Quiet
        } else {
            match verbose_count {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}

impl Verbosity {
    /// Return the tracing filter string for this verbosity level.
    pub fn as_tracing_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

/// Which end of the copy is throttled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Throttle reads from the source
    #[default]
    Read,
    /// Throttle writes to the destination
    Write,
}

/// Throttle settings as written in the config file or given on the command
/// line. Sizes and rates stay strings until [`resolve`](Self::resolve).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub rate: Option<String>,
    pub burst: Option<String>,
    pub buffer_size: Option<String>,
    pub timeout_secs: Option<u64>,
    pub side: Option<Side>,
}

impl ThrottleConfig {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: ThrottleConfig) -> ThrottleConfig {
        ThrottleConfig {
            rate: other.rate.or(self.rate),
            burst: other.burst.or(self.burst),
            buffer_size: other.buffer_size.or(self.buffer_size),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            side: other.side.or(self.side),
        }
    }

    /// Parse and validate into concrete settings.
    pub fn resolve(&self) -> Result<ThrottleSettings, TrickleError> {
        let rate = self.rate.as_deref().ok_or_else(|| {
            TrickleError::Config("No rate given; pass --rate or set `rate` in the config file".into())
        })?;
        let limit = parse_bandwidth(rate)?;
        let burst = self.burst.as_deref().map(parse_size).transpose()?;
        let buffer_size = self
            .buffer_size
            .as_deref()
            .map(parse_size)
            .transpose()?
            .unwrap_or(0);
        let timeout = match self.timeout_secs {
            Some(0) => {
                return Err(TrickleError::Config(
                    "Timeout must be greater than 0 seconds".to_string(),
                ))
            }
            secs => secs.map(Duration::from_secs),
        };

        Ok(ThrottleSettings {
            limit,
            burst,
            buffer_size,
            timeout,
            side: self.side.unwrap_or_default(),
        })
    }
}

/// Validated throttle settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleSettings {
    pub limit: Limit,
    /// Explicit burst; `None` means one second worth of `limit`.
    pub burst: Option<usize>,
    pub buffer_size: usize,
    pub timeout: Option<Duration>,
    pub side: Side,
}
