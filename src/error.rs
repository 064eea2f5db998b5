use std::path::PathBuf;
use thiserror::Error;

use crate::throttle::{wait_error, WaitError};

#[derive(Error, Debug)]
pub enum TrickleError {
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Destination not writable: {}", path.display())]
    DestinationNotWritable { path: PathBuf },

    #[error("Permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Wait(#[from] WaitError),
}

impl TrickleError {
    /// Classify an error coming out of a throttled copy, surfacing limiter
    /// failures as `Wait` instead of a generic I/O error.
    pub fn from_transfer(err: std::io::Error) -> Self {
        match wait_error(&err) {
            Some(wait) => TrickleError::Wait(wait.clone()),
            None => TrickleError::Io { source: err },
        }
    }

    /// Returns a user-friendly suggestion for how to fix the error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            TrickleError::SourceNotFound { .. } => {
                Some("Check the path exists and spelling is correct.")
            }
            TrickleError::PermissionDenied { .. } => {
                Some("Try running with elevated privileges, or check file permissions.")
            }
            TrickleError::DestinationNotWritable { .. } => {
                Some("Check that the destination directory exists and you have write permission.")
            }
            TrickleError::Wait(WaitError::ExceedsBurst { .. }) => {
                Some("Raise --burst or lower --buffer-size so a single chunk fits in the burst.")
            }
            TrickleError::Wait(WaitError::DeadlineExceeded { .. }) => {
                Some("Increase --timeout or raise --rate.")
            }
            TrickleError::Wait(WaitError::Starved { .. }) => {
                Some("A zero rate only lets the initial burst through; set a positive --rate.")
            }
            _ => None,
        }
    }
}

impl From<toml::de::Error> for TrickleError {
    fn from(err: toml::de::Error) -> Self {
        TrickleError::Config(format!("Invalid config file: {}", err))
    }
}
