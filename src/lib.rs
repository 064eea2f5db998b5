//! Bandwidth throttling for byte streams.
//!
//! The [`throttle`] module is the library proper: a shared [`RateLimiter`]
//! and the [`RateLimitedReader`]/[`RateLimitedWriter`] decorators. The other
//! modules back the `trickle` command-line tool.
//!
//! ```no_run
//! use std::io::{self, Read};
//! use std::sync::Arc;
//! use trickle::{Limit, RateLimiter};
//!
//! let limiter = Arc::new(RateLimiter::new(Limit::per_second(512 * 1024), 0));
//! let mut reader = limiter.reader(io::stdin());
//! let mut data = Vec::new();
//! reader.read_to_end(&mut data)?;
//! # Ok::<(), io::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod progress;
pub mod throttle;
pub mod transfer;

pub use error::TrickleError;
pub use throttle::{
    CancelToken, Limit, RateLimitedReader, RateLimitedWriter, RateLimiter, Transferred,
    WaitError, DEFAULT_BUFFER_SIZE,
};
