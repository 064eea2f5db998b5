//! Rate-limited stream decorators.
//!
//! A [`RateLimiter`] holds a shared token bucket (one token per byte) plus a
//! chunk-size hint. [`RateLimitedReader`] and [`RateLimitedWriter`] wrap any
//! `Read`/`Write` and charge the bucket for every byte that actually crosses
//! the wrapped stream, splitting large requests into sub-transfers no larger
//! than the bucket's burst.
//!
//! Several decorators may share one limiter; they then split its rate.

mod bucket;
pub mod cancel;
pub mod chunk;
pub mod limit;
pub mod limiter;
pub mod reader;
pub mod writer;

use std::io;

use thiserror::Error;

pub use self::cancel::CancelToken;
pub use self::chunk::Transferred;
pub use self::limit::Limit;
pub use self::limiter::{RateLimiter, DEFAULT_BUFFER_SIZE};
pub use self::reader::RateLimitedReader;
pub use self::writer::RateLimitedWriter;

/// Why a wait for tokens did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Rate wait cancelled")]
    Cancelled,

    #[error("Rate wait for {requested} bytes would exceed the deadline")]
    DeadlineExceeded { requested: usize },

    #[error("Rate wait for {requested} bytes exceeds limiter burst {burst}")]
    ExceedsBurst { requested: usize, burst: usize },

    #[error("Rate is zero and the bucket cannot supply {requested} bytes")]
    Starved { requested: usize },
}

impl From<WaitError> for io::Error {
    fn from(err: WaitError) -> Self {
        let kind = match err {
            WaitError::Cancelled | WaitError::Starved { .. } => io::ErrorKind::Other,
            WaitError::DeadlineExceeded { .. } => io::ErrorKind::TimedOut,
            WaitError::ExceedsBurst { .. } => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

/// Recover the [`WaitError`] carried by an `io::Error` returned from a
/// rate-limited stream, if it came from the limiter rather than the stream.
pub fn wait_error(err: &io::Error) -> Option<&WaitError> {
    err.get_ref().and_then(|inner| inner.downcast_ref::<WaitError>())
}
