//! The sub-transfer loop shared by the reader and writer decorators.

use std::io;
use std::ops::Range;

use super::cancel::CancelToken;
use super::limiter::RateLimiter;

/// Outcome of one throttled read or write call.
///
/// `bytes` is final even when `error` is set: bytes already moved through
/// the wrapped stream are never rolled back and their tokens never refunded.
#[derive(Debug)]
pub struct Transferred {
    pub bytes: usize,
    pub error: Option<io::Error>,
}

impl Transferred {
    fn done(bytes: usize) -> Self {
        Self { bytes, error: None }
    }

    fn failed(bytes: usize, error: impl Into<io::Error>) -> Self {
        Self {
            bytes,
            error: Some(error.into()),
        }
    }

    /// Collapse into a plain result, dropping the byte count on error.
    pub fn into_result(self) -> io::Result<usize> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.bytes),
        }
    }
}

/// Move `len` bytes through `transfer`, one slice at a time, charging the
/// limiter for what each slice actually moved before starting the next.
///
/// `transfer` receives the range of the caller's buffer to operate on and
/// returns how many bytes it moved. A slice that moves less than offered
/// ends the call: the stream had no more to give (or take) right now.
pub(crate) fn throttled<F>(
    limiter: &RateLimiter,
    cancel: &CancelToken,
    len: usize,
    mut transfer: F,
) -> Transferred
where
    F: FnMut(Range<usize>) -> io::Result<usize>,
{
    if len == 0 {
        return Transferred::done(0);
    }

    let mut done = 0;
    let mut whole = limiter.admits_whole(len);
    while done < len {
        let remaining = len - done;
        let slice = if whole {
            remaining
        } else {
            match limiter.slice_len(remaining) {
                Ok(slice) => slice,
                Err(err) => return Transferred::failed(done, err),
            }
        };
        whole = false;

        let n = match transfer(done..done + slice) {
            Ok(n) => n,
            Err(err) => return Transferred::failed(done, err),
        };
        done += n;

        if let Err(err) = limiter.wait_for_tokens(cancel, n) {
            return Transferred::failed(done, err);
        }
        if n < slice {
            break;
        }
    }
    Transferred::done(done)
}
