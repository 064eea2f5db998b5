use std::io::{self, Read};
use std::sync::Arc;

use super::cancel::CancelToken;
use super::chunk::{throttled, Transferred};
use super::limiter::RateLimiter;

/// A `Read` wrapper whose throughput is bounded by a shared [`RateLimiter`].
///
/// Each read pulls bytes from the wrapped reader first and then waits for
/// the tokens those bytes cost, so a short read only pays for what it got.
pub struct RateLimitedReader<R> {
    limiter: Arc<RateLimiter>,
    cancel: CancelToken,
    inner: R,
    pending: Option<io::Error>,
}

impl<R: Read> RateLimitedReader<R> {
    /// Wrap `inner` with waits that can never be cancelled.
    pub fn new(limiter: Arc<RateLimiter>, inner: R) -> Self {
        Self::with_cancel(limiter, CancelToken::never(), inner)
    }

    /// Wrap `inner` with waits bound to `cancel` for the reader's lifetime.
    pub fn with_cancel(limiter: Arc<RateLimiter>, cancel: CancelToken, inner: R) -> Self {
        Self {
            limiter,
            cancel,
            inner,
            pending: None,
        }
    }

    /// Read into `buf`, reporting the bytes read even when the call fails.
    pub fn read_partial(&mut self, buf: &mut [u8]) -> Transferred {
        let inner = &mut self.inner;
        throttled(&self.limiter, &self.cancel, buf.len(), |range| {
            inner.read(&mut buf[range])
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for RateLimitedReader<R> {
    /// An error that follows partial progress is held back so the bytes can
    /// be returned first; the next call reports it.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        match self.read_partial(buf) {
            Transferred { bytes, error: None } => Ok(bytes),
            Transferred {
                bytes: 0,
                error: Some(err),
            } => Err(err),
            Transferred {
                bytes,
                error: Some(err),
            } => {
                self.pending = Some(err);
                Ok(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::throttle::{wait_error, Limit, WaitError};
    use std::io::Cursor;

    /// Hands out at most `max` bytes per call and records each request size.
    struct TrickleSource {
        data: Cursor<Vec<u8>>,
        max: usize,
        requests: Vec<usize>,
    }

    impl Read for TrickleSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.requests.push(buf.len());
            let n = buf.len().min(self.max);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn reads_data_correctly() {
        let data = b"Hello, throttled world! This is test data for reading.";
        let limiter = Arc::new(RateLimiter::new(Limit::per_second(1_000_000), 0));
        let mut reader = limiter.reader(Cursor::new(data.as_ref()));

        let mut output = Vec::new();
        io::copy(&mut reader, &mut output).unwrap();
        assert_eq!(output, data);
    }

    #[test]
    fn empty_source() {
        let limiter = Arc::new(RateLimiter::new(Limit::per_second(1_000_000), 0));
        let mut reader = limiter.reader(Cursor::new(Vec::<u8>::new()));

        let mut output = Vec::new();
        io::copy(&mut reader, &mut output).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn short_read_charges_only_bytes_read() {
        let limiter = Arc::new(RateLimiter::with_burst(Limit::ZERO, 1000, 0));
        let source = TrickleSource {
            data: Cursor::new(vec![7u8; 100]),
            max: 7,
            requests: Vec::new(),
        };
        let mut reader = limiter.reader(source);

        let mut buf = [0u8; 500];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(n, 7);
        assert_eq!(reader.get_ref().requests, vec![500]);

        // Exactly 993 of the 1000 token allowance is left.
        let cancel = CancelToken::never();
        limiter.wait_for_tokens(&cancel, 993).unwrap();
        assert_eq!(
            limiter.wait_for_tokens(&cancel, 1),
            Err(WaitError::Starved { requested: 1 })
        );
    }

    #[test]
    fn error_after_progress_is_deferred() {
        // Zero rate: the second 8-byte slice is read but its wait starves.
        let limiter = Arc::new(RateLimiter::with_burst(Limit::ZERO, 8, 0));
        let mut reader = limiter.reader(Cursor::new(vec![1u8; 64]));

        let mut buf = [0u8; 32];
        assert_eq!(reader.read(&mut buf).unwrap(), 16);

        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(wait_error(&err), Some(&WaitError::Starved { requested: 8 }));
    }

    #[test]
    fn into_inner_returns_wrapped_reader() {
        let limiter = Arc::new(RateLimiter::new(Limit::INF, 0));
        let reader = limiter.reader(Cursor::new(vec![1u8, 2, 3]));
        assert_eq!(reader.into_inner().into_inner(), vec![1, 2, 3]);
    }

    #[test]
    fn exposes_shared_limiter_and_inner_reader() {
        let limiter = Arc::new(RateLimiter::new(Limit::INF, 0));
        let mut reader = limiter.reader(Cursor::new(vec![1u8, 2, 3, 4]));
        assert!(Arc::ptr_eq(reader.limiter(), &limiter));

        reader.get_mut().set_position(2);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[3, 4]);
    }
}
