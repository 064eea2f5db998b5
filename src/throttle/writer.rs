use std::io::{self, Write};
use std::sync::Arc;

use super::cancel::CancelToken;
use super::chunk::{throttled, Transferred};
use super::limiter::RateLimiter;

/// A `Write` wrapper whose throughput is bounded by a shared [`RateLimiter`].
///
/// Each sub-transfer is written first and paid for right after, in tokens
/// equal to the bytes the wrapped writer accepted.
pub struct RateLimitedWriter<W> {
    limiter: Arc<RateLimiter>,
    cancel: CancelToken,
    inner: W,
    pending: Option<io::Error>,
}

impl<W: Write> RateLimitedWriter<W> {
    /// Wrap `inner` with waits that can never be cancelled.
    pub fn new(limiter: Arc<RateLimiter>, inner: W) -> Self {
        Self::with_cancel(limiter, CancelToken::never(), inner)
    }

    /// Wrap `inner` with waits bound to `cancel` for the writer's lifetime.
    pub fn with_cancel(limiter: Arc<RateLimiter>, cancel: CancelToken, inner: W) -> Self {
        Self {
            limiter,
            cancel,
            inner,
            pending: None,
        }
    }

    /// Write `buf`, reporting the bytes written even when the call fails.
    pub fn write_partial(&mut self, buf: &[u8]) -> Transferred {
        let inner = &mut self.inner;
        throttled(&self.limiter, &self.cancel, buf.len(), |range| {
            inner.write(&buf[range])
        })
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RateLimitedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(err) = self.pending.take() {
            return Err(err);
        }
        match self.write_partial(buf) {
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

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
