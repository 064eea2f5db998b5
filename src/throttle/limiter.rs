use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::bucket::TokenBucket;
use super::cancel::CancelToken;
use super::limit::Limit;
use super::reader::RateLimitedReader;
use super::writer::RateLimitedWriter;
use super::WaitError;

/// Sub-transfer size used when no buffer size hint is configured: 32KB.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Shared rate configuration and token bucket for any number of decorators.
///
/// All getters and setters are safe to call from any thread while transfers
/// are in flight. A new value is observed by the next sub-transfer; a
/// sub-transfer already waiting keeps the delay it was given.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: TokenBucket,
    buffer_size: AtomicUsize,
}

impl RateLimiter {
    /// Create a limiter whose burst equals one second of `limit`.
    ///
    /// An unlimited `limit` gets a zero burst, which is never consulted while
    /// the limit stays unlimited. A `buffer_size` of zero selects
    /// [`DEFAULT_BUFFER_SIZE`] for chunked transfers.
    pub fn new(limit: Limit, buffer_size: usize) -> Self {
        let burst = if limit.is_inf() {
            0
        } else {
            limit.as_f64() as usize
        };
        Self::with_burst(limit, burst, buffer_size)
    }

    /// Create a limiter with an explicit burst.
    pub fn with_burst(limit: Limit, burst: usize, buffer_size: usize) -> Self {
        Self {
            bucket: TokenBucket::new(limit, burst),
            buffer_size: AtomicUsize::new(buffer_size),
        }
    }

    pub fn limit(&self) -> Limit {
        self.bucket.limit()
    }

    pub fn burst(&self) -> usize {
        self.bucket.burst()
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size.load(Ordering::Acquire)
    }

    pub fn set_limit(&self, limit: Limit) {
        tracing::debug!(%limit, "Rate limit changed");
        self.bucket.set_limit(limit);
    }

    pub fn set_burst(&self, burst: usize) {
        tracing::debug!(burst, "Burst changed");
        self.bucket.set_burst(burst);
    }

    pub fn set_buffer_size(&self, buffer_size: usize) {
        tracing::debug!(buffer_size, "Buffer size changed");
        self.buffer_size.store(buffer_size, Ordering::Release);
    }

    /// Block until `n` bytes worth of tokens have been consumed.
    ///
    /// Fails at once when `n` exceeds the burst (the bucket can never hold
    /// that many), when `cancel` has already fired, or when the wait would
    /// outlast the token's deadline. Fails early if `cancel` fires while
    /// sleeping. An unlimited limit always succeeds without waiting.
    pub fn wait_for_tokens(&self, cancel: &CancelToken, n: usize) -> Result<(), WaitError> {
        self.bucket.wait_n(cancel, n)
    }

    /// Whether a request of `len` bytes may go through as a single transfer.
    pub(crate) fn admits_whole(&self, len: usize) -> bool {
        if self.limit().is_inf() {
            return true;
        }
        let burst = self.burst();
        match self.buffer_size() {
            0 => len <= burst,
            hint => len <= hint && len <= burst,
        }
    }

    /// Size of the next sub-transfer when `remaining` bytes are left.
    ///
    /// Reads the live configuration, so a burst lowered mid-transfer shrinks
    /// the very next slice.
    pub(crate) fn slice_len(&self, remaining: usize) -> Result<usize, WaitError> {
        if self.limit().is_inf() {
            return Ok(remaining);
        }
        let burst = self.burst();
        let size = match self.buffer_size() {
            0 => DEFAULT_BUFFER_SIZE,
            hint => hint,
        }
        .min(burst);
        if size == 0 {
            return Err(WaitError::ExceedsBurst {
                requested: remaining,
                burst,
            });
        }
        Ok(size.min(remaining))
    }

    /// Wrap `inner` so reads from it are throttled by this limiter.
    pub fn reader<R: Read>(self: &Arc<Self>, inner: R) -> RateLimitedReader<R> {
        RateLimitedReader::new(Arc::clone(self), inner)
    }

    /// Like [`reader`](Self::reader), with waits bound to `cancel`.
    pub fn reader_with_cancel<R: Read>(
        self: &Arc<Self>,
        cancel: CancelToken,
        inner: R,
    ) -> RateLimitedReader<R> {
        RateLimitedReader::with_cancel(Arc::clone(self), cancel, inner)
    }

    /// Wrap `inner` so writes to it are throttled by this limiter.
    pub fn writer<W: Write>(self: &Arc<Self>, inner: W) -> RateLimitedWriter<W> {
        RateLimitedWriter::new(Arc::clone(self), inner)
    }

    /// Like [`writer`](Self::writer), with waits bound to `cancel`.
    pub fn writer_with_cancel<W: Write>(
        self: &Arc<Self>,
        cancel: CancelToken,
        inner: W,
    ) -> RateLimitedWriter<W> {
        RateLimitedWriter::with_cancel(Arc::clone(self), cancel, inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_burst_to_one_second_of_rate() {
        let limiter = RateLimiter::new(Limit::per_second(500 * 1024), 0);
        assert_eq!(limiter.burst(), 500 * 1024);
        assert_eq!(limiter.buffer_size(), 0);
        assert_eq!(limiter.limit(), Limit::per_second(500 * 1024));
    }

    #[test]
    fn new_unlimited_has_zero_burst() {
        let limiter = RateLimiter::new(Limit::INF, 4096);
        assert_eq!(limiter.burst(), 0);
        assert!(limiter.limit().is_inf());
        assert!(limiter.admits_whole(usize::MAX));
        assert_eq!(limiter.slice_len(1 << 40).unwrap(), 1 << 40);
    }

    #[test]
    fn setters_replace_each_field() {
        let limiter = RateLimiter::new(Limit::per_second(1000), 0);
        limiter.set_limit(Limit::per_second(2000));
        limiter.set_burst(300);
        limiter.set_buffer_size(64);
        assert_eq!(limiter.limit(), Limit::per_second(2000));
        assert_eq!(limiter.burst(), 300);
        assert_eq!(limiter.buffer_size(), 64);
        // Reads have no side effects.
        assert_eq!(limiter.burst(), 300);
    }

    #[test]
    fn whole_transfer_without_hint_follows_burst() {
        let limiter = RateLimiter::with_burst(Limit::per_second(1000), 1000, 0);
        assert!(limiter.admits_whole(1000));
        assert!(!limiter.admits_whole(1001));
    }

    #[test]
    fn whole_transfer_with_hint_still_respects_burst() {
        let limiter = RateLimiter::with_burst(Limit::per_second(1000), 100, 500);
        assert!(limiter.admits_whole(100));
        assert!(!limiter.admits_whole(400));

        limiter.set_burst(1000);
        assert!(limiter.admits_whole(500));
        assert!(!limiter.admits_whole(501));
    }

    #[test]
    fn slice_len_clamps_hint_and_default_to_burst() {
        let limiter = RateLimiter::with_burst(Limit::per_second(1), 1 << 20, 0);
        assert_eq!(limiter.slice_len(1 << 21).unwrap(), DEFAULT_BUFFER_SIZE);
        assert_eq!(limiter.slice_len(10).unwrap(), 10);

        limiter.set_buffer_size(4096);
        assert_eq!(limiter.slice_len(1 << 21).unwrap(), 4096);

        limiter.set_burst(1000);
        assert_eq!(limiter.slice_len(1 << 21).unwrap(), 1000);
    }

    #[test]
    fn zero_burst_cannot_slice() {
        let limiter = RateLimiter::with_burst(Limit::per_second(1000), 0, 0);
        assert_eq!(
            limiter.slice_len(64),
            Err(WaitError::ExceedsBurst {
                requested: 64,
                burst: 0
            })
        );
    }
}
