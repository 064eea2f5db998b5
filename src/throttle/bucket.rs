use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as GovernorRateLimiter};
use parking_lot::Mutex;

use super::cancel::CancelToken;
use super::limit::Limit;
use super::WaitError;

/// Shortest replenish period handed to governor, which counts in nanoseconds.
const MIN_PERIOD_NANOS: f64 = 2.0;

/// Admission gate built from one (limit, burst) pair.
enum Gate {
    Unlimited,
    /// Zero rate, or one too slow for governor to represent: the initial
    /// burst is all that will ever be admitted.
    Fixed { remaining: AtomicUsize },
    /// Each governor cell stands for `unit` bytes so that very high rates
    /// and bursts fit its nanosecond periods and `u32` burst.
    Governed {
        limiter: DefaultDirectRateLimiter,
        unit: usize,
    },
}

impl Gate {
    fn build(limit: Limit, burst: usize, clock: &DefaultClock) -> Gate {
        if limit.is_inf() {
            return Gate::Unlimited;
        }
        let fixed = Gate::Fixed {
            remaining: AtomicUsize::new(burst),
        };
        let rate = limit.as_f64();
        if rate <= 0.0 || burst == 0 {
            return fixed;
        }

        let unit = (rate / (1e9 / MIN_PERIOD_NANOS))
            .ceil()
            .max(burst.div_ceil(u32::MAX as usize) as f64)
            .max(1.0) as usize;
        let Some(cells) = u32::try_from(burst.div_ceil(unit))
            .ok()
            .and_then(NonZeroU32::new)
        else {
            return fixed;
        };
        let Ok(period) = Duration::try_from_secs_f64(unit as f64 / rate) else {
            return fixed;
        };
        // governor multiplies the period by the burst in u64 nanoseconds.
        if period.as_nanos().saturating_mul(u128::from(cells.get())) > u128::from(u64::MAX / 4) {
            return fixed;
        }
        match Quota::with_period(period) {
            Some(quota) => Gate::Governed {
                limiter: GovernorRateLimiter::direct_with_clock(quota.allow_burst(cells), clock),
                unit,
            },
            None => fixed,
        }
    }

    /// Take `n` bytes worth of tokens now, or report how long until they
    /// could be taken. Nothing is taken unless `Ok(None)` is returned.
    fn try_take(
        &self,
        n: usize,
        burst: usize,
        clock: &DefaultClock,
    ) -> Result<Option<Duration>, WaitError> {
        match self {
            Gate::Unlimited => Ok(None),
            Gate::Fixed { remaining } => remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| left.checked_sub(n))
                .map(|_| None)
                .map_err(|_| WaitError::Starved { requested: n }),
            Gate::Governed { limiter, unit } => {
                let cells = u32::try_from(n.div_ceil(*unit))
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(WaitError::ExceedsBurst {
                        requested: n,
                        burst,
                    })?;
                match limiter.check_n(cells) {
                    Ok(Ok(())) => Ok(None),
                    Ok(Err(not_until)) => Ok(Some(not_until.wait_time_from(clock.now()))),
                    Err(_) => Err(WaitError::ExceedsBurst {
                        requested: n,
                        burst,
                    }),
                }
            }
        }
    }
}

/// Byte-granular token bucket backed by governor's GCRA limiter.
///
/// Limit and burst are kept in atomics so readers never block. Changing
/// either rebuilds the gate under the lock; the new gate starts full.
pub(crate) struct TokenBucket {
    limit: AtomicU64,
    burst: AtomicUsize,
    clock: DefaultClock,
    gate: Mutex<Arc<Gate>>,
}

impl fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBucket")
            .field("limit", &self.limit())
            .field("burst", &self.burst())
            .finish()
    }
}

impl TokenBucket {
    /// A full bucket.
    pub(crate) fn new(limit: Limit, burst: usize) -> Self {
        let clock = DefaultClock::default();
        let gate = Gate::build(limit, burst, &clock);
        Self {
            limit: AtomicU64::new(limit.to_bits()),
            burst: AtomicUsize::new(burst),
            clock,
            gate: Mutex::new(Arc::new(gate)),
        }
    }

    pub(crate) fn limit(&self) -> Limit {
        Limit::from_bits(self.limit.load(Ordering::Acquire))
    }

    pub(crate) fn burst(&self) -> usize {
        self.burst.load(Ordering::Acquire)
    }

    pub(crate) fn set_limit(&self, limit: Limit) {
        let mut gate = self.gate.lock();
        self.limit.store(limit.to_bits(), Ordering::Release);
        *gate = Arc::new(Gate::build(limit, self.burst(), &self.clock));
    }

    pub(crate) fn set_burst(&self, burst: usize) {
        let mut gate = self.gate.lock();
        self.burst.store(burst, Ordering::Release);
        *gate = Arc::new(Gate::build(self.limit(), burst, &self.clock));
    }

    /// Block until `n` tokens have been taken from the bucket.
    ///
    /// Tokens are only taken once they are available, so a wait that fails
    /// or is cancelled leaves the bucket as it found it.
    pub(crate) fn wait_n(&self, cancel: &CancelToken, n: usize) -> Result<(), WaitError> {
        if n == 0 || self.limit().is_inf() {
            return Ok(());
        }
        let burst = self.burst();
        if n > burst {
            return Err(WaitError::ExceedsBurst { requested: n, burst });
        }
        cancel.check(n)?;

        loop {
            // Re-fetched each round so a reconfiguration is picked up.
            let gate = Arc::clone(&self.gate.lock());
            let burst = self.burst();
            if n > burst {
                return Err(WaitError::ExceedsBurst { requested: n, burst });
            }
            let Some(wait) = gate.try_take(n, burst, &self.clock)? else {
                return Ok(());
            };
            if let Some(remaining) = cancel.remaining() {
                if wait > remaining {
                    return Err(WaitError::DeadlineExceeded { requested: n });
                }
            }
            cancel.sleep(wait)?;
        }
    }
}
