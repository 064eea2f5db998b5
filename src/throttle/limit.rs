use std::fmt;
use std::time::Duration;

/// Maximum transfer speed in bytes per second.
///
/// `Limit::ZERO` allows nothing beyond what the bucket already holds;
/// `Limit::INF` disables throttling altogether, even with a zero burst.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Limit(f64);

impl Limit {
    pub const INF: Limit = Limit(f64::INFINITY);
    pub const ZERO: Limit = Limit(0.0);

    /// A limit of `bytes` per second.
    pub fn per_second(bytes: u64) -> Self {
        Limit(bytes as f64)
    }

    /// A limit of one byte per `interval`. A zero interval is unlimited.
    pub fn every(interval: Duration) -> Self {
        if interval.is_zero() {
            Limit::INF
        } else {
            Limit(1.0 / interval.as_secs_f64())
        }
    }

    /// Build from a raw rate. NaN and negative rates collapse to `ZERO`.
    pub fn from_f64(rate: f64) -> Self {
        if rate.is_nan() || rate <= 0.0 {
            Limit::ZERO
        } else {
            Limit(rate)
        }
    }

    pub fn is_inf(&self) -> bool {
        self.0.is_infinite()
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    pub(crate) fn to_bits(self) -> u64 {
        self.0.to_bits()
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        Limit(f64::from_bits(bits))
    }
}

impl From<u64> for Limit {
    fn from(bytes: u64) -> Self {
        Limit::per_second(bytes)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inf() {
            write!(f, "unlimited")
        } else {
            write!(f, "{} B/s", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_converts_interval_to_rate() {
        assert_eq!(Limit::every(Duration::from_millis(10)).as_f64(), 100.0);
        assert!(Limit::every(Duration::ZERO).is_inf());
    }

    #[test]
    fn from_f64_rejects_negative_and_nan() {
        assert_eq!(Limit::from_f64(-5.0), Limit::ZERO);
        assert_eq!(Limit::from_f64(f64::NAN), Limit::ZERO);
        assert_eq!(Limit::from_f64(2.5).as_f64(), 2.5);
    }

    #[test]
    fn display_marks_unlimited() {
        assert_eq!(Limit::INF.to_string(), "unlimited");
        assert_eq!(Limit::per_second(512).to_string(), "512 B/s");
    }
}
