//! Human-readable rate and size parsing.

use crate::error::TrickleError;
use crate::throttle::Limit;

/// Parse a human-readable bandwidth string into a [`Limit`].
///
/// Accepts formats like "10MB/s", "500KiB/s", "1GB/s", "100B/s".
/// The "/s" suffix is optional. Uses the `bytesize` crate for parsing,
/// which supports both SI (MB = 1,000,000) and IEC (MiB = 1,048,576) units.
/// "unlimited", "inf" and "none" disable throttling.
pub fn parse_bandwidth(s: &str) -> Result<Limit, TrickleError> {
    let s = s.trim();
    if matches!(
        s.to_lowercase().as_str(),
        "unlimited" | "inf" | "infinite" | "none"
    ) {
        return Ok(Limit::INF);
    }

    // Strip trailing "/s" (case insensitive)
    let size_str = if s.to_lowercase().ends_with("/s") {
        &s[..s.len() - 2]
    } else {
        s
    };

    let bytes: bytesize::ByteSize = size_str.parse().map_err(|_| {
        TrickleError::Config(format!(
            "Invalid bandwidth format: '{}'. Use formats like '10MB/s', '500KiB/s'",
            s
        ))
    })?;

    let bps = bytes.as_u64();
    if bps == 0 {
        return Err(TrickleError::Config(
            "Bandwidth limit must be greater than 0".to_string(),
        ));
    }

    Ok(Limit::per_second(bps))
}

/// Parse a byte size such as "32KiB" or "4096". Zero is allowed.
pub fn parse_size(s: &str) -> Result<usize, TrickleError> {
    let s = s.trim();
    let bytes: bytesize::ByteSize = s.parse().map_err(|_| {
        TrickleError::Config(format!(
            "Invalid size: '{}'. Use formats like '32KiB', '1MB', '4096'",
            s
        ))
    })?;
    usize::try_from(bytes.as_u64())
        .map_err(|_| TrickleError::Config(format!("Size too large: '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bandwidth_megabytes_per_sec() {
        // bytesize treats MB as 1,000,000 (SI) and MiB as 1,048,576 (IEC)
        let limit = parse_bandwidth("10MB/s").unwrap();
        assert_eq!(limit, Limit::per_second(10_000_000));
    }

    #[test]
    fn parse_bandwidth_iec_units() {
        let limit = parse_bandwidth("500KiB/s").unwrap();
        assert_eq!(limit, Limit::per_second(512_000));
    }

    #[test]
    fn parse_bandwidth_without_per_sec_suffix() {
        let limit = parse_bandwidth("10MB").unwrap();
        assert_eq!(limit, Limit::per_second(10_000_000));
    }

    #[test]
    fn parse_bandwidth_unlimited() {
        assert!(parse_bandwidth("unlimited").unwrap().is_inf());
        assert!(parse_bandwidth("INF").unwrap().is_inf());
    }

    #[test]
    fn parse_bandwidth_invalid_returns_error() {
        match parse_bandwidth("not_a_number") {
            Err(TrickleError::Config(msg)) => {
                assert!(msg.contains("Invalid bandwidth"));
            }
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn parse_bandwidth_zero_returns_error() {
        match parse_bandwidth("0B/s") {
            Err(TrickleError::Config(msg)) => {
                assert!(msg.contains("greater than 0"));
            }
            other => panic!("Expected Config error about zero, got: {:?}", other),
        }
    }

    #[test]
    fn parse_size_accepts_zero_and_units() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("32KiB").unwrap(), 32 * 1024);
        assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(matches!(parse_size("lots"), Err(TrickleError::Config(_))));
    }
}
