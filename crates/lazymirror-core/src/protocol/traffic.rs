//! Traffic counter contracts.
//!
//! The counter is persisted as the bare decimal ASCII of the total, and exposed
//! over HTTP as `{"totalBytesSent": <u64>}`.

use serde::{Deserialize, Serialize};

/// Payload of the stats endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficSnapshot {
    pub total_bytes_sent: u64,
}

/// Parse persisted counter contents: the leading run of digits after any
/// whitespace, so trailing junk (`"1024 bytes"`, a stray NUL) keeps the total.
/// No leading digits, or a value past `u64::MAX`, yields `None`.
pub fn parse_counter(contents: &str) -> Option<u64> {
    let s = contents.trim_start();
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse::<u64>().ok()
}

/// Render the counter for persistence.
pub fn encode_counter(total: u64) -> String {
    total.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_counter_cases() {
        assert_eq!(parse_counter("1024"), Some(1024));
        assert_eq!(parse_counter(" 42\n"), Some(42));
        assert_eq!(parse_counter(""), None);
        assert_eq!(parse_counter("NaN"), None);
        assert_eq!(parse_counter("-5"), None);
        assert_eq!(parse_counter("12abc"), Some(12));
        assert_eq!(parse_counter("1024 bytes"), Some(1024));
        assert_eq!(parse_counter("1024\n\0"), Some(1024));
        assert_eq!(parse_counter("+7"), None);
        assert_eq!(parse_counter("99999999999999999999"), None);
    }

    #[test]
    fn encode_is_plain_decimal() {
        assert_eq!(encode_counter(0), "0");
        assert_eq!(encode_counter(u64::MAX), "18446744073709551615");
    }

    #[test]
    fn snapshot_field_name() {
        let s = serde_json::to_string(&TrafficSnapshot { total_bytes_sent: 7 });
        assert_eq!(s.ok().as_deref(), Some(r#"{"totalBytesSent":7}"#));
    }
}
