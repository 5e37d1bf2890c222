// proxiscan-core/src/match_log.rs
//! PII-safe debug logging for matched values.
//!
//! Matched text is personal data by definition. It only reaches the debug log
//! verbatim when `PROXISCAN_ALLOW_DEBUG_PII=true` is set in the environment.

use lazy_static::lazy_static;
use log::debug;

lazy_static! {
    /// Initialised once: whether PII is allowed in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PROXISCAN_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let len = s.chars().count();
    if len <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", len)
    }
}

/// Returns `s` itself if PII debug logging is enabled, a placeholder otherwise.
pub fn loggable(s: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        s.to_string()
    } else {
        redact_sensitive(s)
    }
}

pub fn log_candidate_debug(field_name: &str, raw: &str, passed: Option<bool>) {
    match passed {
        Some(p) => debug!("Candidate for '{}': '{}' (checksum passed: {})", field_name, loggable(raw), p),
        None => debug!("Candidate for '{}': '{}'", field_name, loggable(raw)),
    }
}

pub fn log_span_debug(kind: &str, start: usize, end: usize, text: &str) {
    debug!("Highlight span {} [{}, {}): '{}'", kind, start, end, loggable(text));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_long_string() {
        assert_eq!(redact_sensitive("288946270"), "[REDACTED: 9 chars]".to_string());
    }
}
