//! Normalization of logged durations to seconds
//!
//! The signer logs durations in Go's formatting: `775.484656ms`, `1.5s`,
//! `1m30s` or `2m`. Every form is normalized to a seconds string with six
//! decimals.

use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Rendering of an absent or unparseable duration
pub const ZERO_SECONDS: &str = "0.000000";

fn millis_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)ms").expect("valid millis regex"))
}

fn seconds_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)s").expect("valid seconds regex"))
}

fn minutes_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)m").expect("valid minutes regex"))
}

fn capture_f64(re: &Regex, haystack: &str) -> Option<f64> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Duration in seconds, `None` when the input is empty or matches no form.
pub fn try_parse_duration(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(millis) = capture_f64(millis_re(), raw) {
        return Some(millis / 1000.0);
    }

    match minutes_re().captures(raw).and_then(|caps| caps.get(0).zip(caps.get(1))) {
        Some((whole, minutes)) => {
            let minutes: f64 = minutes.as_str().parse().ok()?;
            let seconds = capture_f64(seconds_re(), &raw[whole.end()..]).unwrap_or(0.0);
            Some(minutes * 60.0 + seconds)
        }
        None => capture_f64(seconds_re(), raw),
    }
}

/// Normalized seconds string. Absent input and unrecognized forms both
/// render as [`ZERO_SECONDS`]; the latter is logged.
pub fn parse_duration(raw: Option<&str>) -> String {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return ZERO_SECONDS.to_string(),
    };
    match try_parse_duration(raw) {
        Some(secs) => format_seconds(secs),
        None => {
            warn!(value = raw, "Unrecognized duration format");
            ZERO_SECONDS.to_string()
        }
    }
}

pub fn format_seconds(secs: f64) -> String {
    format!("{:.6}", secs)
}
