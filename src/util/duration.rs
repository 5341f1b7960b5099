use std::sync::OnceLock;

use regex::Regex;

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?$").unwrap_or_else(|e| panic!("bad pattern: {e}"))
    })
}

/// Parse a duration like `1h30m`, `45m`, `2h`, or a bare minute count
/// like `90`. Returns minutes; None for anything unrecognized.
pub fn parse_duration(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(minutes) = s.parse::<i64>() {
        return Some(minutes);
    }
    let caps = duration_re().captures(s)?;
    if caps.get(1).is_none() && caps.get(2).is_none() {
        return None;
    }
    let hours: i64 = caps.get(1).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let minutes: i64 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    Some(hours * 60 + minutes)
}

/// Format minutes the way `parse_duration` reads them.
pub fn format_duration(minutes: i64) -> String {
    if minutes <= 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h{}m", h, m),
    }
}
