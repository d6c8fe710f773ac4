use chrono::Utc;

/// Wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse an epoch-millisecond value or an RFC 3339 timestamp.
pub fn parse_time_arg(input: &str) -> Result<i64, String> {
    let input = input.trim();
    if let Ok(ms) = input.parse::<i64>() {
        return Ok(ms);
    }
    chrono::DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("expected epoch milliseconds or RFC 3339 time: {e}"))
}
