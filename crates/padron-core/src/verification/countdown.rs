use chrono::{DateTime, Utc};

/// Seconds left until the deadline, derived from wall clock on every tick.
/// Re-evaluating against `expires_at` instead of decrementing a counter
/// keeps the countdown immune to scheduling jitter.
pub fn remaining_seconds(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> u32 {
    let left = (expires_at - now).num_seconds();
    if left > 0 {
        left as u32
    } else {
        0
    }
}

/// mm:ss rendering for the operator console.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
