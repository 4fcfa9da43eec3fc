/// Upper bound on attempts for one external call (API request or clone).
pub const MAX_ATTEMPTS: u32 = 5;

/// Pure backoff policy for transient failures.
///
/// Attempt 1: immediate (0s)
/// Attempt 2: 1s
/// Attempt 3: 2s
/// Attempt 4: 4s
/// Attempt 5+: 8s, capped at 16s
pub fn retry_backoff_seconds(attempt_number: u32) -> u64 {
    match attempt_number {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        4 => 4,
        5 => 8,
        _ => 16,
    }
}

/// Seconds to wait for a rate-limit window that resets at `reset_unix`.
/// A reset time already in the past still waits one second so the retry
/// does not land in the same window.
pub fn rate_limit_wait_seconds(now_unix: i64, reset_unix: i64) -> u64 {
    if reset_unix > now_unix {
        (reset_unix - now_unix) as u64 + 1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_backoff_doubles_then_caps() {
        assert_eq!(retry_backoff_seconds(1), 0);
        assert_eq!(retry_backoff_seconds(2), 1);
        assert_eq!(retry_backoff_seconds(3), 2);
        assert_eq!(retry_backoff_seconds(4), 4);
        assert_eq!(retry_backoff_seconds(5), 8);
        assert_eq!(retry_backoff_seconds(50), 16);
    }

    #[test]
    fn rate_limit_wait_never_zero() {
        assert_eq!(rate_limit_wait_seconds(100, 160), 61);
        assert_eq!(rate_limit_wait_seconds(100, 100), 1);
        assert_eq!(rate_limit_wait_seconds(100, 10), 1);
    }
}
