use dco_core::rate_limit_wait_seconds;

/// Rate-limit related response headers, as raw strings.
#[derive(Clone, Debug, Default)]
pub struct RateLimitHeaders {
    pub remaining: Option<String>,
    pub reset: Option<String>,
    pub retry_after: Option<String>,
}

impl RateLimitHeaders {
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
        Self {
            remaining: get("x-ratelimit-remaining"),
            reset: get("x-ratelimit-reset"),
            retry_after: get("retry-after"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetryAction {
    Done,
    RateLimited { wait_secs: u64 },
    Transient,
    Fatal,
}

/// Decide what to do with a response.
///
/// 403/429 count as rate limiting only when the headers say so; a plain 403
/// is a permissions problem and is fatal.
pub fn retry_action(status: u16, headers: &RateLimitHeaders, now_unix: i64) -> RetryAction {
    if (200..300).contains(&status) {
        return RetryAction::Done;
    }
    if status == 403 || status == 429 {
        if let Some(secs) = headers.retry_after.as_deref().and_then(|v| v.trim().parse::<u64>().ok()) {
            return RetryAction::RateLimited { wait_secs: secs.max(1) };
        }
        let exhausted = headers.remaining.as_deref().map(str::trim) == Some("0");
        if exhausted || status == 429 {
            let reset = headers.reset.as_deref().and_then(|v| v.trim().parse::<i64>().ok());
            let wait_secs = match reset {
                Some(reset) => rate_limit_wait_seconds(now_unix, reset),
                None => 60,
            };
            return RetryAction::RateLimited { wait_secs };
        }
        return RetryAction::Fatal;
    }
    if (500..600).contains(&status) {
        return RetryAction::Transient;
    }
    RetryAction::Fatal
}

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(remaining: Option<&str>, reset: Option<&str>, retry_after: Option<&str>) -> RateLimitHeaders {
        RateLimitHeaders {
            remaining: remaining.map(str::to_string),
            reset: reset.map(str::to_string),
            retry_after: retry_after.map(str::to_string),
        }
    }

    #[test]
    fn success_is_done() {
        assert_eq!(retry_action(200, &RateLimitHeaders::default(), 0), RetryAction::Done);
    }

    #[test]
    fn exhausted_quota_waits_until_reset() {
        let h = headers(Some("0"), Some("1060"), None);
        assert_eq!(retry_action(403, &h, 1000), RetryAction::RateLimited { wait_secs: 61 });
    }

    #[test]
    fn retry_after_takes_precedence() {
        let h = headers(Some("0"), Some("5000"), Some("30"));
        assert_eq!(retry_action(429, &h, 1000), RetryAction::RateLimited { wait_secs: 30 });
    }

    #[test]
    fn plain_forbidden_is_fatal() {
        let h = headers(Some("4999"), Some("5000"), None);
        assert_eq!(retry_action(403, &h, 1000), RetryAction::Fatal);
    }

    #[test]
    fn server_errors_are_transient() {
        assert_eq!(retry_action(502, &RateLimitHeaders::default(), 0), RetryAction::Transient);
        assert_eq!(retry_action(503, &RateLimitHeaders::default(), 0), RetryAction::Transient);
    }

    #[test]
    fn client_errors_are_fatal() {
        assert_eq!(retry_action(404, &RateLimitHeaders::default(), 0), RetryAction::Fatal);
        assert_eq!(retry_action(401, &RateLimitHeaders::default(), 0), RetryAction::Fatal);
    }
}
