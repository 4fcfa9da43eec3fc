use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("rate limited by {url}; giving up after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },
    #[error("transient failure from {url} after {attempts} attempts: {detail}")]
    Transient { url: String, attempts: u32, detail: String },
    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GithubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GithubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
