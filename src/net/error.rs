//! Gateway error type.

/// Failure of one outbound request. Every variant reaches the caller
/// unchanged; the gateway never retries.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The server answered with a non-2xx status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// The server answered 2xx but its envelope carried a non-zero code.
    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection refused, reset, DNS failure and the like.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be built from the base URL and path.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// The response body was not the JSON the caller expected.
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl RequestError {
    /// HTTP status, when the server got far enough to send one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Status { .. } => "E_STATUS",
            Self::Api { .. } => "E_API",
            Self::Timeout => "E_TIMEOUT",
            Self::Network(_) => "E_NETWORK",
            Self::InvalidUrl(_) => "E_INVALID_URL",
            Self::InvalidHeader(_) => "E_INVALID_HEADER",
            Self::Decode(_) => "E_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    pub(crate) fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_builder() {
            Self::InvalidUrl(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
