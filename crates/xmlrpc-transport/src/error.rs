use std::time::Duration;

/// Errors that can occur while exchanging an XML-RPC request over HTTP.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint URL could not be parsed.
    #[error("invalid endpoint url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Building the HTTP client failed.
    #[error("failed to build http client: {0}")]
    Build(reqwest::Error),

    /// The request could not be sent or the response body could not be read.
    #[error("http exchange failed: {0}")]
    Http(reqwest::Error),

    /// The exchange did not finish within the configured timeout.
    #[error("http exchange timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered outside the 2xx range.
    #[error("bad status code - {status}")]
    Status { status: u16 },

    /// The response body exceeds the configured maximum size.
    #[error("response body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: u64, max: u64 },

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,

    /// A custom transport failed in its own way.
    #[error("exchange failed: {0}")]
    Exchange(String),
}

impl TransportError {
    /// Whether the exchange timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
