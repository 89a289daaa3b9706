use thiserror::Error;

/// Failure of a single balance or price lookup.
///
/// Neither variant aborts a run: the aggregator turns them into a report line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The chain id has no registered endpoint. Raised before any network call.
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),
    /// Transport failure, timeout, non-success status or malformed response.
    #[error("network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedChain,
    Network,
}

impl FetchError {
    pub fn network(msg: impl std::fmt::Display) -> Self {
        FetchError::Network(msg.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::UnsupportedChain(_) => ErrorKind::UnsupportedChain,
            FetchError::Network(_) => ErrorKind::Network,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Network("request timed out".to_string())
        } else {
            FetchError::network(err)
        }
    }
}

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FetchError::Network("request timed out".to_string())
    }
}
