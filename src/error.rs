use thiserror::Error;

/// Failures the scan pipeline knows how to recover from.
///
/// Everything except `EmptyUniverse` is scoped to a single symbol and only
/// causes that symbol to be left out of the snapshot.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Network failure or timeout talking to the upstream provider
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("upstream rejected request: {status} - {body}")]
    UpstreamRejected { status: u16, body: String },

    /// Upstream answered 2xx but the body was not what we expected
    #[error("malformed upstream payload: {0}")]
    MalformedPayload(String),

    /// Fewer bars than the indicators need
    #[error("insufficient history: need {required} bars, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// Symbol discovery returned nothing
    #[error("symbol discovery returned no tradable instruments")]
    EmptyUniverse,
}

impl ScanError {
    /// Short machine-friendly tag used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Transport(_) => "transport",
            ScanError::UpstreamRejected { .. } => "upstream_rejected",
            ScanError::MalformedPayload(_) => "malformed_payload",
            ScanError::InsufficientHistory { .. } => "insufficient_history",
            ScanError::EmptyUniverse => "empty_universe",
        }
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ScanError::MalformedPayload(e.to_string())
        } else {
            ScanError::Transport(e.to_string())
        }
    }
}

pub type ScanResult<T> = std::result::Result<T, ScanError>;
