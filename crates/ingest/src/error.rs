//! Errors from the ingestion and image-host collaborators.

/// Errors from an external collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The collaborator returned a non-2xx status code.
    #[error("Upstream API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body does not carry what we asked for.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// The source URL was rejected before any request was sent.
    #[error("{0}")]
    InvalidSource(String),
}

impl IngestError {
    /// Whether the error came from talking to the collaborator, as opposed
    /// to local input validation.
    pub fn is_upstream(&self) -> bool {
        !matches!(self, IngestError::InvalidSource(_))
    }
}
