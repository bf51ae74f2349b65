use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("expected {expected} files and a non-empty query, got {files} files (query empty: {empty_query})")]
    InvalidSubmission {
        expected: usize,
        files: usize,
        empty_query: bool,
    },

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DispatchError {
    /// Invalid submissions are caught before anything is sent.
    pub fn is_invalid_submission(&self) -> bool {
        matches!(self, Self::InvalidSubmission { .. })
    }
}
