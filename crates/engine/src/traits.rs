use crate::seed::Candidate;
use crate::types::{ErrorCode, ProgressEvent};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Result type for capability operations.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

impl CapError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CapError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            CapError::Io(_) => ErrorCode::IoError,
            CapError::ConnectionRefused(_) | CapError::Network(_) => ErrorCode::NetworkError,
            CapError::Timeout(_) => ErrorCode::Timeout,
            CapError::Storage(_) => ErrorCode::StorageError,
            CapError::Other(_) => ErrorCode::InternalError,
        }
    }
}

// ---------------------------------------------------------------------------
// Filesystem operations
// ---------------------------------------------------------------------------

pub trait FilesystemOps: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> CapResult<String>;
}

// ---------------------------------------------------------------------------
// Health endpoint client
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
pub trait HealthClient: Send + Sync {
    /// Issue a GET against `url` and return the HTTP status code.
    ///
    /// A refused connection must surface as [`CapError::ConnectionRefused`]
    /// and an elapsed deadline as [`CapError::Timeout`]; the port scan
    /// classifies on those two variants.
    async fn get_status(&self, url: &str, timeout: Duration) -> CapResult<u16>;
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Receives step events while a doctor run is in flight.
pub trait ProgressSink: Send {
    fn emit(&mut self, event: ProgressEvent<'_>);
}

/// Sink that drops every event. Used for `--json` runs.
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn emit(&mut self, _event: ProgressEvent<'_>) {}
}

// ---------------------------------------------------------------------------
// Candidate storage
// ---------------------------------------------------------------------------

pub trait CandidateStore {
    /// Delete every stored candidate and insert `candidates` as one unit.
    /// Returns the number of rows removed.
    fn replace_all(&mut self, candidates: &[Candidate]) -> CapResult<usize>;
    fn count(&self) -> CapResult<usize>;
    fn count_by_election(&self) -> CapResult<BTreeMap<i64, usize>>;
}
