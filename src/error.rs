//! Error types for cold-tier operations
//!
//! Expected outcomes are not errors here: a skipped export cycle is a zero-valued
//! `ExportResult`, a missing object is `Ok(None)` and a held lease is `Ok(None)`
//! from `LeaseManager::acquire`.

use std::fmt::Display;

/// A specialized error type for cold-tier operations.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ColdError {
    /// The cold tier is compiled in but administratively turned off.
    #[error("cold event store is disabled")]
    Disabled,
    /// The cold tier is not available in this deployment.
    #[error("cold event store is not supported in this deployment")]
    NotSupported,
    /// An object storage read or write failed.
    #[error("storage error at {path}: {message}")]
    Storage { path: String, message: String },
    /// The hot event store failed to serve a read or write.
    #[error("hot store error: {0}")]
    HotStore(String),
    /// A local I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A conditional write was rejected because the version tag was stale.
    #[error("version conflict writing {path}")]
    Conflict { path: String },
    /// A conditional write kept conflicting until the retry budget ran out.
    #[error("{what} update failed after {attempts} attempts")]
    CommitRetriesExhausted { what: &'static str, attempts: u32 },
    /// A manifest or checkpoint exists but could not be deserialized.
    #[error("corrupt control file {path}: {source}")]
    CorruptControlFile {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A segment could not be decoded.
    #[error("corrupt segment at line {line}: {message}")]
    CorruptSegment { line: usize, message: String },
    /// Serialization of an outgoing document failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A lease renewal was attempted on an expired or foreign lease.
    #[error("lease {lease_id} has expired")]
    LeaseExpired { lease_id: String },
    /// A configuration value was invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An object path escaped the storage root or was otherwise malformed.
    #[error("invalid object path: {0}")]
    InvalidPath(String),
    /// A sortable unique id did not have the expected shape.
    #[error("invalid sortable unique id: {0}")]
    InvalidSortableId(String),
    /// The operation observed its cancellation token.
    #[error("operation cancelled")]
    Cancelled,
}

impl ColdError {
    /// Create a storage error for `path` from a displayable value.
    pub fn storage<P, T>(path: P, msg: T) -> Self
    where
        P: Into<String>,
        T: Display,
    {
        Self::Storage {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Create a hot store error from a displayable value.
    pub fn hot_store<T: Display>(msg: T) -> Self {
        Self::HotStore(msg.to_string())
    }

    /// Create an invalid configuration error from a displayable value.
    pub fn invalid_config<T: Display>(msg: T) -> Self {
        Self::InvalidConfig(msg.to_string())
    }

    /// True when the error is a stale version tag on a conditional write.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// True for failures a later cycle may succeed on without intervention.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. }
                | Self::HotStore(_)
                | Self::Io(_)
                | Self::Conflict { .. }
                | Self::CommitRetriesExhausted { .. }
        )
    }
}

/// A Result type alias for cold-tier operations.
pub type ColdResult<T> = Result<T, ColdError>;
