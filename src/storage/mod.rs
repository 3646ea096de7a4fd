//! Object storage contract and backends
//!
//! The cold tier needs four primitives from a blob store: read with a version
//! tag, conditional write, prefix listing and delete. Control documents rely
//! on the conditional write for optimistic concurrency; segments are written
//! unconditionally.

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::ColdResult;

pub mod fs;
pub mod memory;
pub mod paths;

pub use fs::FileObjectStorage;
pub use memory::InMemoryObjectStorage;

/// Opaque token identifying one stored revision of an object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Precondition attached to a `put`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Create or replace unconditionally
    Overwrite,
    /// Succeed only when nothing is stored at the path yet
    MustNotExist,
    /// Succeed only when the stored revision still carries this tag
    MustMatch(VersionTag),
}

impl WriteCondition {
    /// Condition for replacing the revision previously read (or creating it)
    pub fn from_read(tag: Option<VersionTag>) -> Self {
        match tag {
            Some(tag) => Self::MustMatch(tag),
            None => Self::MustNotExist,
        }
    }

    /// Whether a write may proceed given the tag currently stored
    pub fn admits(&self, current: Option<&VersionTag>) -> bool {
        match (self, current) {
            (Self::Overwrite, _) => true,
            (Self::MustNotExist, None) => true,
            (Self::MustNotExist, Some(_)) => false,
            (Self::MustMatch(expected), Some(current)) => expected == current,
            (Self::MustMatch(_), None) => false,
        }
    }
}

/// Bytes of an object and the tag of the revision they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub version_tag: VersionTag,
}

/// Blob store used for segments and control documents
///
/// Paths are `/`-separated and relative to the store root.
pub trait ObjectStorage: Send + Sync {
    /// Read an object; `Ok(None)` when nothing is stored at `path`
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<Option<StoredObject>>>;

    /// Write an object, returning the new revision's tag
    ///
    /// Fails with `ColdError::Conflict` when `condition` does not hold.
    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Vec<u8>,
        condition: WriteCondition,
    ) -> BoxFuture<'a, ColdResult<VersionTag>>;

    /// Paths that start with `prefix`, sorted
    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, ColdResult<Vec<String>>>;

    /// Remove an object; removing a missing object succeeds
    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<()>>;
}
