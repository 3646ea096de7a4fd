//! Time-bounded mutual exclusion between exporter replicas

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::error::ColdResult;

pub mod memory;

pub use memory::InMemoryLeaseManager;

/// Lease id guarding export cycles of one service
pub fn export_lease_id(service_id: &str) -> String {
    format!("cold-export-{service_id}")
}

/// A held lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColdLease {
    pub lease_id: String,
    /// Possession token; renew and release only act on a matching token
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Lease manager contract
///
/// Acquisition never waits: a lease held by someone else is `Ok(None)`.
pub trait LeaseManager: Send + Sync {
    fn acquire<'a>(
        &'a self,
        lease_id: &'a str,
        duration: Duration,
    ) -> BoxFuture<'a, ColdResult<Option<ColdLease>>>;

    /// Extend a lease still held by `lease`'s token; `ColdError::LeaseExpired` otherwise
    fn renew<'a>(
        &'a self,
        lease: &'a ColdLease,
        duration: Duration,
    ) -> BoxFuture<'a, ColdResult<ColdLease>>;

    /// Give up a lease; releasing an expired or foreign lease is a no-op
    fn release<'a>(&'a self, lease: &'a ColdLease) -> BoxFuture<'a, ColdResult<()>>;
}
