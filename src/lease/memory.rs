//! Process-local lease manager

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{ColdLease, LeaseManager};
use crate::error::{ColdError, ColdResult};
use crate::utils::time::saturating_add;
use crate::utils::{Clock, SystemClock};

/// Leases kept in a map, expiring against a `Clock`
pub struct InMemoryLeaseManager {
    leases: Mutex<HashMap<String, ColdLease>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryLeaseManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLeaseManager {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Whether `lease_id` is currently held by anyone
    pub fn is_held(&self, lease_id: &str) -> bool {
        let now = self.clock.now();
        self.leases
            .lock()
            .get(lease_id)
            .map_or(false, |l| l.expires_at > now)
    }

    fn try_acquire(&self, lease_id: &str, duration: Duration) -> Option<ColdLease> {
        let now = self.clock.now();
        let mut leases = self.leases.lock();
        if let Some(current) = leases.get(lease_id) {
            if current.expires_at > now {
                return None;
            }
        }
        let lease = ColdLease {
            lease_id: lease_id.to_string(),
            token: Uuid::new_v4().to_string(),
            expires_at: saturating_add(now, duration),
        };
        leases.insert(lease_id.to_string(), lease.clone());
        Some(lease)
    }

    fn try_renew(&self, lease: &ColdLease, duration: Duration) -> ColdResult<ColdLease> {
        let now = self.clock.now();
        let mut leases = self.leases.lock();
        match leases.get_mut(&lease.lease_id) {
            Some(current) if current.token == lease.token && current.expires_at > now => {
                current.expires_at = saturating_add(now, duration);
                Ok(current.clone())
            }
            _ => Err(ColdError::LeaseExpired {
                lease_id: lease.lease_id.clone(),
            }),
        }
    }

    fn do_release(&self, lease: &ColdLease) {
        let mut leases = self.leases.lock();
        if leases
            .get(&lease.lease_id)
            .map_or(false, |current| current.token == lease.token)
        {
            leases.remove(&lease.lease_id);
        }
    }
}

impl LeaseManager for InMemoryLeaseManager {
    fn acquire<'a>(
        &'a self,
        lease_id: &'a str,
        duration: Duration,
    ) -> BoxFuture<'a, ColdResult<Option<ColdLease>>> {
        Box::pin(async move { Ok(self.try_acquire(lease_id, duration)) })
    }

    fn renew<'a>(
        &'a self,
        lease: &'a ColdLease,
        duration: Duration,
    ) -> BoxFuture<'a, ColdResult<ColdLease>> {
        Box::pin(async move { self.try_renew(lease, duration) })
    }

    fn release<'a>(&'a self, lease: &'a ColdLease) -> BoxFuture<'a, ColdResult<()>> {
        Box::pin(async move {
            self.do_release(lease);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;
    use chrono::{TimeZone, Utc};

    fn manager() -> (InMemoryLeaseManager, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        (InMemoryLeaseManager::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_second_acquire_is_unavailable() {
        let (leases, _) = manager();

        let first = leases.acquire("l", Duration::from_secs(60)).await.unwrap();
        assert!(first.is_some());
        assert!(leases.is_held("l"));

        let second = leases.acquire("l", Duration::from_secs(60)).await.unwrap();
        assert!(second.is_none());

        let other = leases.acquire("other", Duration::from_secs(60)).await.unwrap();
        assert!(other.is_some());
    }

    #[tokio::test]
    async fn test_release_frees_lease() {
        let (leases, _) = manager();

        let lease = leases
            .acquire("l", Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        leases.release(&lease).await.unwrap();

        assert!(!leases.is_held("l"));
        assert!(leases.acquire("l", Duration::from_secs(60)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken_and_not_renewed() {
        let (leases, clock) = manager();

        let stale = leases
            .acquire("l", Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();
        clock.advance(Duration::from_secs(11));

        let fresh = leases
            .acquire("l", Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stale.token, fresh.token);

        let err = leases.renew(&stale, Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, ColdError::LeaseExpired { .. }));

        // releasing the stale handle must not free the new holder's lease
        leases.release(&stale).await.unwrap();
        assert!(leases.is_held("l"));
    }

    #[tokio::test]
    async fn test_renew_extends_expiry() {
        let (leases, clock) = manager();

        let lease = leases
            .acquire("l", Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();
        clock.advance(Duration::from_secs(5));

        let renewed = leases.renew(&lease, Duration::from_secs(10)).await.unwrap();
        assert!(renewed.expires_at > lease.expires_at);
        assert_eq!(renewed.token, lease.token);
    }
}
