//! The cold tier in deployments that do not have one
//!
//! Every operational call fails with `ColdError::NotSupported`; status
//! queries answer truthfully. Wiring this in at construction time keeps the
//! "is tiering available" question out of call sites.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::catalog::ColdEventCatalog;
use crate::error::{ColdError, ColdResult};
use crate::exporter::ColdEventExporter;
use crate::lease::{ColdLease, LeaseManager};
use crate::storage::{ObjectStorage, StoredObject, VersionTag, WriteCondition};
use crate::types::{ColdDataRangeSummary, ColdFeatureStatus, ColdStoreProgress, ExportResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedColdTier;

fn not_supported<'a, T: Send + 'a>() -> BoxFuture<'a, ColdResult<T>> {
    Box::pin(async { Err(ColdError::NotSupported) })
}

impl UnsupportedColdTier {
    pub fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::not_supported()
    }
}

impl ColdEventExporter for UnsupportedColdTier {
    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::not_supported()
    }

    fn export_incremental<'a>(
        &'a self,
        _service_id: &'a str,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, ColdResult<ExportResult>> {
        not_supported()
    }

    fn get_progress<'a>(
        &'a self,
        _service_id: &'a str,
    ) -> BoxFuture<'a, ColdResult<ColdStoreProgress>> {
        not_supported()
    }
}

impl ColdEventCatalog for UnsupportedColdTier {
    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::not_supported()
    }

    fn get_data_range_summary<'a>(
        &'a self,
        _service_id: &'a str,
    ) -> BoxFuture<'a, ColdResult<ColdDataRangeSummary>> {
        not_supported()
    }
}

impl ObjectStorage for UnsupportedColdTier {
    fn get<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, ColdResult<Option<StoredObject>>> {
        not_supported()
    }

    fn put<'a>(
        &'a self,
        _path: &'a str,
        _data: Vec<u8>,
        _condition: WriteCondition,
    ) -> BoxFuture<'a, ColdResult<VersionTag>> {
        not_supported()
    }

    fn list<'a>(&'a self, _prefix: &'a str) -> BoxFuture<'a, ColdResult<Vec<String>>> {
        not_supported()
    }

    fn delete<'a>(&'a self, _path: &'a str) -> BoxFuture<'a, ColdResult<()>> {
        not_supported()
    }
}

impl LeaseManager for UnsupportedColdTier {
    fn acquire<'a>(
        &'a self,
        _lease_id: &'a str,
        _duration: Duration,
    ) -> BoxFuture<'a, ColdResult<Option<ColdLease>>> {
        not_supported()
    }

    fn renew<'a>(
        &'a self,
        _lease: &'a ColdLease,
        _duration: Duration,
    ) -> BoxFuture<'a, ColdResult<ColdLease>> {
        not_supported()
    }

    fn release<'a>(&'a self, _lease: &'a ColdLease) -> BoxFuture<'a, ColdResult<()>> {
        not_supported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_operation_is_not_supported() {
        let tier = UnsupportedColdTier;
        let cancel = CancellationToken::new();

        assert!(matches!(
            tier.export_incremental("svc", &cancel).await,
            Err(ColdError::NotSupported)
        ));
        assert!(matches!(tier.get_progress("svc").await, Err(ColdError::NotSupported)));
        assert!(matches!(
            tier.get_data_range_summary("svc").await,
            Err(ColdError::NotSupported)
        ));
        assert!(matches!(tier.get("a").await, Err(ColdError::NotSupported)));
        assert!(matches!(
            tier.put("a", vec![], WriteCondition::Overwrite).await,
            Err(ColdError::NotSupported)
        ));
        assert!(matches!(tier.list("").await, Err(ColdError::NotSupported)));
        assert!(matches!(tier.delete("a").await, Err(ColdError::NotSupported)));
        assert!(matches!(
            tier.acquire("l", Duration::from_secs(1)).await,
            Err(ColdError::NotSupported)
        ));
    }

    #[test]
    fn test_status_is_truthful() {
        let status = ColdEventExporter::status(&UnsupportedColdTier);
        assert!(!status.is_supported);
        assert!(!status.is_enabled);
        assert!(!status.reason.is_empty());
        assert_eq!(status, ColdEventCatalog::status(&UnsupportedColdTier));
    }
}
