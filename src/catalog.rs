//! Read-only view of what has been archived

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::config::ColdEventStoreConfig;
use crate::control;
use crate::error::ColdResult;
use crate::storage::ObjectStorage;
use crate::types::{ColdDataRangeSummary, ColdFeatureStatus};

/// Catalog surface of the cold tier
pub trait ColdEventCatalog: Send + Sync {
    fn status(&self) -> ColdFeatureStatus;

    /// Archived range of `service_id`, derived from its manifest alone
    ///
    /// No manifest yet is an empty summary. A manifest that does not
    /// deserialize is an error.
    fn get_data_range_summary<'a>(
        &'a self,
        service_id: &'a str,
    ) -> BoxFuture<'a, ColdResult<ColdDataRangeSummary>>;
}

/// Catalog reading manifests from object storage
///
/// Summaries are served whether or not the tier is enabled, so operators can
/// inspect an archive after switching exports off.
pub struct ColdCatalogReader {
    storage: Arc<dyn ObjectStorage>,
    config: ColdEventStoreConfig,
}

impl ColdCatalogReader {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: ColdEventStoreConfig) -> Self {
        Self { storage, config }
    }

    pub async fn data_range_summary(&self, service_id: &str) -> ColdResult<ColdDataRangeSummary> {
        Ok(match control::load_manifest(&*self.storage, service_id).await? {
            Some(manifest) => ColdDataRangeSummary::from_manifest(service_id, &manifest),
            None => ColdDataRangeSummary::empty(service_id),
        })
    }
}

impl ColdEventCatalog for ColdCatalogReader {
    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::supported(self.config.enabled)
    }

    fn get_data_range_summary<'a>(
        &'a self,
        service_id: &'a str,
    ) -> BoxFuture<'a, ColdResult<ColdDataRangeSummary>> {
        Box::pin(self.data_range_summary(service_id))
    }
}
