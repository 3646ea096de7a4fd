//! Construction-time choice between a working cold tier and none at all

use std::sync::Arc;

use crate::catalog::{ColdCatalogReader, ColdEventCatalog};
use crate::config::ColdEventStoreConfig;
use crate::exporter::{ColdEventExporter, ColdExporter};
use crate::hot_store::HotEventStore;
use crate::hybrid::HybridEventStore;
use crate::lease::LeaseManager;
use crate::storage::ObjectStorage;
use crate::types::ColdFeatureStatus;
use crate::unsupported::UnsupportedColdTier;
use crate::utils::Clock;

enum ReadPath {
    Hybrid {
        storage: Arc<dyn ObjectStorage>,
        config: ColdEventStoreConfig,
    },
    HotOnly,
}

/// The cold tier's public surfaces, wired for one deployment
pub struct ColdTier {
    exporter: Arc<dyn ColdEventExporter>,
    catalog: Arc<dyn ColdEventCatalog>,
    reads: ReadPath,
}

impl ColdTier {
    /// A tier backed by real storage; `config.enabled` still gates exports
    pub fn active(
        hot_store: Arc<dyn HotEventStore>,
        storage: Arc<dyn ObjectStorage>,
        leases: Arc<dyn LeaseManager>,
        config: ColdEventStoreConfig,
    ) -> Self {
        let exporter = ColdExporter::new(hot_store, storage.clone(), leases, config.clone());
        Self::from_exporter(exporter, storage, config)
    }

    /// Like `active`, with an explicit clock for cutoffs and timestamps
    pub fn active_with_clock(
        hot_store: Arc<dyn HotEventStore>,
        storage: Arc<dyn ObjectStorage>,
        leases: Arc<dyn LeaseManager>,
        config: ColdEventStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let exporter = ColdExporter::new(hot_store, storage.clone(), leases, config.clone())
            .with_clock(clock);
        Self::from_exporter(exporter, storage, config)
    }

    fn from_exporter(
        exporter: ColdExporter,
        storage: Arc<dyn ObjectStorage>,
        config: ColdEventStoreConfig,
    ) -> Self {
        Self {
            exporter: Arc::new(exporter),
            catalog: Arc::new(ColdCatalogReader::new(storage.clone(), config.clone())),
            reads: ReadPath::Hybrid { storage, config },
        }
    }

    /// A deployment without a cold tier
    pub fn unsupported() -> Self {
        Self {
            exporter: Arc::new(UnsupportedColdTier),
            catalog: Arc::new(UnsupportedColdTier),
            reads: ReadPath::HotOnly,
        }
    }

    pub fn status(&self) -> ColdFeatureStatus {
        self.exporter.status()
    }

    pub fn exporter(&self) -> Arc<dyn ColdEventExporter> {
        Arc::clone(&self.exporter)
    }

    pub fn catalog(&self) -> Arc<dyn ColdEventCatalog> {
        Arc::clone(&self.catalog)
    }

    /// The event store callers should read through for `service_id`
    ///
    /// Without a cold tier this is `hot_store` itself. Either way its
    /// `status()` reports the same tier status as the other surfaces.
    pub fn event_store(
        &self,
        hot_store: Arc<dyn HotEventStore>,
        service_id: &str,
    ) -> Arc<dyn HotEventStore> {
        match &self.reads {
            ReadPath::Hybrid { storage, config } => Arc::new(HybridEventStore::new(
                hot_store,
                storage.clone(),
                service_id,
                config.clone(),
            )),
            ReadPath::HotOnly => hot_store,
        }
    }
}
