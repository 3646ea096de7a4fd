//! Cold Events
//!
//! Archival of an event-sourced hot store into immutable segments on object
//! storage, and reads that merge the archive with the live store.
//!
//! # Features
//!
//! - **Incremental export**: safe-window filtering, bounded JSONL segments
//!   with SHA-256 digests, lease-guarded cycles
//! - **Optimistic commits**: manifest and checkpoint written with
//!   compare-and-swap, retried on conflict
//! - **Hybrid reads**: cold segments plus hot tail, with full fallback to the
//!   hot store on any cold-side failure
//! - **Capability reporting**: every surface distinguishes "disabled" from
//!   "not supported"
//!
//! # Modules
//!
//! - `types`: Wire types (events, manifest, checkpoint, summaries)
//! - `segment`: Safe-window filter, splitter and JSONL codec
//! - `storage`: Object storage contract and in-memory/filesystem backends
//! - `control`: Manifest and checkpoint documents
//! - `lease`: Lease contract and in-memory lease manager
//! - `hot_store`: Hot event store contract and backends
//! - `exporter`, `catalog`, `hybrid`: The cold tier's public surfaces
//! - `tier`, `unsupported`: Construction-time selection of a working tier
//! - `driver`: Periodic export task
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cold_events::{
//!     ColdEventExporter, ColdEventStoreConfig, ColdTier, HotEventStore, InMemoryHotEventStore,
//!     InMemoryLeaseManager, InMemoryObjectStorage,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> cold_events::ColdResult<()> {
//! let hot = Arc::new(InMemoryHotEventStore::new());
//! let tier = ColdTier::active(
//!     hot.clone(),
//!     Arc::new(InMemoryObjectStorage::new()),
//!     Arc::new(InMemoryLeaseManager::new()),
//!     ColdEventStoreConfig::enabled(),
//! );
//!
//! let result = tier
//!     .exporter()
//!     .export_incremental("orders", &CancellationToken::new())
//!     .await?;
//! println!("archived {} events", result.exported_event_count);
//!
//! let events = tier.event_store(hot, "orders").read_all_since(None, None).await?;
//! # let _ = events;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod exporter;
pub mod hot_store;
pub mod hybrid;
pub mod lease;
pub mod logging;
pub mod segment;
pub mod storage;
pub mod tier;
pub mod types;
pub mod unsupported;
pub mod utils;

// Re-export commonly used items at crate root
pub use catalog::{ColdCatalogReader, ColdEventCatalog};
pub use config::ColdEventStoreConfig;
pub use driver::{DriverReport, ExportDriver};
pub use error::{ColdError, ColdResult};
pub use exporter::{ColdEventExporter, ColdExporter, MAX_COMMIT_ATTEMPTS};
pub use hot_store::{HotEventStore, InMemoryHotEventStore, JsonlHotEventStore};
pub use hybrid::HybridEventStore;
pub use lease::{ColdLease, InMemoryLeaseManager, LeaseManager};
pub use storage::{
    FileObjectStorage, InMemoryObjectStorage, ObjectStorage, StoredObject, VersionTag,
    WriteCondition,
};
pub use tier::ColdTier;
pub use types::{
    ColdCheckpoint, ColdDataRangeSummary, ColdFeatureStatus, ColdManifest, ColdSegmentInfo,
    ColdSegmentSummary, ColdStoreProgress, EventMetadata, ExportResult, SerializableEvent,
    SortableUniqueId,
};
pub use unsupported::UnsupportedColdTier;
pub use utils::{Clock, ManualClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
