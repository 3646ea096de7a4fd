//! Data types for the cold event tier
//!
//! Wire documents (manifest, checkpoint, events) use camelCase field names.

mod event;
mod export;
mod manifest;
mod sortable_id;
mod status;
mod summary;

pub use event::{EventMetadata, SerializableEvent};
pub use export::ExportResult;
pub use manifest::{ColdCheckpoint, ColdManifest, ColdSegmentInfo, INITIAL_MANIFEST_VERSION};
pub use sortable_id::{SortableUniqueId, SORTABLE_ID_LEN};
pub use status::ColdFeatureStatus;
pub use summary::{ColdDataRangeSummary, ColdSegmentSummary, ColdStoreProgress};
