//! Read-only views over the manifest for operators

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ColdCheckpoint, ColdManifest, SortableUniqueId, INITIAL_MANIFEST_VERSION};

/// Range summary for one segment; omits size, digest and creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdSegmentSummary {
    pub path: String,
    pub from_sortable_unique_id: SortableUniqueId,
    pub to_sortable_unique_id: SortableUniqueId,
    pub event_count: u64,
}

/// What range of events the cold tier currently holds for a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdDataRangeSummary {
    pub service_id: String,
    pub oldest_sortable_unique_id: Option<SortableUniqueId>,
    pub latest_sortable_unique_id: Option<SortableUniqueId>,
    pub total_event_count: u64,
    pub segment_count: usize,
    pub segments: Vec<ColdSegmentSummary>,
}

impl ColdDataRangeSummary {
    /// Summary for a service with nothing archived
    pub fn empty(service_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            oldest_sortable_unique_id: None,
            latest_sortable_unique_id: None,
            total_event_count: 0,
            segment_count: 0,
            segments: Vec::new(),
        }
    }

    /// Derive a summary from a manifest without touching any segment
    pub fn from_manifest(service_id: impl Into<String>, manifest: &ColdManifest) -> Self {
        let segments: Vec<ColdSegmentSummary> = manifest
            .segments
            .iter()
            .map(|s| ColdSegmentSummary {
                path: s.path.clone(),
                from_sortable_unique_id: s.from_sortable_unique_id.clone(),
                to_sortable_unique_id: s.to_sortable_unique_id.clone(),
                event_count: s.event_count,
            })
            .collect();

        Self {
            service_id: service_id.into(),
            oldest_sortable_unique_id: manifest.oldest_id().cloned(),
            latest_sortable_unique_id: manifest.latest_exported_id().cloned(),
            total_event_count: manifest.total_event_count(),
            segment_count: segments.len(),
            segments,
        }
    }
}

/// Export progress for a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdStoreProgress {
    pub service_id: String,
    pub latest_safe_sortable_unique_id: Option<SortableUniqueId>,
    pub latest_exported_sortable_unique_id: Option<SortableUniqueId>,
    pub next_since_sortable_unique_id: Option<SortableUniqueId>,
    pub last_exported_at_utc: Option<DateTime<Utc>>,
    pub manifest_version: String,
}

impl ColdStoreProgress {
    pub fn from_documents(
        service_id: impl Into<String>,
        manifest: Option<&ColdManifest>,
        checkpoint: Option<&ColdCheckpoint>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            latest_safe_sortable_unique_id: manifest
                .and_then(|m| m.latest_safe_sortable_unique_id.clone()),
            latest_exported_sortable_unique_id: manifest
                .and_then(|m| m.latest_exported_id().cloned()),
            next_since_sortable_unique_id: checkpoint
                .map(|c| c.next_since_sortable_unique_id.clone()),
            last_exported_at_utc: manifest.map(|m| m.updated_at_utc),
            manifest_version: manifest
                .map(|m| m.manifest_version.clone())
                .unwrap_or_else(|| INITIAL_MANIFEST_VERSION.to_string()),
        }
    }
}
