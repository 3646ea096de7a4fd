//! Object layout for one service
//!
//! ```text
//! control/{serviceId}/manifest.json
//! control/{serviceId}/checkpoint.json
//! segments/{serviceId}/{fromId}_{toId}.jsonl
//! ```

use crate::types::SortableUniqueId;

pub fn manifest_path(service_id: &str) -> String {
    format!("control/{service_id}/manifest.json")
}

pub fn checkpoint_path(service_id: &str) -> String {
    format!("control/{service_id}/checkpoint.json")
}

pub fn segment_prefix(service_id: &str) -> String {
    format!("segments/{service_id}/")
}

/// Deterministic path of the segment covering `from..=to`
pub fn segment_path(service_id: &str, from: &SortableUniqueId, to: &SortableUniqueId) -> String {
    format!("{}{}_{}.jsonl", segment_prefix(service_id), from, to)
}
