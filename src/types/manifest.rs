//! Control documents: the segment manifest and the export checkpoint

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SortableUniqueId;

/// Manifest version reported before any manifest exists
pub const INITIAL_MANIFEST_VERSION: &str = "0";

/// Metadata for one immutable archived segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdSegmentInfo {
    /// Object path of the segment
    pub path: String,
    /// Id of the first event (inclusive)
    pub from_sortable_unique_id: SortableUniqueId,
    /// Id of the last event (inclusive)
    pub to_sortable_unique_id: SortableUniqueId,
    pub event_count: u64,
    pub size_bytes: u64,
    /// Lowercase hex SHA-256 of the encoded segment
    pub sha256: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Index of everything archived for one service
///
/// `latest_safe_sortable_unique_id` always equals the `to` bound of the last
/// segment, or is `None` when there are no segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdManifest {
    pub service_id: String,
    /// Random token replaced on every successful update (observability only)
    pub manifest_version: String,
    pub latest_safe_sortable_unique_id: Option<SortableUniqueId>,
    #[serde(default)]
    pub segments: Vec<ColdSegmentInfo>,
    pub updated_at_utc: DateTime<Utc>,
}

impl ColdManifest {
    /// A manifest with no segments
    pub fn empty(service_id: impl Into<String>, updated_at_utc: DateTime<Utc>) -> Self {
        Self {
            service_id: service_id.into(),
            manifest_version: INITIAL_MANIFEST_VERSION.to_string(),
            latest_safe_sortable_unique_id: None,
            segments: Vec::new(),
            updated_at_utc,
        }
    }

    /// Build the next manifest by appending `new_segments`
    ///
    /// Segments whose path is already listed are not added again, so re-deriving
    /// a range after a lost checkpoint write leaves the logical content unchanged.
    /// The result is ordered by id range and its safe boundary is the last `to`.
    pub fn with_appended_segments(
        &self,
        new_segments: &[ColdSegmentInfo],
        manifest_version: impl Into<String>,
        updated_at_utc: DateTime<Utc>,
    ) -> Self {
        let mut known: HashSet<&str> = self.segments.iter().map(|s| s.path.as_str()).collect();
        let mut segments = self.segments.clone();
        for segment in new_segments {
            if known.insert(segment.path.as_str()) {
                segments.push(segment.clone());
            }
        }
        segments.sort_by(|a, b| {
            a.from_sortable_unique_id
                .cmp(&b.from_sortable_unique_id)
                .then_with(|| a.to_sortable_unique_id.cmp(&b.to_sortable_unique_id))
        });
        let latest_safe_sortable_unique_id =
            segments.last().map(|s| s.to_sortable_unique_id.clone());

        Self {
            service_id: self.service_id.clone(),
            manifest_version: manifest_version.into(),
            latest_safe_sortable_unique_id,
            segments,
            updated_at_utc,
        }
    }

    /// Id of the last archived event
    pub fn latest_exported_id(&self) -> Option<&SortableUniqueId> {
        self.segments.last().map(|s| &s.to_sortable_unique_id)
    }

    /// Id of the first archived event
    pub fn oldest_id(&self) -> Option<&SortableUniqueId> {
        self.segments.first().map(|s| &s.from_sortable_unique_id)
    }

    /// Sum of segment event counts
    pub fn total_event_count(&self) -> u64 {
        self.segments.iter().map(|s| s.event_count).sum()
    }

    /// Segments that may hold events strictly after `since`
    pub fn segments_after<'a>(
        &'a self,
        since: Option<&'a SortableUniqueId>,
    ) -> impl Iterator<Item = &'a ColdSegmentInfo> + 'a {
        self.segments
            .iter()
            .filter(move |s| since.map_or(true, |since| s.to_sortable_unique_id > *since))
    }
}

/// Resume cursor for the next export cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdCheckpoint {
    pub service_id: String,
    /// Exclusive lower bound for the next hot-store read
    pub next_since_sortable_unique_id: SortableUniqueId,
    pub updated_at_utc: DateTime<Utc>,
}

impl ColdCheckpoint {
    pub fn new(
        service_id: impl Into<String>,
        next_since_sortable_unique_id: SortableUniqueId,
        updated_at_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            next_since_sortable_unique_id,
            updated_at_utc,
        }
    }

    /// Advance to `candidate` unless the cursor is already past it
    pub fn advanced_to(
        previous: Option<&ColdCheckpoint>,
        service_id: &str,
        candidate: &SortableUniqueId,
        updated_at_utc: DateTime<Utc>,
    ) -> Self {
        let next = match previous {
            Some(prev) if prev.next_since_sortable_unique_id > *candidate => {
                prev.next_since_sortable_unique_id.clone()
            }
            _ => candidate.clone(),
        };
        Self::new(service_id, next, updated_at_utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).unwrap()
    }

    fn segment(from: u32, to: u32, count: u64) -> ColdSegmentInfo {
        let from_id = SortableUniqueId::generate(at(from), 0);
        let to_id = SortableUniqueId::generate(at(to), 0);
        ColdSegmentInfo {
            path: format!("segments/svc/{}_{}.jsonl", from_id, to_id),
            from_sortable_unique_id: from_id,
            to_sortable_unique_id: to_id,
            event_count: count,
            size_bytes: 10 * count,
            sha256: "ab".repeat(32),
            created_at_utc: at(59),
        }
    }

    #[test]
    fn test_manifest_serialization_is_camel_case() {
        let manifest = ColdManifest::empty("svc", at(0)).with_appended_segments(
            &[segment(1, 2, 2)],
            "v1",
            at(3),
        );

        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"serviceId\":\"svc\""));
        assert!(json.contains("\"latestSafeSortableUniqueId\""));
        assert!(json.contains("\"fromSortableUniqueId\""));
        assert!(json.contains("\"createdAtUtc\""));

        let parsed: ColdManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, manifest);
    }

    #[test]
    fn test_append_keeps_boundary_invariant() {
        let manifest = ColdManifest::empty("svc", at(0))
            .with_appended_segments(&[segment(1, 2, 2)], "v1", at(3))
            .with_appended_segments(&[segment(3, 4, 2)], "v2", at(5));

        assert_eq!(manifest.segments.len(), 2);
        assert_eq!(
            manifest.latest_safe_sortable_unique_id.as_ref(),
            manifest.latest_exported_id()
        );
        assert_eq!(manifest.total_event_count(), 4);
        assert_eq!(manifest.manifest_version, "v2");
    }

    #[test]
    fn test_append_skips_known_paths_and_orders_by_range() {
        let base = ColdManifest::empty("svc", at(0)).with_appended_segments(
            &[segment(5, 6, 1)],
            "v1",
            at(7),
        );

        let next = base.with_appended_segments(&[segment(1, 2, 1), segment(5, 6, 1)], "v2", at(8));

        assert_eq!(next.segments.len(), 2);
        assert_eq!(next.oldest_id(), Some(&segment(1, 2, 1).from_sortable_unique_id));
        assert_eq!(
            next.latest_safe_sortable_unique_id,
            Some(segment(5, 6, 1).to_sortable_unique_id)
        );
    }

    #[test]
    fn test_segments_after_skips_older_ranges() {
        let manifest = ColdManifest::empty("svc", at(0)).with_appended_segments(
            &[segment(1, 2, 2), segment(3, 4, 2)],
            "v1",
            at(5),
        );
        let since = SortableUniqueId::generate(at(2), 0);

        let remaining: Vec<_> = manifest.segments_after(Some(&since)).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(manifest.segments_after(None).count(), 2);
    }

    #[test]
    fn test_checkpoint_never_moves_backward() {
        let ahead = ColdCheckpoint::new("svc", SortableUniqueId::generate(at(9), 0), at(9));
        let behind = SortableUniqueId::generate(at(4), 0);

        let next = ColdCheckpoint::advanced_to(Some(&ahead), "svc", &behind, at(10));
        assert_eq!(next.next_since_sortable_unique_id, ahead.next_since_sortable_unique_id);

        let fresh = ColdCheckpoint::advanced_to(None, "svc", &behind, at(10));
        assert_eq!(fresh.next_since_sortable_unique_id, behind);
    }
}
