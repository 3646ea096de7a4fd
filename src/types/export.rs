//! Export cycle results

use serde::{Deserialize, Serialize};

use super::{ColdSegmentInfo, INITIAL_MANIFEST_VERSION};

/// Outcome of one export cycle
///
/// A skipped or empty cycle is the zero value: no events, no segments and
/// manifest version `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub exported_event_count: usize,
    pub new_segments: Vec<ColdSegmentInfo>,
    pub updated_manifest_version: String,
}

impl ExportResult {
    pub fn empty() -> Self {
        Self {
            exported_event_count: 0,
            new_segments: Vec::new(),
            updated_manifest_version: INITIAL_MANIFEST_VERSION.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exported_event_count == 0 && self.new_segments.is_empty()
    }
}

impl Default for ExportResult {
    fn default() -> Self {
        Self::empty()
    }
}
