//! Feature capability reporting

use serde::{Deserialize, Serialize};

/// Whether the cold tier exists in this deployment and whether it is switched on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdFeatureStatus {
    pub is_supported: bool,
    pub is_enabled: bool,
    pub reason: String,
}

impl ColdFeatureStatus {
    /// Status of a supported tier, enabled or administratively disabled
    pub fn supported(enabled: bool) -> Self {
        let reason = if enabled {
            "Cold event store is active"
        } else {
            "Cold event store is disabled"
        };
        Self {
            is_supported: true,
            is_enabled: enabled,
            reason: reason.to_string(),
        }
    }

    /// Status of a deployment without a cold tier
    pub fn not_supported() -> Self {
        Self {
            is_supported: false,
            is_enabled: false,
            reason: "Cold event store is not supported in this deployment".to_string(),
        }
    }
}
