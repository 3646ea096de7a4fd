//! Event types carried between the hot store and the cold tier
//!
//! `SerializableEvent` is the wire-ready form of an event: stable identity,
//! opaque payload bytes and the sortable id that orders it. Events are immutable
//! once produced by the hot store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SortableUniqueId;

/// Causation/correlation metadata attached to every event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    #[serde(default)]
    pub causation_id: String,
    #[serde(default)]
    pub correlation_id: String,
    #[serde(default)]
    pub executed_user: String,
}

impl EventMetadata {
    pub fn new(
        causation_id: impl Into<String>,
        correlation_id: impl Into<String>,
        executed_user: impl Into<String>,
    ) -> Self {
        Self {
            causation_id: causation_id.into(),
            correlation_id: correlation_id.into(),
            executed_user: executed_user.into(),
        }
    }
}

/// An immutable, wire-ready event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableEvent {
    /// Stable identity, used for de-duplication
    pub id: Uuid,

    /// Ordering key and embedded timestamp
    #[serde(rename = "sortableUniqueIdValue")]
    pub sortable_unique_id: SortableUniqueId,

    /// Name of the payload type
    pub event_payload_name: String,

    /// Opaque payload bytes (base64 on the wire)
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub event_metadata: EventMetadata,
}

impl SerializableEvent {
    /// Create an event with a fresh identity
    pub fn new(
        sortable_unique_id: SortableUniqueId,
        event_payload_name: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sortable_unique_id,
            event_payload_name: event_payload_name.into(),
            payload,
            tags: Vec::new(),
            event_metadata: EventMetadata::default(),
        }
    }

    /// Set the tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the metadata
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.event_metadata = metadata;
        self
    }

    /// Payload size counted against segment byte bounds
    pub fn payload_size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Timestamp embedded in the sortable id
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.sortable_unique_id.timestamp()
    }

    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

mod payload_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> SerializableEvent {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        SerializableEvent::new(SortableUniqueId::generate(at, 1), "OrderPlaced", vec![1, 2, 3])
            .with_tags(["order:42"])
            .with_metadata(EventMetadata::new("cause", "corr", "user"))
    }

    #[test]
    fn test_event_serialization() {
        let event = sample();

        let json = event.to_json_line().unwrap();
        assert!(json.contains("\"sortableUniqueIdValue\":"));
        assert!(json.contains("\"eventPayloadName\":\"OrderPlaced\""));
        assert!(json.contains("\"payload\":\"AQID\""));
        assert!(json.contains("\"executedUser\":\"user\""));
        assert!(!json.contains('\n'));

        let parsed = SerializableEvent::from_json_line(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_rejects_bad_payload_encoding() {
        let json = sample()
            .to_json_line()
            .unwrap()
            .replace("\"AQID\"", "\"***\"");
        assert!(SerializableEvent::from_json_line(&json).is_err());
    }

    #[test]
    fn test_timestamp_and_size() {
        let event = sample();
        assert_eq!(event.payload_size(), 3);
        assert_eq!(
            event.timestamp(),
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap())
        );
    }
}
