//! JSONL segment encoding
//!
//! One JSON object per line, UTF-8 without a byte-order mark, every line
//! terminated by `\n`. Decoding is all-or-nothing.

use sha2::{Digest, Sha256};

use crate::error::{ColdError, ColdResult};
use crate::types::{ColdSegmentInfo, SerializableEvent};

/// Encoded bytes of a segment together with their digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSegment {
    pub bytes: Vec<u8>,
    pub sha256: String,
}

impl EncodedSegment {
    pub fn from_events(events: &[SerializableEvent]) -> ColdResult<Self> {
        let bytes = encode(events)?;
        let sha256 = digest(&bytes);
        Ok(Self { bytes, sha256 })
    }
}

/// Encode events as newline-delimited JSON, in input order
pub fn encode(events: &[SerializableEvent]) -> ColdResult<Vec<u8>> {
    let mut out = Vec::new();
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.push(b'\n');
    }
    Ok(out)
}

/// Lowercase hex SHA-256 of `bytes`
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Decode a segment, ignoring blank lines
///
/// Any line that fails to parse fails the whole decode.
pub fn decode(bytes: &[u8]) -> ColdResult<Vec<SerializableEvent>> {
    let text = std::str::from_utf8(bytes).map_err(|e| ColdError::CorruptSegment {
        line: 0,
        message: format!("invalid UTF-8: {e}"),
    })?;

    let mut events = Vec::new();
    for (index, line) in text.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = SerializableEvent::from_json_line(line).map_err(|e| {
            ColdError::CorruptSegment {
                line: index + 1,
                message: e.to_string(),
            }
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Check fetched segment bytes against the manifest's size and digest
pub fn verify_segment(info: &ColdSegmentInfo, bytes: &[u8]) -> ColdResult<()> {
    if bytes.len() as u64 != info.size_bytes {
        return Err(ColdError::CorruptSegment {
            line: 0,
            message: format!(
                "{}: expected {} bytes, found {}",
                info.path,
                info.size_bytes,
                bytes.len()
            ),
        });
    }
    let actual = digest(bytes);
    if !actual.eq_ignore_ascii_case(&info.sha256) {
        return Err(ColdError::CorruptSegment {
            line: 0,
            message: format!("{}: digest mismatch", info.path),
        });
    }
    Ok(())
}
