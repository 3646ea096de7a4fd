//! Turning an ordered event stream into immutable segment files
//!
//! ```text
//! hot events ──► filter::safe_events ──► splitter::split ──► codec::encode ──► object storage
//!                (id time <= cutoff)     (count/byte bounds)  (JSONL + SHA-256)
//! ```

pub mod codec;
pub mod filter;
pub mod splitter;

pub use codec::{decode, digest, encode, verify_segment, EncodedSegment};
pub use filter::safe_events;
pub use splitter::split;
