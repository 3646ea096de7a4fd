//! Hot event store contract
//!
//! The hot store is the complete source of truth for events. The cold tier
//! only ever reads from it, in ascending id order, starting strictly after a
//! cursor.

use futures::future::BoxFuture;

use crate::error::ColdResult;
use crate::types::{ColdFeatureStatus, SerializableEvent, SortableUniqueId};

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlHotEventStore;
pub use memory::InMemoryHotEventStore;

/// Read/append contract shared by the hot store and the hybrid reader
pub trait HotEventStore: Send + Sync {
    /// Events with id strictly greater than `since`, ascending by id,
    /// at most `max_count` of them
    fn read_all_since<'a>(
        &'a self,
        since: Option<&'a SortableUniqueId>,
        max_count: Option<usize>,
    ) -> BoxFuture<'a, ColdResult<Vec<SerializableEvent>>>;

    /// Append events; events whose identity is already stored are ignored
    fn append<'a>(&'a self, events: Vec<SerializableEvent>) -> BoxFuture<'a, ColdResult<()>>;

    /// Cold tier status as seen through this store
    ///
    /// A plain hot store has no cold tier behind it.
    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::not_supported()
    }
}

/// Apply the `since`/`max_count` window to events already sorted by id
pub(crate) fn window<'a, I>(
    sorted: I,
    since: Option<&SortableUniqueId>,
    max_count: Option<usize>,
) -> Vec<SerializableEvent>
where
    I: IntoIterator<Item = &'a SerializableEvent>,
{
    sorted
        .into_iter()
        .filter(|e| since.map_or(true, |since| e.sortable_unique_id > *since))
        .take(max_count.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}
