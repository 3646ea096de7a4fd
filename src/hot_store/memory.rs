//! Process-local hot store

use std::collections::HashSet;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{window, HotEventStore};
use crate::error::ColdResult;
use crate::types::{SerializableEvent, SortableUniqueId};

/// Events kept sorted by sortable id in memory
#[derive(Debug, Default)]
pub struct InMemoryHotEventStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<SerializableEvent>,
    ids: HashSet<Uuid>,
}

impl InMemoryHotEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: impl IntoIterator<Item = SerializableEvent>) -> Self {
        let store = Self::new();
        store.insert(events);
        store
    }

    /// Synchronous append
    pub fn insert(&self, events: impl IntoIterator<Item = SerializableEvent>) {
        let mut inner = self.inner.write();
        let mut added = false;
        for event in events {
            if inner.ids.insert(event.id) {
                inner.events.push(event);
                added = true;
            }
        }
        if added {
            inner
                .events
                .sort_by(|a, b| a.sortable_unique_id.cmp(&b.sortable_unique_id));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HotEventStore for InMemoryHotEventStore {
    fn read_all_since<'a>(
        &'a self,
        since: Option<&'a SortableUniqueId>,
        max_count: Option<usize>,
    ) -> BoxFuture<'a, ColdResult<Vec<SerializableEvent>>> {
        Box::pin(async move { Ok(window(self.inner.read().events.iter(), since, max_count)) })
    }

    fn append<'a>(&'a self, events: Vec<SerializableEvent>) -> BoxFuture<'a, ColdResult<()>> {
        Box::pin(async move {
            self.insert(events);
            Ok(())
        })
    }
}
