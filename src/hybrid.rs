//! Reads that span the cold archive and the hot store
//!
//! The hot store stays the source of truth. Cold segments are used for the
//! archived prefix when everything about them loads cleanly. Any cold-side
//! failure sends the whole request to the hot store instead, so a caller never
//! gets a result stitched from a partial archive.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::ColdEventStoreConfig;
use crate::control;
use crate::error::{ColdError, ColdResult};
use crate::hot_store::HotEventStore;
use crate::segment::decode;
use crate::storage::ObjectStorage;
use crate::types::{ColdFeatureStatus, ColdManifest, SerializableEvent, SortableUniqueId};

/// Event store that serves archived ranges from cold segments
pub struct HybridEventStore {
    hot_store: Arc<dyn HotEventStore>,
    storage: Arc<dyn ObjectStorage>,
    service_id: String,
    config: ColdEventStoreConfig,
}

impl HybridEventStore {
    pub fn new(
        hot_store: Arc<dyn HotEventStore>,
        storage: Arc<dyn ObjectStorage>,
        service_id: impl Into<String>,
        config: ColdEventStoreConfig,
    ) -> Self {
        Self {
            hot_store,
            storage,
            service_id: service_id.into(),
            config,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Events after `since` in id order, at most `max_count`
    pub async fn read_all(
        &self,
        since: Option<&SortableUniqueId>,
        max_count: Option<usize>,
    ) -> ColdResult<Vec<SerializableEvent>> {
        if !self.config.enabled {
            return self.hot_store.read_all_since(since, max_count).await;
        }

        let manifest = match control::load_manifest(&*self.storage, &self.service_id).await {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                debug!(service_id = %self.service_id, "no cold manifest, reading hot store");
                return self.hot_store.read_all_since(since, max_count).await;
            }
            Err(e) => {
                warn!(service_id = %self.service_id, error = %e, "cold manifest unreadable, reading hot store");
                return self.hot_store.read_all_since(since, max_count).await;
            }
        };
        let Some(boundary) = manifest.latest_safe_sortable_unique_id.clone() else {
            return self.hot_store.read_all_since(since, max_count).await;
        };

        debug!(
            service_id = %self.service_id,
            latest_safe = %boundary,
            segments = manifest.segments.len(),
            since = since.map(SortableUniqueId::as_str),
            "using cold manifest"
        );

        if since.map_or(false, |since| *since >= boundary) {
            return self.hot_store.read_all_since(since, max_count).await;
        }

        let cold = match self.read_cold(&manifest, since).await {
            Ok(events) => events,
            Err(e) => {
                warn!(service_id = %self.service_id, error = %e, "cold read failed, reading hot store");
                return self.hot_store.read_all_since(since, max_count).await;
            }
        };

        let hot = self.hot_store.read_all_since(Some(&boundary), None).await?;
        Ok(merge(cold, hot, max_count))
    }

    async fn read_cold(
        &self,
        manifest: &ColdManifest,
        since: Option<&SortableUniqueId>,
    ) -> ColdResult<Vec<SerializableEvent>> {
        let mut events = Vec::new();
        for segment in manifest.segments_after(since) {
            let object = self
                .storage
                .get(&segment.path)
                .await?
                .ok_or_else(|| ColdError::storage(&segment.path, "segment listed in manifest is missing"))?;
            let decoded = decode(&object.data).map_err(|e| ColdError::storage(&segment.path, e))?;
            events.extend(
                decoded
                    .into_iter()
                    .filter(|e| since.map_or(true, |since| e.sortable_unique_id > *since)),
            );
        }
        Ok(events)
    }
}

/// Concatenate, drop repeated identities, order by id, then truncate
fn merge(
    cold: Vec<SerializableEvent>,
    hot: Vec<SerializableEvent>,
    max_count: Option<usize>,
) -> Vec<SerializableEvent> {
    let mut seen = HashSet::new();
    let mut merged: Vec<_> = cold
        .into_iter()
        .chain(hot)
        .filter(|e| seen.insert(e.id))
        .collect();
    merged.sort_by(|a, b| a.sortable_unique_id.cmp(&b.sortable_unique_id));
    if let Some(max) = max_count {
        merged.truncate(max);
    }
    merged
}

impl HotEventStore for HybridEventStore {
    fn read_all_since<'a>(
        &'a self,
        since: Option<&'a SortableUniqueId>,
        max_count: Option<usize>,
    ) -> BoxFuture<'a, ColdResult<Vec<SerializableEvent>>> {
        Box::pin(self.read_all(since, max_count))
    }

    fn append<'a>(&'a self, events: Vec<SerializableEvent>) -> BoxFuture<'a, ColdResult<()>> {
        self.hot_store.append(events)
    }

    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::supported(self.config.enabled)
    }
}
