//! Incremental export of safe hot-store events into cold segments
//!
//! One cycle, per service:
//!
//! ```text
//! Idle ─► LeaseAcquiring ─┬─► Skipped (lease held elsewhere, zero result)
//!                         └─► Running ─┬─► Committing ─► Idle
//!                                      └─► Failed ─────► Idle
//! ```
//!
//! Running reads everything after the checkpoint (or after the manifest boundary
//! when a lost checkpoint write left it behind), keeps events older than the
//! safe window, splits them into segments and uploads each one. Committing
//! appends the new segments to the manifest, then advances the checkpoint.
//! Both documents are written conditionally and retried on conflict. The
//! lease is released on every exit path.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ColdEventStoreConfig;
use crate::control;
use crate::error::{ColdError, ColdResult};
use crate::hot_store::HotEventStore;
use crate::lease::{export_lease_id, LeaseManager};
use crate::segment::{safe_events, split, EncodedSegment};
use crate::storage::paths::segment_path;
use crate::storage::{ObjectStorage, WriteCondition};
use crate::types::{
    ColdCheckpoint, ColdFeatureStatus, ColdManifest, ColdSegmentInfo, ColdStoreProgress,
    ExportResult, SerializableEvent, SortableUniqueId,
};
use crate::utils::time::saturating_sub;
use crate::utils::{Clock, SystemClock};

/// Attempts per control document before a commit gives up
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Export surface of the cold tier
pub trait ColdEventExporter: Send + Sync {
    fn status(&self) -> ColdFeatureStatus;

    /// Run one export cycle for `service_id`
    ///
    /// Fails with `ColdError::Disabled` when the tier is switched off. Losing
    /// the lease race is not an error: the result is `ExportResult::empty()`.
    fn export_incremental<'a>(
        &'a self,
        service_id: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, ColdResult<ExportResult>>;

    /// Current archival position of `service_id`
    fn get_progress<'a>(&'a self, service_id: &'a str)
        -> BoxFuture<'a, ColdResult<ColdStoreProgress>>;
}

/// Exporter over injected hot store, object storage and lease manager
pub struct ColdExporter {
    hot_store: Arc<dyn HotEventStore>,
    storage: Arc<dyn ObjectStorage>,
    leases: Arc<dyn LeaseManager>,
    config: ColdEventStoreConfig,
    clock: Arc<dyn Clock>,
}

impl ColdExporter {
    pub fn new(
        hot_store: Arc<dyn HotEventStore>,
        storage: Arc<dyn ObjectStorage>,
        leases: Arc<dyn LeaseManager>,
        config: ColdEventStoreConfig,
    ) -> Self {
        Self {
            hot_store,
            storage,
            leases,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for cutoffs and document timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ColdEventStoreConfig {
        &self.config
    }

    pub async fn export(
        &self,
        service_id: &str,
        cancel: &CancellationToken,
    ) -> ColdResult<ExportResult> {
        if !self.config.enabled {
            return Err(ColdError::Disabled);
        }

        let lease_id = export_lease_id(service_id);
        let Some(lease) = self
            .leases
            .acquire(&lease_id, self.config.pull_interval)
            .await?
        else {
            info!(service_id, lease_id = %lease_id, "skipping export: lease not acquired");
            return Ok(ExportResult::empty());
        };
        debug!(service_id, expires_at = %lease.expires_at, "export lease acquired");

        let result = self.run_cycle(service_id, cancel).await;

        if let Err(e) = self.leases.release(&lease).await {
            warn!(service_id, lease_id = %lease.lease_id, error = %e, "failed to release export lease");
        }

        if let Ok(exported) = &result {
            if !exported.is_empty() {
                info!(
                    service_id,
                    events = exported.exported_event_count,
                    segments = exported.new_segments.len(),
                    manifest_version = %exported.updated_manifest_version,
                    "export cycle committed"
                );
            }
        }
        result
    }

    pub async fn progress(&self, service_id: &str) -> ColdResult<ColdStoreProgress> {
        let manifest = control::load_manifest(&*self.storage, service_id).await?;
        let checkpoint = control::load_checkpoint(&*self.storage, service_id).await?;
        Ok(ColdStoreProgress::from_documents(
            service_id,
            manifest.as_ref(),
            checkpoint.as_ref(),
        ))
    }

    async fn run_cycle(
        &self,
        service_id: &str,
        cancel: &CancellationToken,
    ) -> ColdResult<ExportResult> {
        let checkpointed = control::load_checkpoint(&*self.storage, service_id)
            .await?
            .map(|c| c.next_since_sortable_unique_id);
        let archived = control::load_manifest(&*self.storage, service_id)
            .await?
            .and_then(|m| m.latest_safe_sortable_unique_id);

        // A manifest commit whose checkpoint write was lost leaves the checkpoint
        // behind the archive; resuming from it would register overlapping segments.
        let lagging = match (&checkpointed, &archived) {
            (Some(cursor), Some(boundary)) => cursor < boundary,
            (None, Some(_)) => true,
            _ => false,
        };
        let since = if lagging { archived } else { checkpointed };
        if lagging {
            warn!(
                service_id,
                latest_safe = since.as_ref().map(SortableUniqueId::as_str),
                "checkpoint behind manifest, resuming from manifest boundary"
            );
        }

        let events = self.hot_store.read_all_since(since.as_ref(), None).await?;
        let cutoff = saturating_sub(self.clock.now(), self.config.safe_window);
        let safe = safe_events(&events, cutoff);
        let Some(last_safe) = safe.last().map(|e| e.sortable_unique_id.clone()) else {
            debug!(service_id, pending = events.len(), %cutoff, "nothing safe to export");
            if let (true, Some(boundary)) = (lagging, since.as_ref()) {
                self.commit_checkpoint(service_id, boundary, cancel).await?;
            }
            return Ok(ExportResult::empty());
        };

        let chunks = split(
            &safe,
            self.config.segment_max_events,
            self.config.segment_max_bytes,
        );
        let new_segments = self.upload_segments(service_id, &chunks, cancel).await?;

        let manifest_version = self
            .commit_manifest(service_id, &new_segments, cancel)
            .await?;
        self.commit_checkpoint(service_id, &last_safe, cancel).await?;

        Ok(ExportResult {
            exported_event_count: safe.len(),
            new_segments,
            updated_manifest_version: manifest_version,
        })
    }

    async fn upload_segments(
        &self,
        service_id: &str,
        chunks: &[Vec<SerializableEvent>],
        cancel: &CancellationToken,
    ) -> ColdResult<Vec<ColdSegmentInfo>> {
        let mut infos = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if cancel.is_cancelled() {
                return Err(ColdError::Cancelled);
            }
            let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
                continue;
            };

            let encoded = EncodedSegment::from_events(chunk)?;
            let path = segment_path(
                service_id,
                &first.sortable_unique_id,
                &last.sortable_unique_id,
            );
            let size_bytes = encoded.bytes.len() as u64;
            self.storage
                .put(&path, encoded.bytes, WriteCondition::Overwrite)
                .await?;
            debug!(service_id, path = %path, events = chunk.len(), size_bytes, "segment uploaded");

            infos.push(ColdSegmentInfo {
                path,
                from_sortable_unique_id: first.sortable_unique_id.clone(),
                to_sortable_unique_id: last.sortable_unique_id.clone(),
                event_count: chunk.len() as u64,
                size_bytes,
                sha256: encoded.sha256,
                created_at_utc: self.clock.now(),
            });
        }
        Ok(infos)
    }

    /// Append `new_segments` to the manifest, returning the new version token
    async fn commit_manifest(
        &self,
        service_id: &str,
        new_segments: &[ColdSegmentInfo],
        cancel: &CancellationToken,
    ) -> ColdResult<String> {
        let storage = &*self.storage;
        let clock = &*self.clock;
        retry_on_conflict(service_id, "manifest", cancel, move || async move {
            let now = clock.now();
            let current = control::load_manifest_with_tag(storage, service_id).await?;
            let (base, condition) = match current {
                Some(tagged) => (tagged.document, WriteCondition::MustMatch(tagged.version_tag)),
                None => (ColdManifest::empty(service_id, now), WriteCondition::MustNotExist),
            };

            let version = Uuid::new_v4().to_string();
            let next = base.with_appended_segments(new_segments, version.clone(), now);
            control::save_manifest(storage, &next, condition).await?;
            Ok(version)
        })
        .await
    }

    async fn commit_checkpoint(
        &self,
        service_id: &str,
        last_safe: &SortableUniqueId,
        cancel: &CancellationToken,
    ) -> ColdResult<()> {
        let storage = &*self.storage;
        let clock = &*self.clock;
        retry_on_conflict(service_id, "checkpoint", cancel, move || async move {
            let current = control::load_checkpoint_with_tag(storage, service_id).await?;
            let next = ColdCheckpoint::advanced_to(
                current.as_ref().map(|t| &t.document),
                service_id,
                last_safe,
                clock.now(),
            );
            let condition = WriteCondition::from_read(current.map(|t| t.version_tag));
            control::save_checkpoint(storage, &next, condition).await?;
            Ok(())
        })
        .await
    }
}

/// Re-run a read-modify-write until it stops conflicting
///
/// Errors other than `ColdError::Conflict` are returned at once.
async fn retry_on_conflict<T, F, Fut>(
    service_id: &str,
    what: &'static str,
    cancel: &CancellationToken,
    mut attempt_once: F,
) -> ColdResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ColdResult<T>>,
{
    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        if cancel.is_cancelled() {
            return Err(ColdError::Cancelled);
        }
        match attempt_once().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_conflict() => {
                warn!(
                    service_id,
                    document = what,
                    attempt,
                    max_attempts = MAX_COMMIT_ATTEMPTS,
                    "control document update conflict"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Err(ColdError::CommitRetriesExhausted {
        what,
        attempts: MAX_COMMIT_ATTEMPTS,
    })
}

impl ColdEventExporter for ColdExporter {
    fn status(&self) -> ColdFeatureStatus {
        ColdFeatureStatus::supported(self.config.enabled)
    }

    fn export_incremental<'a>(
        &'a self,
        service_id: &'a str,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, ColdResult<ExportResult>> {
        Box::pin(self.export(service_id, cancel))
    }

    fn get_progress<'a>(
        &'a self,
        service_id: &'a str,
    ) -> BoxFuture<'a, ColdResult<ColdStoreProgress>> {
        Box::pin(self.progress(service_id))
    }
}
