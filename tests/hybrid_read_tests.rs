//! Hybrid Read Integration Tests
//!
//! Tests for reads that merge archived segments with the hot store:
//! - Merge, de-duplication and ordering across the boundary
//! - Segment skipping for cursors inside the archive
//! - Full fallback to the hot store on any cold-side failure

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use cold_events::control;
use cold_events::segment::EncodedSegment;
use cold_events::storage::paths::{manifest_path, segment_path};
use cold_events::{
    ColdEventStoreConfig, ColdExporter, ColdManifest, ColdResult, ColdSegmentInfo, HotEventStore,
    HybridEventStore, InMemoryHotEventStore, InMemoryLeaseManager, InMemoryObjectStorage,
    ManualClock, ObjectStorage, SerializableEvent, SortableUniqueId, StoredObject, VersionTag,
    WriteCondition,
};

const SERVICE_ID: &str = "orders";

fn at(sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, sec).unwrap()
}

fn event_at(sec: u32) -> SerializableEvent {
    SerializableEvent::new(
        SortableUniqueId::generate(at(sec), 0),
        "OrderPlaced",
        vec![sec as u8],
    )
}

/// Object storage that counts segment fetches
#[derive(Default)]
struct CountingStorage {
    inner: InMemoryObjectStorage,
    segment_gets: AtomicUsize,
}

impl ObjectStorage for CountingStorage {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<Option<StoredObject>>> {
        if path.starts_with("segments/") {
            self.segment_gets.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.get(path)
    }

    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Vec<u8>,
        condition: WriteCondition,
    ) -> BoxFuture<'a, ColdResult<VersionTag>> {
        self.inner.put(path, data, condition)
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, ColdResult<Vec<String>>> {
        self.inner.list(prefix)
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<()>> {
        self.inner.delete(path)
    }
}

/// Write segments holding `chunks` and a manifest listing them
async fn archive(storage: &dyn ObjectStorage, chunks: &[Vec<SerializableEvent>]) -> ColdManifest {
    let mut infos = Vec::new();
    for chunk in chunks {
        let first = &chunk[0].sortable_unique_id;
        let last = &chunk[chunk.len() - 1].sortable_unique_id;
        let encoded = EncodedSegment::from_events(chunk).unwrap();
        let path = segment_path(SERVICE_ID, first, last);
        infos.push(ColdSegmentInfo {
            path: path.clone(),
            from_sortable_unique_id: first.clone(),
            to_sortable_unique_id: last.clone(),
            event_count: chunk.len() as u64,
            size_bytes: encoded.bytes.len() as u64,
            sha256: encoded.sha256,
            created_at_utc: at(59),
        });
        storage
            .put(&path, encoded.bytes, WriteCondition::Overwrite)
            .await
            .unwrap();
    }
    let manifest = ColdManifest::empty(SERVICE_ID, at(59)).with_appended_segments(&infos, "v1", at(59));
    control::save_manifest(storage, &manifest, WriteCondition::Overwrite)
        .await
        .unwrap();
    manifest
}

fn hybrid(
    hot: Arc<InMemoryHotEventStore>,
    storage: Arc<dyn ObjectStorage>,
    enabled: bool,
) -> HybridEventStore {
    HybridEventStore::new(
        hot,
        storage,
        SERVICE_ID,
        ColdEventStoreConfig::default().with_enabled(enabled),
    )
}

#[tokio::test]
async fn test_merge_across_boundary() {
    let (e1, e2, e3, e4) = (event_at(1), event_at(2), event_at(3), event_at(4));
    let storage = Arc::new(InMemoryObjectStorage::new());
    archive(&*storage, &[vec![e1.clone(), e2.clone()]]).await;
    // e1 has been trimmed from the hot store; e2 is still in both tiers
    let hot = Arc::new(InMemoryHotEventStore::with_events([
        e2.clone(),
        e3.clone(),
        e4.clone(),
    ]));

    let events = hybrid(hot, storage, true).read_all(None, None).await.unwrap();

    assert_eq!(events, vec![e1, e2, e3, e4]);
}

#[tokio::test]
async fn test_since_and_max_count() {
    let events: Vec<_> = (1..=6).map(event_at).collect();
    let storage = Arc::new(InMemoryObjectStorage::new());
    archive(&*storage, &[events[0..2].to_vec(), events[2..4].to_vec()]).await;
    let hot = Arc::new(InMemoryHotEventStore::with_events(events[3..].to_vec()));
    let store = hybrid(hot, storage, true);

    let tail = store
        .read_all(Some(&events[0].sortable_unique_id), None)
        .await
        .unwrap();
    assert_eq!(tail, events[1..].to_vec());

    let page = store
        .read_all(Some(&events[0].sortable_unique_id), Some(3))
        .await
        .unwrap();
    assert_eq!(page, events[1..4].to_vec());
}

#[tokio::test]
async fn test_segments_before_cursor_are_not_fetched() {
    let events: Vec<_> = (1..=6).map(event_at).collect();
    let storage = Arc::new(CountingStorage::default());
    archive(&*storage, &[events[0..2].to_vec(), events[2..4].to_vec()]).await;
    let hot = Arc::new(InMemoryHotEventStore::with_events(events.clone()));
    let store = hybrid(hot, storage.clone(), true);

    let read = store
        .read_all(Some(&events[1].sortable_unique_id), None)
        .await
        .unwrap();
    assert_eq!(read, events[2..].to_vec());
    assert_eq!(storage.segment_gets.load(Ordering::SeqCst), 1);

    // at the boundary the archive has nothing newer to offer
    let read = store
        .read_all(Some(&events[3].sortable_unique_id), None)
        .await
        .unwrap();
    assert_eq!(read, events[4..].to_vec());
    assert_eq!(storage.segment_gets.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_corrupt_segment_falls_back_to_hot_store() {
    let events: Vec<_> = (1..=4).map(event_at).collect();
    let storage = Arc::new(InMemoryObjectStorage::new());
    let manifest = archive(&*storage, &[events[0..2].to_vec()]).await;
    storage
        .put(
            &manifest.segments[0].path,
            b"{\"truncated\":".to_vec(),
            WriteCondition::Overwrite,
        )
        .await
        .unwrap();
    // the hot store still has the full history
    let hot = Arc::new(InMemoryHotEventStore::with_events(events.clone()));

    let read = hybrid(hot, storage, true).read_all(None, None).await.unwrap();

    assert_eq!(read, events);
}

#[tokio::test]
async fn test_missing_segment_falls_back_to_hot_store() {
    let events: Vec<_> = (1..=4).map(event_at).collect();
    let storage = Arc::new(InMemoryObjectStorage::new());
    let manifest = archive(&*storage, &[events[0..1].to_vec(), events[1..2].to_vec()]).await;
    storage.delete(&manifest.segments[1].path).await.unwrap();
    let hot = Arc::new(InMemoryHotEventStore::with_events(events[1..].to_vec()));

    let read = hybrid(hot, storage, true).read_all(None, Some(10)).await.unwrap();

    // no partial cold result is mixed in: e1 only existed in the archive
    assert_eq!(read, events[1..].to_vec());
}

#[tokio::test]
async fn test_unusable_manifest_reads_hot_store() {
    let events: Vec<_> = (1..=3).map(event_at).collect();
    let hot = Arc::new(InMemoryHotEventStore::with_events(events.clone()));

    let empty = Arc::new(InMemoryObjectStorage::new());
    let read = hybrid(hot.clone(), empty, true).read_all(None, None).await.unwrap();
    assert_eq!(read, events);

    let corrupt = Arc::new(InMemoryObjectStorage::new());
    corrupt
        .put(&manifest_path(SERVICE_ID), b"][".to_vec(), WriteCondition::Overwrite)
        .await
        .unwrap();
    let read = hybrid(hot.clone(), corrupt, true).read_all(None, None).await.unwrap();
    assert_eq!(read, events);

    let no_boundary = Arc::new(InMemoryObjectStorage::new());
    control::save_manifest(
        &*no_boundary,
        &ColdManifest::empty(SERVICE_ID, at(0)),
        WriteCondition::Overwrite,
    )
    .await
    .unwrap();
    let read = hybrid(hot, no_boundary, true).read_all(None, None).await.unwrap();
    assert_eq!(read, events);
}

#[tokio::test]
async fn test_disabled_tier_ignores_archive() {
    let events: Vec<_> = (1..=3).map(event_at).collect();
    let storage = Arc::new(CountingStorage::default());
    archive(&*storage, &[events[0..1].to_vec()]).await;
    let hot = Arc::new(InMemoryHotEventStore::with_events(events[1..].to_vec()));
    let store = hybrid(hot, storage.clone(), false);

    let read = store.read_all(None, None).await.unwrap();

    assert_eq!(read, events[1..].to_vec());
    assert_eq!(storage.segment_gets.load(Ordering::SeqCst), 0);
    assert!(!store.status().is_enabled);
}

#[tokio::test]
async fn test_appends_go_to_hot_store() {
    let hot = Arc::new(InMemoryHotEventStore::new());
    let store = hybrid(hot.clone(), Arc::new(InMemoryObjectStorage::new()), true);

    store.append(vec![event_at(1), event_at(2)]).await.unwrap();

    assert_eq!(hot.len(), 2);
}

#[tokio::test]
async fn test_reads_after_export_and_hot_trim() {
    let clock = ManualClock::new(at(30));
    let events: Vec<_> = (1..=8).map(event_at).collect();
    let storage = Arc::new(InMemoryObjectStorage::new());
    let config = ColdEventStoreConfig::enabled()
        .with_safe_window(Duration::from_secs(25))
        .with_segment_bounds(2, u64::MAX);

    let full_hot = Arc::new(InMemoryHotEventStore::with_events(events.clone()));
    let exporter = ColdExporter::new(
        full_hot,
        storage.clone(),
        Arc::new(InMemoryLeaseManager::new()),
        config.clone(),
    )
    .with_clock(Arc::new(clock));
    let exported = exporter.export("orders", &CancellationToken::new()).await.unwrap();
    // cutoff = 5s
    assert_eq!(exported.exported_event_count, 5);

    // the hot store later drops everything already archived
    let trimmed_hot = Arc::new(InMemoryHotEventStore::with_events(events[5..].to_vec()));
    let store = HybridEventStore::new(trimmed_hot, storage, SERVICE_ID, config);

    assert_eq!(store.read_all(None, None).await.unwrap(), events);
    assert_eq!(
        store
            .read_all(Some(&events[2].sortable_unique_id), Some(4))
            .await
            .unwrap(),
        events[3..7].to_vec()
    );
}
