//! Process-local object storage

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::{ObjectStorage, StoredObject, VersionTag, WriteCondition};
use crate::error::{ColdError, ColdResult};

/// Object storage held in memory
///
/// Every successful put gets a fresh tag from a monotonic counter, so
/// rewriting identical bytes still invalidates older tags.
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    next_tag: AtomicU64,
}

impl InMemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    fn put_sync(
        &self,
        path: &str,
        data: Vec<u8>,
        condition: &WriteCondition,
    ) -> ColdResult<VersionTag> {
        let mut objects = self.objects.lock();
        let current = objects.get(path).map(|o| &o.version_tag);
        if !condition.admits(current) {
            return Err(ColdError::Conflict {
                path: path.to_string(),
            });
        }
        let tag = VersionTag::new(self.next_tag.fetch_add(1, Ordering::SeqCst).to_string());
        objects.insert(
            path.to_string(),
            StoredObject {
                data,
                version_tag: tag.clone(),
            },
        );
        Ok(tag)
    }
}

impl ObjectStorage for InMemoryObjectStorage {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<Option<StoredObject>>> {
        Box::pin(async move { Ok(self.objects.lock().get(path).cloned()) })
    }

    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Vec<u8>,
        condition: WriteCondition,
    ) -> BoxFuture<'a, ColdResult<VersionTag>> {
        Box::pin(async move { self.put_sync(path, data, &condition) })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, ColdResult<Vec<String>>> {
        Box::pin(async move {
            Ok(self
                .objects
                .lock()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<()>> {
        Box::pin(async move {
            self.objects.lock().remove(path);
            Ok(())
        })
    }
}
