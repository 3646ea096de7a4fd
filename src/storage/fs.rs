//! Object storage on the local filesystem
//!
//! Objects are plain files under a root directory. Writes follow the
//! temp-file pattern so a reader sees either the old revision or the new
//! one, never a partial file:
//!
//! 1. Write to a sibling `.tmp` file
//! 2. `sync_all()` to flush to disk
//! 3. Rename over the final path (atomic on most filesystems)
//!
//! The version tag of an object is the SHA-256 of its content. Conditional
//! writes are serialized within the process; cross-process exclusion is the
//! lease's job.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{ObjectStorage, StoredObject, VersionTag, WriteCondition};
use crate::error::{ColdError, ColdResult};
use crate::segment::digest;

const TEMP_EXTENSION: &str = "tmp";

/// Object storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct FileObjectStorage {
    root: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileObjectStorage {
    /// Open (creating if needed) a store rooted at `root`
    ///
    /// Leftover temp files from interrupted writes are removed.
    pub fn open(root: impl Into<PathBuf>) -> ColdResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let cleaned = cleanup_temp_files(&root)?;
        if cleaned > 0 {
            debug!(root = %root.display(), cleaned, "removed leftover temp files");
        }
        Ok(Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> ColdResult<PathBuf> {
        resolve_under(&self.root, path)
    }
}

fn resolve_under(root: &Path, path: &str) -> ColdResult<PathBuf> {
    if path.is_empty() {
        return Err(ColdError::InvalidPath(path.to_string()));
    }
    let relative = Path::new(path);
    let safe = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(ColdError::InvalidPath(path.to_string()));
    }
    Ok(root.join(relative))
}

fn read_object(file: &Path) -> io::Result<Option<StoredObject>> {
    match fs::read(file) {
        Ok(data) => {
            let version_tag = VersionTag::new(digest(&data));
            Ok(Some(StoredObject { data, version_tag }))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Atomically replace `path` with `content`
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(
        "{}.{}.{}",
        file_name,
        Uuid::new_v4().simple(),
        TEMP_EXTENSION
    ));

    let mut file = File::create(&temp_path)?;
    file.write_all(content)?;
    file.sync_all()?;

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

/// Remove `.tmp` files left behind by interrupted writes, recursively
fn cleanup_temp_files(dir: &Path) -> io::Result<usize> {
    let mut cleaned = 0;
    if !dir.exists() {
        return Ok(0);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            cleaned += cleanup_temp_files(&path)?;
        } else if path.extension().map_or(false, |e| e == TEMP_EXTENSION) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }
    Ok(cleaned)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if path.extension().map_or(true, |e| e != TEMP_EXTENSION) {
            if let Ok(relative) = path.strip_prefix(root) {
                let key: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(key.join("/"));
            }
        }
    }
    Ok(())
}

async fn blocking<T, F>(path: &str, f: F) -> ColdResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ColdError::storage(path, e))?
        .map_err(|e| ColdError::storage(path, e))
}

impl ObjectStorage for FileObjectStorage {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<Option<StoredObject>>> {
        Box::pin(async move {
            let file = self.resolve(path)?;
            blocking(path, move || read_object(&file)).await
        })
    }

    fn put<'a>(
        &'a self,
        path: &'a str,
        data: Vec<u8>,
        condition: WriteCondition,
    ) -> BoxFuture<'a, ColdResult<VersionTag>> {
        Box::pin(async move {
            let file = self.resolve(path)?;
            let lock = Arc::clone(&self.write_lock);
            let outcome = blocking(path, move || {
                let _guard = lock.lock();
                let current = read_object(&file)?.map(|o| o.version_tag);
                if !condition.admits(current.as_ref()) {
                    return Ok(None);
                }
                atomic_write(&file, &data)?;
                Ok(Some(VersionTag::new(digest(&data))))
            })
            .await?;

            outcome.ok_or_else(|| ColdError::Conflict {
                path: path.to_string(),
            })
        })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, ColdResult<Vec<String>>> {
        Box::pin(async move {
            let root = self.root.clone();
            let mut paths = blocking(prefix, move || {
                let mut out = Vec::new();
                collect_files(&root, &root, &mut out)?;
                Ok(out)
            })
            .await?;
            paths.retain(|p| p.starts_with(prefix));
            paths.sort();
            Ok(paths)
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ColdResult<()>> {
        Box::pin(async move {
            let file = self.resolve(path)?;
            blocking(path, move || match fs::remove_file(&file) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            })
            .await
        })
    }
}
