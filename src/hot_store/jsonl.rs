//! Append-only JSONL hot store
//!
//! Events live in a single `events.jsonl` file under the data directory.
//! Every append is fsynced before returning. Reads scan the whole file, so
//! this backend suits tools and modest logs rather than large deployments.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::warn;

use super::{window, HotEventStore};
use crate::error::{ColdError, ColdResult};
use crate::types::{SerializableEvent, SortableUniqueId};

const EVENTS_FILE: &str = "events.jsonl";

/// Hot store backed by one JSONL file
#[derive(Debug, Clone)]
pub struct JsonlHotEventStore {
    events_path: PathBuf,
    append_lock: Arc<Mutex<()>>,
}

impl JsonlHotEventStore {
    /// Store rooted at `data_dir` (`data_dir/events.jsonl`)
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::from_file(data_dir.as_ref().join(EVENTS_FILE))
    }

    /// Store backed by an explicit file
    pub fn from_file(events_path: impl Into<PathBuf>) -> Self {
        Self {
            events_path: events_path.into(),
            append_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Load every event in the log, sorted by sortable id
    ///
    /// Lines that fail to parse are skipped with a warning, so one torn
    /// trailing write does not make the whole log unreadable.
    pub fn load_events(&self) -> io::Result<Vec<SerializableEvent>> {
        load_events(&self.events_path)
    }
}

fn load_events(events_path: &Path) -> io::Result<Vec<SerializableEvent>> {
    let file = match File::open(events_path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let reader = BufReader::new(file);
    let mut events = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match SerializableEvent::from_json_line(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(
                    path = %events_path.display(),
                    line = line_num + 1,
                    error = %e,
                    "skipping unparsable event"
                );
            }
        }
    }

    events.sort_by(|a, b| a.sortable_unique_id.cmp(&b.sortable_unique_id));
    Ok(events)
}

fn append_events(events_path: &Path, events: &[SerializableEvent]) -> io::Result<()> {
    let known: HashSet<_> = load_events(events_path)?.into_iter().map(|e| e.id).collect();
    let fresh: Vec<_> = events.iter().filter(|e| !known.contains(&e.id)).collect();
    if fresh.is_empty() {
        return Ok(());
    }

    if let Some(parent) = events_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(events_path)?;

    let mut seen = HashSet::new();
    for event in fresh {
        if !seen.insert(event.id) {
            continue;
        }
        let json_line = event.to_json_line().map_err(io::Error::other)?;
        writeln!(file, "{}", json_line)?;
    }
    file.sync_all()
}

impl HotEventStore for JsonlHotEventStore {
    fn read_all_since<'a>(
        &'a self,
        since: Option<&'a SortableUniqueId>,
        max_count: Option<usize>,
    ) -> BoxFuture<'a, ColdResult<Vec<SerializableEvent>>> {
        Box::pin(async move {
            let path = self.events_path.clone();
            let events = tokio::task::spawn_blocking(move || load_events(&path))
                .await
                .map_err(ColdError::hot_store)?
                .map_err(ColdError::hot_store)?;
            Ok(window(events.iter(), since, max_count))
        })
    }

    fn append<'a>(&'a self, events: Vec<SerializableEvent>) -> BoxFuture<'a, ColdResult<()>> {
        Box::pin(async move {
            let path = self.events_path.clone();
            let lock = Arc::clone(&self.append_lock);
            tokio::task::spawn_blocking(move || {
                let _guard = lock.lock();
                append_events(&path, &events)
            })
            .await
            .map_err(ColdError::hot_store)?
            .map_err(ColdError::hot_store)
        })
    }
}
