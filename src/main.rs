//! Cold Exporter - Binary Entry Point
//!
//! Archives a JSONL hot event log into a directory-backed object store on a
//! fixed interval until Ctrl+C.
//!
//! Environment (in addition to the `COLD_EVENTS_*` tier options):
//! - COLD_EVENTS_SERVICE_ID: service whose events are archived (default `default`)
//! - COLD_EVENTS_STORAGE_DIR: object storage root (default `data/cold`)
//! - COLD_EVENTS_HOT_LOG: hot event log file (default `data/events.jsonl`)

use std::env;
use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use cold_events::logging;
use cold_events::{
    ColdEventStoreConfig, ColdTier, ExportDriver, FileObjectStorage,
    InMemoryLeaseManager, JsonlHotEventStore,
};

const DEFAULT_SERVICE_ID: &str = "default";
const DEFAULT_STORAGE_DIR: &str = "data/cold";
const DEFAULT_HOT_LOG: &str = "data/events.jsonl";

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!(error = %e, "cold exporter failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = ColdEventStoreConfig::from_env()?;
    let service_id = env_or("COLD_EVENTS_SERVICE_ID", DEFAULT_SERVICE_ID);
    let storage_dir = env_or("COLD_EVENTS_STORAGE_DIR", DEFAULT_STORAGE_DIR);
    let hot_log = env_or("COLD_EVENTS_HOT_LOG", DEFAULT_HOT_LOG);

    info!(
        version = cold_events::VERSION,
        service_id = %service_id,
        storage_dir = %storage_dir,
        hot_log = %hot_log,
        enabled = config.enabled,
        "starting cold exporter"
    );

    let hot_store = Arc::new(JsonlHotEventStore::from_file(hot_log));
    let storage = Arc::new(FileObjectStorage::open(storage_dir)?);
    let leases = Arc::new(InMemoryLeaseManager::new());
    let pull_interval = config.pull_interval;
    let tier = ColdTier::active(hot_store, storage, leases, config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    ctrlc::set_handler(move || {
        info!("shutdown requested");
        on_signal.cancel();
    })?;

    let report = ExportDriver::new(tier.exporter(), service_id, pull_interval)
        .run(cancel)
        .await;

    info!(
        cycles = report.cycles,
        failures = report.failures,
        exported_events = report.exported_events,
        "cold exporter stopped"
    );
    Ok(())
}
