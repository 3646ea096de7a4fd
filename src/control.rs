//! Manifest and checkpoint documents on object storage
//!
//! A missing document is `Ok(None)`. A document that exists but does not
//! deserialize is `ColdError::CorruptControlFile`; the two are never
//! conflated.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ColdError, ColdResult};
use crate::storage::paths::{checkpoint_path, manifest_path};
use crate::storage::{ObjectStorage, VersionTag, WriteCondition};
use crate::types::{ColdCheckpoint, ColdManifest};

/// A control document together with the tag of the revision it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub document: T,
    pub version_tag: VersionTag,
}

async fn load<T: DeserializeOwned>(
    storage: &dyn ObjectStorage,
    path: &str,
) -> ColdResult<Option<Tagged<T>>> {
    let Some(object) = storage.get(path).await? else {
        return Ok(None);
    };
    let document =
        serde_json::from_slice(&object.data).map_err(|source| ColdError::CorruptControlFile {
            path: path.to_string(),
            source,
        })?;
    Ok(Some(Tagged {
        document,
        version_tag: object.version_tag,
    }))
}

async fn save<T: Serialize>(
    storage: &dyn ObjectStorage,
    path: &str,
    document: &T,
    condition: WriteCondition,
) -> ColdResult<VersionTag> {
    let bytes = serde_json::to_vec_pretty(document)?;
    storage.put(path, bytes, condition).await
}

pub async fn load_manifest_with_tag(
    storage: &dyn ObjectStorage,
    service_id: &str,
) -> ColdResult<Option<Tagged<ColdManifest>>> {
    load(storage, &manifest_path(service_id)).await
}

pub async fn load_manifest(
    storage: &dyn ObjectStorage,
    service_id: &str,
) -> ColdResult<Option<ColdManifest>> {
    Ok(load_manifest_with_tag(storage, service_id)
        .await?
        .map(|t| t.document))
}

/// Write the manifest under `condition`; a stale condition is `ColdError::Conflict`
pub async fn save_manifest(
    storage: &dyn ObjectStorage,
    manifest: &ColdManifest,
    condition: WriteCondition,
) -> ColdResult<VersionTag> {
    save(storage, &manifest_path(&manifest.service_id), manifest, condition).await
}

pub async fn load_checkpoint_with_tag(
    storage: &dyn ObjectStorage,
    service_id: &str,
) -> ColdResult<Option<Tagged<ColdCheckpoint>>> {
    load(storage, &checkpoint_path(service_id)).await
}

pub async fn load_checkpoint(
    storage: &dyn ObjectStorage,
    service_id: &str,
) -> ColdResult<Option<ColdCheckpoint>> {
    Ok(load_checkpoint_with_tag(storage, service_id)
        .await?
        .map(|t| t.document))
}

pub async fn save_checkpoint(
    storage: &dyn ObjectStorage,
    checkpoint: &ColdCheckpoint,
    condition: WriteCondition,
) -> ColdResult<VersionTag> {
    save(
        storage,
        &checkpoint_path(&checkpoint.service_id),
        checkpoint,
        condition,
    )
    .await
}
