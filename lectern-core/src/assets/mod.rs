//! Asset store gateway: uploads and deletes binary objects (images,
//! videos) in the external object store.

mod http;

pub use http::HttpAssetStore;

use async_trait::async_trait;
use tracing::warn;

use lectern_model::{AssetId, AssetKind, AssetRef};

use crate::error::Result;

/// An uploaded file handle as supplied by the request layer.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Port to the external object store.
///
/// `delete` is idempotent: deleting an id the store no longer holds
/// succeeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Uploads `file` under `folder`, returning the store-allocated
    /// identifier and public URL.
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<AssetRef>;

    /// Deletes the object behind `asset_id`.
    async fn delete(&self, asset_id: &AssetId, kind: AssetKind) -> Result<()>;
}

/// Deletes an asset, logging and swallowing failures.
///
/// Cleanup of superseded assets must not block the authoring edit; the
/// document store stays authoritative and a failed delete only leaves
/// an orphaned object behind.
pub async fn delete_best_effort(
    store: &dyn AssetStore,
    asset_id: &AssetId,
    kind: AssetKind,
) {
    if let Err(err) = store.delete(asset_id, kind).await {
        warn!(asset_id = %asset_id, %kind, error = %err, "asset cleanup failed, leaving orphan");
    }
}
