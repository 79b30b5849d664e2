use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use lectern_model::{AssetId, AssetKind, AssetRef};

use crate::config::AssetStoreConfig;
use crate::error::{AuthoringError, Result};

use super::{AssetStore, UploadFile};

/// HTTP implementation of [`AssetStore`].
///
/// Uploads are multipart POSTs to `{base}/assets`; deletes are
/// `DELETE {base}/assets/{id}?kind=...`. A 404 on delete counts as
/// success: the object is already gone.
#[derive(Debug, Clone)]
pub struct HttpAssetStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    asset_id: String,
    url: String,
}

impl HttpAssetStore {
    pub fn new(config: &AssetStoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AuthoringError::Internal(format!("invalid asset store url: {e}"))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                AuthoringError::Internal(format!(
                    "failed to build asset store client: {e}"
                ))
            })?;
        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(|e| {
            AuthoringError::Internal(format!("invalid asset store path: {e}"))
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, file: UploadFile, folder: &str) -> Result<AssetRef> {
        let endpoint = self.endpoint("assets")?;

        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| {
                AuthoringError::InvalidInput(format!("bad content type: {e}"))
            })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("folder", folder.to_string());

        let response = self
            .authorized(self.client.post(endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                AuthoringError::ExternalService(format!("asset upload failed: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(AuthoringError::ExternalService(format!(
                "asset upload rejected with status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            AuthoringError::ExternalService(format!(
                "asset upload returned malformed body: {e}"
            ))
        })?;

        debug!(asset_id = %body.asset_id, folder, "uploaded asset");
        Ok(AssetRef {
            asset_id: AssetId::new(body.asset_id),
            url: body.url,
        })
    }

    async fn delete(&self, asset_id: &AssetId, kind: AssetKind) -> Result<()> {
        let mut endpoint =
            self.endpoint(&format!("assets/{}", asset_id.as_str()))?;
        endpoint
            .query_pairs_mut()
            .append_pair("kind", kind.as_str());

        let response = self
            .authorized(self.client.delete(endpoint))
            .send()
            .await
            .map_err(|e| {
                AuthoringError::ExternalService(format!("asset delete failed: {e}"))
            })?;

        // Idempotent delete: an id the store no longer knows is fine.
        if response.status() == reqwest::StatusCode::NOT_FOUND
            || response.status().is_success()
        {
            debug!(asset_id = %asset_id, %kind, "deleted asset");
            return Ok(());
        }

        Err(AuthoringError::ExternalService(format!(
            "asset delete rejected with status {}",
            response.status()
        )))
    }
}
