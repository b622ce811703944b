//! The registry cache tier: an HTTP client for the three-phase
//! presigned-URL protocol (spec §4.4, §6).
//!
//! Lookups and downloads are synchronous (the install waits for them).
//! Uploads are fire-and-forget: [`RegistryCache::store`] spawns the upload
//! and returns immediately so a slow or failing upload never blocks the
//! primary install path (spec §4.4, "uploadAsync").

use crate::cache::{CacheTier, PackageId};
use crate::core::{GitCacheError, RegistryPhase};
use anyhow::{Context, Result};
use serde::Deserialize;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, warn};

/// The registry HTTP tier.
#[derive(Clone)]
pub struct RegistryCache {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    id: String,
    #[serde(rename = "s3Key")]
    s3_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MintDownloadResponse {
    #[serde(rename = "downloadUrl")]
    download_url: String,
}

#[derive(Debug, Deserialize)]
struct CreateUploadResponse {
    #[serde(rename = "artifactId")]
    artifact_id: String,
    /// Empty/absent means the artifact is already present on the registry;
    /// the caller skips the PUT and complete steps entirely (spec §6).
    #[serde(rename = "uploadUrl")]
    upload_url: Option<String>,
}

impl RegistryCache {
    /// Builds a registry client. `base_url`/`token` come from
    /// [`crate::config::AuthState`]; this is only constructed when both are
    /// present.
    #[must_use]
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn lookup(&self, id: &PackageId) -> Result<Option<LookupResponse>> {
        let url = format!("{}/artifacts/lookup/{}", self.base_url, id.url_encoded());
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|_| GitCacheError::RegistryDownloadFailed {
                package_id: id.as_key(),
                status: None,
                phase: RegistryPhase::Lookup,
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(GitCacheError::RegistryDownloadFailed {
                package_id: id.as_key(),
                status: Some(response.status().as_u16()),
                phase: RegistryPhase::Lookup,
            }
            .into());
        }

        let body: LookupResponse = response
            .json()
            .await
            .context("failed to parse registry lookup response")?;
        Ok(Some(body))
    }

    async fn mint_download_url(&self, id: &PackageId, artifact_id: &str) -> Result<String> {
        let encoded_artifact_id: String =
            url::form_urlencoded::byte_serialize(artifact_id.as_bytes()).collect();
        let url = format!("{}/artifacts/{}/download", self.base_url, encoded_artifact_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|_| GitCacheError::DownloadEndpointUnavailable {
                package_id: id.as_key(),
            })?;

        if !response.status().is_success() {
            return Err(GitCacheError::DownloadEndpointUnavailable {
                package_id: id.as_key(),
            }
            .into());
        }

        let body: MintDownloadResponse = response
            .json()
            .await
            .map_err(|_| GitCacheError::DownloadEndpointUnavailable {
                package_id: id.as_key(),
            })?;
        Ok(body.download_url)
    }

    async fn fetch(&self, id: &PackageId, download_url: &str) -> Result<Vec<u8>> {
        let retry_strategy = ExponentialBackoff::from_millis(200).map(jitter).take(3);
        let response = Retry::spawn(retry_strategy, || async {
            self.client.get(download_url).send().await
        })
        .await
        .map_err(|_| GitCacheError::RegistryDownloadFailed {
            package_id: id.as_key(),
            status: None,
            phase: RegistryPhase::Fetch,
        })?;

        if !response.status().is_success() {
            return Err(GitCacheError::RegistryDownloadFailed {
                package_id: id.as_key(),
                status: Some(response.status().as_u16()),
                phase: RegistryPhase::Fetch,
            }
            .into());
        }

        Ok(response.bytes().await.context("failed to read download body")?.to_vec())
    }

    async fn create_upload(&self, id: &PackageId, bytes: &[u8]) -> Result<CreateUploadResponse> {
        let url = format!("{}/artifacts", self.base_url);
        let hash = crate::utils::fs::sha256_hex(bytes);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({
                "fileName": "package.tgz",
                "contentType": "application/gzip",
                "size": bytes.len(),
                "hash": hash,
            }))
            .send()
            .await
            .map_err(|_| GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: None,
                phase: RegistryPhase::CreateUpload,
            })?;

        if !response.status().is_success() {
            return Err(GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: Some(response.status().as_u16()),
                phase: RegistryPhase::CreateUpload,
            }
            .into());
        }

        response
            .json()
            .await
            .context("failed to parse create-upload response")
    }

    async fn put(&self, id: &PackageId, upload_url: &str, bytes: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(upload_url)
            .header("Content-Type", "application/gzip")
            .body(bytes)
            .send()
            .await
            .map_err(|_| GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: None,
                phase: RegistryPhase::Put,
            })?;

        let status = response.status();
        if status.as_u16() == 413 || status.as_u16() == 429 {
            // Soft failure: the upload is abandoned silently, not surfaced
            // as an error (spec §4.4).
            debug!(package = %id, status = status.as_u16(), "upload abandoned (soft failure)");
            return Ok(());
        }
        if !status.is_success() {
            return Err(GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: Some(status.as_u16()),
                phase: RegistryPhase::Put,
            }
            .into());
        }

        Ok(())
    }

    async fn complete(&self, id: &PackageId, artifact_id: &str) -> Result<()> {
        let url = format!("{}/artifacts/{}/complete", self.base_url, artifact_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|_| GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: None,
                phase: RegistryPhase::Complete,
            })?;

        if !response.status().is_success() {
            return Err(GitCacheError::RegistryUploadFailed {
                package_id: id.as_key(),
                status: Some(response.status().as_u16()),
                phase: RegistryPhase::Complete,
            }
            .into());
        }
        Ok(())
    }

    async fn upload(&self, id: PackageId, bytes: Vec<u8>) -> Result<()> {
        let created = self.create_upload(&id, &bytes).await?;
        let Some(upload_url) = created.upload_url.filter(|u| !u.is_empty()) else {
            // Empty/absent uploadUrl means the artifact is already present
            // on the registry; nothing left to upload (spec §6).
            debug!(package = %id, "upload skipped, artifact already present");
            return Ok(());
        };
        self.put(&id, &upload_url, bytes).await?;
        self.complete(&id, &created.artifact_id).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheTier for RegistryCache {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn has(&self, id: &PackageId) -> bool {
        if self.token.is_empty() {
            return false;
        }
        matches!(self.lookup(id).await, Ok(Some(_)))
    }

    async fn get(&self, id: &PackageId) -> Result<Vec<u8>> {
        if self.token.is_empty() {
            return Err(GitCacheError::NotAuthenticated.into());
        }
        let Some(found) = self.lookup(id).await? else {
            return Err(GitCacheError::PackageNotFound {
                package_id: id.as_key(),
            }
            .into());
        };
        let download_url = self.mint_download_url(id, &found.id).await?;
        self.fetch(id, &download_url).await
    }

    /// Spawns the upload in the background and returns immediately; a
    /// failure is logged, never propagated (spec §4.4). Silently skipped
    /// when unauthenticated rather than failing the install.
    async fn store(&self, id: &PackageId, bytes: &[u8]) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }
        let registry = self.clone();
        let id = id.clone();
        let bytes = bytes.to_vec();
        tokio::spawn(async move {
            if let Err(err) = registry.upload(id.clone(), bytes).await {
                warn!(package = %id, error = %err, "background registry upload failed");
            }
        });
        Ok(())
    }

    fn authenticated(&self) -> Option<bool> {
        Some(!self.token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id() -> PackageId {
        PackageId::new("https://github.com/a/b.git", &"a".repeat(40))
    }

    #[tokio::test]
    async fn has_returns_true_on_200_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/artifacts/lookup/{}", id().url_encoded())))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "art-1", "s3Key": "k"})),
            )
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        assert!(registry.has(&id()).await);
    }

    #[tokio::test]
    async fn has_returns_false_on_404_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/artifacts/lookup/{}", id().url_encoded())))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        assert!(!registry.has(&id()).await);
    }

    #[tokio::test]
    async fn get_composes_lookup_mint_and_fetch() {
        let server = MockServer::start().await;
        let pkg = id();
        Mock::given(method("GET"))
            .and(path(format!("/artifacts/lookup/{}", pkg.url_encoded())))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "art-1", "s3Key": "k"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/artifacts/art-1/download"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"downloadUrl": format!("{}/blob", server.uri())})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/blob"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tarball-bytes".to_vec()))
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        let bytes = registry.get(&pkg).await.unwrap();
        assert_eq!(bytes, b"tarball-bytes");
    }

    #[tokio::test]
    async fn put_treats_429_as_soft_failure() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        let result = registry.put(&id(), &format!("{}/upload", server.uri()), vec![1, 2, 3]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn put_sends_gzip_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/upload"))
            .and(header("Content-Type", "application/gzip"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        let result = registry.put(&id(), &format!("{}/upload", server.uri()), vec![1, 2, 3]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn create_upload_sends_documented_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/artifacts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"artifactId": "art-1", "uploadUrl": ""})),
            )
            .mount(&server)
            .await;

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        let created = registry.create_upload(&id(), b"payload").await.unwrap();
        assert_eq!(created.artifact_id, "art-1");
        assert_eq!(created.upload_url, Some(String::new()));
    }

    #[tokio::test]
    async fn upload_skips_put_and_complete_when_upload_url_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/artifacts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"artifactId": "art-1", "uploadUrl": ""})),
            )
            .mount(&server)
            .await;
        // No PUT or /complete mock registered: if either were called, the
        // request would fail with a connection error since wiremock returns
        // 404 for unmatched routes by default, which `upload` would surface.

        let registry = RegistryCache::new(server.uri(), "token".to_string());
        let result = registry.upload(id(), b"payload".to_vec()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn get_fails_with_not_authenticated_when_token_empty() {
        let registry = RegistryCache::new("http://localhost".to_string(), String::new());
        let err = registry.get(&id()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitCacheError>(),
            Some(GitCacheError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn has_is_false_when_token_empty() {
        let registry = RegistryCache::new("http://localhost".to_string(), String::new());
        assert!(!registry.has(&id()).await);
    }

    #[tokio::test]
    async fn store_is_noop_when_token_empty() {
        let registry = RegistryCache::new("http://localhost".to_string(), String::new());
        assert!(registry.store(&id(), b"bytes").await.is_ok());
    }
}
