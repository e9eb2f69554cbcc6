//! Courier delivery-profile endpoints and cached service.

use crate::client::ApiClient;
use crate::error_handling::decode;
use crate::request::FilePart;
use crate::retry::{retry_read, RetryConfig};
use entrega_cache::MemoryCache;
use entrega_core::models::courier::CourierProfile;
use entrega_core::ApiResult;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

/// One method per `/reparto` endpoint; pass-through only.
#[derive(Clone)]
pub struct CourierApi {
    client: ApiClient,
}

impl CourierApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> ApiResult<CourierProfile> {
        let payload = self.client.get("reparto/perfil").await?;
        decode(payload, "perfil de reparto")
    }

    pub async fn update_profile(&self, changes: Value) -> ApiResult<CourierProfile> {
        let payload = self.client.patch("reparto/perfil", changes).await?;
        decode(payload, "perfil de reparto actualizado")
    }

    pub async fn set_availability(&self, available: bool) -> ApiResult<CourierProfile> {
        let payload = self
            .client
            .patch("reparto/disponibilidad", json!({ "disponible": available }))
            .await?;
        decode(payload, "disponibilidad actualizada")
    }

    /// Upload an identity/license document for verification.
    pub async fn upload_document(&self, kind: &str, file: FilePart) -> ApiResult<()> {
        self.client
            .multipart(
                Method::POST,
                "reparto/documentos",
                vec![("tipo".to_string(), kind.to_string())],
                vec![file],
            )
            .await?;
        Ok(())
    }
}

const PROFILE_KEY: &str = "reparto";

/// Cached view over the courier's delivery profile.
pub struct CourierService {
    api: CourierApi,
    cache: MemoryCache<String, CourierProfile>,
    retry: RetryConfig,
}

impl CourierService {
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        debug!(cache_ttl_secs = cache_ttl.as_secs(), "created courier service");
        Self {
            api: CourierApi::new(client),
            cache: MemoryCache::new(1, cache_ttl),
            retry: RetryConfig::default(),
        }
    }

    pub async fn profile(&self, force_reload: bool) -> ApiResult<CourierProfile> {
        if !force_reload {
            if let Some(profile) = self.cache.get(&PROFILE_KEY.to_string()).await {
                trace!("courier profile cache hit");
                return Ok(profile);
            }
        }
        let profile = retry_read(&self.retry, || self.api.profile()).await?;
        self.cache
            .insert(PROFILE_KEY.to_string(), profile.clone())
            .await;
        Ok(profile)
    }

    /// Toggle availability; the write is never retried, the cache follows
    /// the server's answer.
    pub async fn set_availability(&self, available: bool) -> ApiResult<CourierProfile> {
        let profile = self.api.set_availability(available).await?;
        self.cache
            .insert(PROFILE_KEY.to_string(), profile.clone())
            .await;
        Ok(profile)
    }

    pub async fn upload_document(&self, kind: &str, file: FilePart) -> ApiResult<()> {
        self.api.upload_document(kind, file).await
    }
}
