//! User profile endpoints and the cached profile service.

use crate::client::ApiClient;
use crate::error_handling::decode;
use crate::request::FilePart;
use crate::retry::{retry_read, RetryConfig};
use entrega_cache::MemoryCache;
use entrega_core::models::user::{ProfileSummary, UserProfile, UserStatistics};
use entrega_core::ApiResult;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, trace};

/// Wire shape of the user directory listing.
#[derive(Debug, Deserialize)]
struct UserSearchResponse {
    #[serde(rename = "resultados", default)]
    results: Vec<UserProfile>,
}

/// One method per `/usuarios` endpoint; pass-through only.
#[derive(Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let payload = self.client.get("usuarios/perfil").await?;
        decode(payload, "perfil de usuario")
    }

    pub async fn update_profile(&self, changes: Value) -> ApiResult<UserProfile> {
        let payload = self.client.patch("usuarios/perfil", changes).await?;
        decode(payload, "perfil actualizado")
    }

    pub async fn statistics(&self) -> ApiResult<UserStatistics> {
        let payload = self.client.get("usuarios/estadisticas").await?;
        decode(payload, "estadísticas de usuario")
    }

    pub async fn change_password(&self, current: &str, new: &str) -> ApiResult<()> {
        self.client
            .post(
                "usuarios/cambiar-contrasena",
                json!({ "actual": current, "nueva": new }),
            )
            .await?;
        Ok(())
    }

    /// Upload a new avatar image; returns the profile with its new URL.
    pub async fn upload_avatar(&self, file: FilePart) -> ApiResult<UserProfile> {
        let payload = self
            .client
            .multipart(Method::POST, "usuarios/avatar", Vec::new(), vec![file])
            .await?;
        decode(payload, "avatar subido")
    }

    /// Supplier-facing directory search.
    pub async fn search(&self, text: &str, page: u32) -> ApiResult<Vec<UserProfile>> {
        let path = format!(
            "usuarios?buscar={}&pagina={page}",
            urlencoding::encode(text)
        );
        let payload = self.client.get(&path).await?;
        let response: UserSearchResponse = decode(payload, "búsqueda de usuarios")?;
        Ok(response.results)
    }
}

const PROFILE_KEY: &str = "perfil";

/// Cached view over the user's own profile and statistics.
pub struct ProfileService {
    api: UsersApi,
    cache: MemoryCache<String, UserProfile>,
    retry: RetryConfig,
}

impl ProfileService {
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        debug!(cache_ttl_secs = cache_ttl.as_secs(), "created profile service");
        Self {
            api: UsersApi::new(client),
            cache: MemoryCache::new(1, cache_ttl),
            retry: RetryConfig::default(),
        }
    }

    /// The profile, from cache unless expired or `force_reload` is set.
    pub async fn profile(&self, force_reload: bool) -> ApiResult<UserProfile> {
        if !force_reload {
            if let Some(profile) = self.cache.get(&PROFILE_KEY.to_string()).await {
                trace!("profile cache hit");
                return Ok(profile);
            }
        }
        let profile = retry_read(&self.retry, || self.api.profile()).await?;
        self.cache
            .insert(PROFILE_KEY.to_string(), profile.clone())
            .await;
        Ok(profile)
    }

    /// Profile plus statistics; the two fetches run concurrently.
    pub async fn summary(&self) -> ApiResult<ProfileSummary> {
        let (profile, statistics) =
            tokio::try_join!(self.api.profile(), self.api.statistics())?;
        self.cache
            .insert(PROFILE_KEY.to_string(), profile.clone())
            .await;
        Ok(ProfileSummary {
            profile,
            statistics,
        })
    }

    pub async fn update(&self, changes: Value) -> ApiResult<UserProfile> {
        let profile = self.api.update_profile(changes).await?;
        self.cache
            .insert(PROFILE_KEY.to_string(), profile.clone())
            .await;
        Ok(profile)
    }
}
