//! Address book endpoints, duplicate-conflict translation, and the cached
//! address service.

use crate::client::ApiClient;
use crate::error_handling::decode;
use crate::retry::{retry_read, RetryConfig};
use entrega_cache::MemoryCache;
use entrega_core::models::address::{Address, NewAddress};
use entrega_core::{ApiError, ApiResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

/// Legacy duplicate markers in human-readable server messages. The server
/// has no stable conflict code yet; until it grows one, these substrings are
/// the fallback signal.
const DUPLICATE_MARKERS: [&str; 2] = ["Ya tienes una dirección", "muy cercana"];

/// Addresses closer than this (in degrees, ~50 m) count as the same place.
const NEARBY_EPSILON_DEG: f64 = 0.0005;

#[derive(Debug, Deserialize)]
struct AddressListResponse {
    #[serde(rename = "direcciones", default)]
    addresses: Vec<Address>,
}

/// Outcome of submitting an address: stored, or collided with an existing
/// one. The duplicate carries the server's message and the original payload
/// so the caller can re-submit it as an update.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressOutcome {
    Saved(Address),
    Duplicate { message: String, data: NewAddress },
}

/// One method per `/direcciones` endpoint; pass-through plus the
/// duplicate-conflict sentinel translation.
#[derive(Clone)]
pub struct AddressesApi {
    client: ApiClient,
}

impl AddressesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> ApiResult<Vec<Address>> {
        let payload = self.client.get("direcciones").await?;
        let response: AddressListResponse = decode(payload, "lista de direcciones")?;
        Ok(response.addresses)
    }

    /// Create an address, translating the known duplicate-conflict error
    /// into [`AddressOutcome::Duplicate`] instead of failing.
    pub async fn create(&self, new: &NewAddress) -> ApiResult<AddressOutcome> {
        let body = serde_json::to_value(new)
            .map_err(|error| ApiError::network("Dirección inválida").with_cause(error.to_string()))?;

        match self.client.post("direcciones", body).await {
            Ok(payload) => Ok(AddressOutcome::Saved(decode(payload, "dirección creada")?)),
            Err(error) => match duplicate_conflict(&error) {
                Some(message) => {
                    debug!(status = error.status_code(), "address create hit a duplicate");
                    Ok(AddressOutcome::Duplicate {
                        message,
                        data: new.clone(),
                    })
                }
                None => Err(error),
            },
        }
    }

    pub async fn update(&self, id: u64, data: &NewAddress) -> ApiResult<Address> {
        let body = serde_json::to_value(data)
            .map_err(|error| ApiError::network("Dirección inválida").with_cause(error.to_string()))?;
        let payload = self.client.patch(&format!("direcciones/{id}"), body).await?;
        decode(payload, "dirección actualizada")
    }

    pub async fn delete(&self, id: u64) -> ApiResult<()> {
        self.client.delete(&format!("direcciones/{id}")).await?;
        Ok(())
    }
}

/// Ordered extractors over the duplicate-conflict shapes the server has
/// shipped: a 409 status, an `etiqueta` field error carrying a marker, then
/// a marker anywhere in the message.
fn duplicate_conflict(error: &ApiError) -> Option<String> {
    from_conflict_status(error)
        .or_else(|| from_label_field_error(error))
        .or_else(|| from_message_marker(error))
}

fn from_conflict_status(error: &ApiError) -> Option<String> {
    (error.status_code() == 409).then(|| {
        error
            .field_error("etiqueta")
            .unwrap_or_else(|| error.message().to_string())
    })
}

fn from_label_field_error(error: &ApiError) -> Option<String> {
    error
        .field_error("etiqueta")
        .filter(|message| has_marker(message))
}

fn from_message_marker(error: &ApiError) -> Option<String> {
    has_marker(error.message()).then(|| error.message().to_string())
}

fn has_marker(message: &str) -> bool {
    DUPLICATE_MARKERS.iter().any(|marker| message.contains(marker))
}

fn normalized_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// An existing address counts as a duplicate of the candidate when the
/// labels match (ignoring case) or the coordinates are practically the same
/// place.
fn find_match<'a>(existing: &'a [Address], candidate: &NewAddress) -> Option<&'a Address> {
    existing.iter().find(|address| {
        normalized_label(&address.label) == normalized_label(&candidate.label)
            || ((address.latitude - candidate.latitude).abs() < NEARBY_EPSILON_DEG
                && (address.longitude - candidate.longitude).abs() < NEARBY_EPSILON_DEG)
    })
}

const LIST_KEY: &str = "direcciones";

/// Short-lived cached copy of the address book plus the retry-as-update
/// business rule.
pub struct AddressService {
    api: AddressesApi,
    cache: MemoryCache<String, Vec<Address>>,
    retry: RetryConfig,
}

impl AddressService {
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        debug!(cache_ttl_secs = cache_ttl.as_secs(), "created address service");
        Self {
            api: AddressesApi::new(client),
            cache: MemoryCache::new(1, cache_ttl),
            retry: RetryConfig::default(),
        }
    }

    /// All saved addresses, from cache unless expired or forced.
    pub async fn all(&self, force_reload: bool) -> ApiResult<Vec<Address>> {
        if !force_reload {
            if let Some(addresses) = self.cache.get(&LIST_KEY.to_string()).await {
                trace!(count = addresses.len(), "address cache hit");
                return Ok(addresses);
            }
        }
        let addresses = retry_read(&self.retry, || self.api.list()).await?;
        self.cache
            .insert(LIST_KEY.to_string(), addresses.clone())
            .await;
        Ok(addresses)
    }

    /// Save an address, resolving duplicates as updates.
    ///
    /// A candidate that matches a known address is submitted as an update
    /// directly. If the server still reports a duplicate we re-read the list
    /// and update the match; with no match to update, the sentinel is
    /// surfaced for the caller to decide. The create itself is never
    /// re-submitted automatically.
    pub async fn save(&self, new: NewAddress) -> ApiResult<AddressOutcome> {
        let existing = self.all(false).await?;
        if let Some(found) = find_match(&existing, &new) {
            debug!(id = found.id, "address matches an existing one, updating instead");
            let updated = self.api.update(found.id, &new).await?;
            self.invalidate().await;
            return Ok(AddressOutcome::Saved(updated));
        }

        match self.api.create(&new).await? {
            AddressOutcome::Saved(address) => {
                self.invalidate().await;
                Ok(AddressOutcome::Saved(address))
            }
            AddressOutcome::Duplicate { message, data } => {
                // The server saw a duplicate our cached copy missed.
                let fresh = retry_read(&self.retry, || self.api.list()).await?;
                self.cache.insert(LIST_KEY.to_string(), fresh.clone()).await;

                match find_match(&fresh, &data) {
                    Some(found) => {
                        debug!(id = found.id, "server-reported duplicate, updating instead");
                        let updated = self.api.update(found.id, &data).await?;
                        self.invalidate().await;
                        Ok(AddressOutcome::Saved(updated))
                    }
                    None => Ok(AddressOutcome::Duplicate { message, data }),
                }
            }
        }
    }

    pub async fn remove(&self, id: u64) -> ApiResult<()> {
        self.api.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    async fn invalidate(&self) {
        self.cache.invalidate(&LIST_KEY.to_string()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address(id: u64, label: &str, lat: f64, lon: f64) -> Address {
        Address {
            id,
            label: label.to_string(),
            street: "Calle 1".to_string(),
            city: "CDMX".to_string(),
            reference: None,
            latitude: lat,
            longitude: lon,
            is_default: false,
        }
    }

    fn candidate(label: &str, lat: f64, lon: f64) -> NewAddress {
        NewAddress {
            label: label.to_string(),
            street: "Calle 1".to_string(),
            city: "CDMX".to_string(),
            reference: None,
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn conflict_status_is_a_duplicate() {
        let error = ApiError::from_payload(
            409,
            &json!({"errors": {"etiqueta": "Ya tienes una dirección con esta etiqueta"}}),
        );
        assert_eq!(
            duplicate_conflict(&error).as_deref(),
            Some("Ya tienes una dirección con esta etiqueta")
        );
    }

    #[test]
    fn conflict_status_without_field_error_uses_message() {
        let error = ApiError::from_payload(409, &json!({"mensaje": "Dirección repetida"}));
        assert_eq!(duplicate_conflict(&error).as_deref(), Some("Dirección repetida"));
    }

    #[test]
    fn label_field_error_with_marker_is_a_duplicate() {
        let error = ApiError::from_payload(
            400,
            &json!({"errors": {"etiqueta": "Ya tienes una dirección guardada como Casa"}}),
        );
        assert!(duplicate_conflict(&error).is_some());
    }

    #[test]
    fn message_marker_is_a_duplicate() {
        let error = ApiError::from_payload(
            400,
            &json!({"mensaje": "La dirección está muy cercana a otra guardada"}),
        );
        assert!(duplicate_conflict(&error).is_some());
    }

    #[test]
    fn ordinary_validation_error_is_not_a_duplicate() {
        let error = ApiError::from_payload(
            400,
            &json!({"mensaje": "Faltan campos", "errors": {"calle": ["Obligatorio"]}}),
        );
        assert!(duplicate_conflict(&error).is_none());
    }

    #[test]
    fn find_match_by_label_ignores_case_and_spacing() {
        let existing = vec![address(1, "Casa", 19.43, -99.13)];
        assert!(find_match(&existing, &candidate(" casa ", 0.0, 0.0)).is_some());
        assert!(find_match(&existing, &candidate("Oficina", 0.0, 0.0)).is_none());
    }

    #[test]
    fn find_match_by_proximity() {
        let existing = vec![address(1, "Casa", 19.4326, -99.1332)];
        assert!(find_match(&existing, &candidate("Depto", 19.4327, -99.1331)).is_some());
        assert!(find_match(&existing, &candidate("Lejos", 19.50, -99.13)).is_none());
    }
}
