//! Common utilities for integration tests.

use entrega_client::{ApiClient, ClientConfig, MemoryTokenStore, TokenStore};
use entrega_core::models::auth::StoredSession;

/// Route client logs to the test output; honors `RUST_LOG`.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Access token the seeded session starts with.
pub const OLD_ACCESS_TOKEN: &str = "acceso-viejo";
/// Refresh token the seeded session starts with.
pub const OLD_REFRESH_TOKEN: &str = "refresco-1";
/// Access token handed out by the refresh fixtures.
pub const NEW_ACCESS_TOKEN: &str = "acceso-nuevo";

/// Config pointed at a test server, with short timeouts.
pub fn test_config(base_url: &str) -> ClientConfig {
    let mut config = ClientConfig::new().with_base_url(base_url);
    config.timeout_secs = 5;
    config.connect_timeout_secs = 2;
    config
}

/// A fresh, unauthenticated client.
pub fn client_for(base_url: &str) -> ApiClient {
    ApiClient::new(&test_config(base_url), MemoryTokenStore::new())
        .expect("failed to build test client")
}

/// A client with any token store injected.
pub fn client_with_store(base_url: &str, store: impl TokenStore + 'static) -> ApiClient {
    ApiClient::new(&test_config(base_url), store).expect("failed to build test client")
}

/// The session a previous run would have persisted.
pub fn seeded_session() -> StoredSession {
    StoredSession {
        access_token: Some(OLD_ACCESS_TOKEN.to_string()),
        refresh_token: Some(OLD_REFRESH_TOKEN.to_string()),
        role: Some("cliente".to_string()),
    }
}

/// A client already authenticated with the seeded session.
pub async fn authenticated_client(base_url: &str) -> ApiClient {
    let client = client_with_store(base_url, MemoryTokenStore::with_session(seeded_session()));
    client.load_tokens().await;
    client
}

/// Wire body for a successful refresh.
pub fn refresh_response_body() -> String {
    serde_json::json!({
        "access_token": NEW_ACCESS_TOKEN,
        "refresh_token": "refresco-2",
        "rol": "cliente",
    })
    .to_string()
}

/// Wire body for a user profile.
pub fn profile_body() -> String {
    serde_json::json!({
        "id": 7,
        "nombre": "Lucía Méndez",
        "correo": "lucia@example.com",
        "rol": "cliente",
    })
    .to_string()
}
