//! Session lifecycle endpoints.
//!
//! Login and logout live on [`ApiClient`] itself because they are the only
//! operations allowed to replace or drop the token pair.

use crate::client::ApiClient;
use crate::error_handling::decode;
use entrega_core::models::auth::LoginResponse;
use entrega_core::ApiResult;
use serde_json::json;
use tracing::{debug, info};

const LOGIN_PATH: &str = "auth/login";
const LOGOUT_PATH: &str = "auth/logout";

impl ApiClient {
    /// Authenticate with credentials; on success the token pair and role are
    /// held in memory and persisted to the token store.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<()> {
        let payload = self
            .post(
                LOGIN_PATH,
                json!({ "correo": email, "contrasena": password }),
            )
            .await?;
        let login: LoginResponse = decode(payload, "inicio de sesión")?;
        self.install_session(login).await;
        info!("login succeeded");
        Ok(())
    }

    /// End the session. Server-side invalidation is best effort; local state
    /// always clears.
    pub async fn logout(&self) {
        if self.is_authenticated().await {
            if let Err(error) = self.post(LOGOUT_PATH, json!({})).await {
                debug!(error = %error, "server-side logout failed, ignoring");
            }
        }
        self.clear_session().await;
        info!("session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::token_store::MemoryTokenStore;
    use entrega_core::models::auth::StoredSession;
    use mockito::Server;

    fn client_for(url: &str, store: MemoryTokenStore) -> ApiClient {
        ApiClient::new(&ClientConfig::new().with_base_url(url), store).unwrap()
    }

    #[tokio::test]
    async fn login_installs_tokens_and_role() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .match_body(mockito::Matcher::PartialJson(
                serde_json::json!({"correo": "lucia@example.com"}),
            ))
            .with_status(200)
            .with_body(
                r#"{"access_token": "a-1", "refresh_token": "r-1", "rol": "repartidor"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url(), MemoryTokenStore::new());
        client.load_tokens().await;

        client
            .login("lucia@example.com", "segura123")
            .await
            .unwrap();

        assert!(client.is_authenticated().await);
        assert_eq!(client.user_role().await.as_deref(), Some("repartidor"));
    }

    #[tokio::test]
    async fn failed_login_keeps_client_unauthenticated() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login")
            .with_status(401)
            .with_body(
                r#"{"mensaje": "Credenciales incorrectas", "detalles": {"intentos_restantes": 2}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url(), MemoryTokenStore::new());
        client.load_tokens().await;

        let error = client.login("lucia@example.com", "mala").await.unwrap_err();
        assert!(error.is_auth_error());
        assert_eq!(
            error.details().get("intentos_restantes"),
            Some(&serde_json::json!(2))
        );
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn logout_clears_locally_even_if_server_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/logout")
            .with_status(500)
            .with_body(r#"{"mensaje": "Fuera de servicio"}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_session(StoredSession {
            access_token: Some("a-1".to_string()),
            refresh_token: Some("r-1".to_string()),
            role: Some("cliente".to_string()),
        });
        let client = client_for(&server.url(), store);
        client.load_tokens().await;
        assert!(client.is_authenticated().await);

        client.logout().await;

        assert!(!client.is_authenticated().await);
        assert_eq!(client.user_role().await, None);
    }
}
