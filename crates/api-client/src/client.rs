//! The authenticated gateway to the Entrega API.
//!
//! `ApiClient` is the only component that holds the access/refresh token
//! pair. Everything else (resource APIs, domain services, UI glue) goes
//! through its verb methods and reacts to the [`ApiError`] taxonomy.

use crate::config::{ClientConfig, ConfigError};
use crate::error_handling::{handle_response, transport_error};
use crate::request::{multipart_form, ApiRequest, FilePart, RequestBody};
use crate::token_store::TokenStore;
use entrega_core::models::auth::{LoginResponse, StoredSession, TokenPair};
use entrega_core::{ApiError, ApiResult};
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

pub(crate) const REFRESH_PATH: &str = "auth/refresh";

#[derive(Default)]
struct Session {
    tokens: Option<TokenPair>,
    role: Option<String>,
    /// Bumped on every token change (login, refresh, clear). Lets a caller
    /// waiting on the refresh gate detect that someone else already moved
    /// the session forward.
    generation: u64,
    loaded: bool,
}

struct ClientInner {
    http: Client,
    base_url: Url,
    store: Box<dyn TokenStore>,
    session: RwLock<Session>,
    /// Critical section: start a refresh unless one is already in flight.
    refresh_gate: Mutex<()>,
}

/// Cheaply cloneable handle to the shared HTTP transport and session state.
///
/// Construct one at application start (injecting the token store) and hand
/// clones to whoever needs remote access.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        store: impl TokenStore + 'static,
    ) -> Result<Self, ConfigError> {
        let base_url = config.validate()?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|error| ConfigError::HttpClient(error.to_string()))?;

        debug!(base_url = %base_url, "API client created");

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                store: Box::new(store),
                session: RwLock::new(Session::default()),
                refresh_gate: Mutex::new(()),
            }),
        })
    }

    /// Read persisted tokens into memory. Idempotent: only the first call
    /// touches the store.
    pub async fn load_tokens(&self) {
        let mut session = self.inner.session.write().await;
        if session.loaded {
            trace!("tokens already loaded");
            return;
        }
        session.loaded = true;

        match self.inner.store.load().await {
            Ok(Some(stored)) => {
                session.tokens = stored.tokens();
                session.role = stored.role;
                session.generation += 1;
                debug!(
                    authenticated = session.tokens.is_some(),
                    "session restored from storage"
                );
            }
            Ok(None) => debug!("no stored session"),
            Err(error) => warn!(error = %error, "failed to read stored session"),
        }
    }

    /// Whether an access token is currently held in memory. Does not check
    /// the token against the server.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.session.read().await.tokens.is_some()
    }

    /// Last known role, cached alongside the tokens.
    ///
    /// A hint only: it can be stale after a server-side role change. Callers
    /// needing authoritative role information must confirm via
    /// `UsersApi::profile`.
    pub async fn user_role(&self) -> Option<String> {
        self.inner.session.read().await.role.clone()
    }

    pub async fn get(&self, path: &str) -> ApiResult<Value> {
        self.execute(ApiRequest::new(Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.execute(ApiRequest::json(Method::POST, path, body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> ApiResult<Value> {
        self.execute(ApiRequest::json(Method::PATCH, path, body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.execute(ApiRequest::new(Method::DELETE, path)).await
    }

    /// Send a `multipart/form-data` request with scalar fields and file
    /// attachments. Same success/failure/refresh contract as the JSON verbs.
    pub async fn multipart(
        &self,
        method: Method,
        path: &str,
        fields: Vec<(String, String)>,
        files: Vec<FilePart>,
    ) -> ApiResult<Value> {
        self.execute(ApiRequest::multipart(method, path, fields, files))
            .await
    }

    /// Send, and on a 401 run one coalesced refresh and replay the identical
    /// request exactly once.
    async fn execute(&self, request: ApiRequest) -> ApiResult<Value> {
        let generation = self.inner.session.read().await.generation;
        match self.send_once(&request).await {
            Err(error) if error.is_auth_error() => {
                if !self.is_authenticated().await {
                    return Err(error);
                }
                debug!(path = %request.path, "access token rejected, refreshing session");
                self.refresh_session(generation).await?;
                self.send_once(&request).await
            }
            outcome => outcome,
        }
    }

    async fn send_once(&self, request: &ApiRequest) -> ApiResult<Value> {
        let url = self.resolve(&request.path)?;
        let mut builder = self.inner.http.request(request.method.clone(), url.clone());

        if let Some(tokens) = &self.inner.session.read().await.tokens {
            builder = builder.bearer_auth(&tokens.access_token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart { fields, files } => {
                builder.multipart(multipart_form(fields, files).await?)
            }
        };

        trace!(method = %request.method, url = %url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|error| transport_error(&request.path, &error))?;
        handle_response(response, &request.path).await
    }

    fn resolve(&self, path: &str) -> ApiResult<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|error| {
                ApiError::network(format!("Ruta inválida: {path}")).with_cause(error.to_string())
            })
    }

    /// Mint a new token pair from the refresh token.
    ///
    /// At most one refresh runs at a time; concurrent callers wait on the
    /// gate and adopt the finished refresh's outcome. `seen_generation` is
    /// the session generation the failed request was sent under: if the
    /// session moved past it, the 401 was earned with stale tokens and no
    /// new refresh is needed. Any refresh failure clears the session
    /// entirely.
    async fn refresh_session(&self, seen_generation: u64) -> ApiResult<()> {
        let _gate = self.inner.refresh_gate.lock().await;

        {
            let session = self.inner.session.read().await;
            if session.generation != seen_generation {
                // Someone else refreshed (or logged in/out) since the failed
                // request went out.
                return match session.tokens {
                    Some(_) => Ok(()),
                    None => Err(session_expired(None)),
                };
            }
        }

        let refresh_token = match &self.inner.session.read().await.tokens {
            Some(tokens) => tokens.refresh_token.clone(),
            None => return Err(session_expired(None)),
        };

        debug!("refreshing access token");
        let request = ApiRequest::json(
            Method::POST,
            REFRESH_PATH,
            json!({ "refresh_token": refresh_token }),
        );

        match self.send_once(&request).await {
            Ok(payload) => match serde_json::from_value::<LoginResponse>(payload) {
                Ok(login) => {
                    self.install_session(login).await;
                    info!("session refreshed");
                    Ok(())
                }
                Err(error) => {
                    warn!(error = %error, "refresh response unreadable, clearing session");
                    self.clear_session().await;
                    Err(session_expired(Some(error.to_string())))
                }
            },
            Err(error) => {
                warn!(error = %error, "token refresh failed, clearing session");
                self.clear_session().await;
                Err(session_expired(Some(error.to_string())))
            }
        }
    }

    /// Adopt a fresh token pair and persist it.
    pub(crate) async fn install_session(&self, login: LoginResponse) {
        let stored = {
            let mut session = self.inner.session.write().await;
            session.tokens = Some(login.token_pair());
            if login.role.is_some() {
                session.role = login.role.clone();
            }
            session.generation += 1;
            StoredSession {
                access_token: Some(login.access_token),
                refresh_token: Some(login.refresh_token),
                role: session.role.clone(),
            }
        };
        if let Err(error) = self.inner.store.save(&stored).await {
            warn!(error = %error, "failed to persist session");
        }
    }

    /// Drop all token state, memory and store.
    pub(crate) async fn clear_session(&self) {
        {
            let mut session = self.inner.session.write().await;
            session.tokens = None;
            session.role = None;
            session.generation += 1;
        }
        if let Err(error) = self.inner.store.clear().await {
            warn!(error = %error, "failed to clear stored session");
        }
    }
}

fn session_expired(cause: Option<String>) -> ApiError {
    let error = ApiError::new(401, "Tu sesión ha expirado. Inicia sesión de nuevo.");
    match cause {
        Some(cause) => error.with_cause(cause),
        None => error,
    }
}
