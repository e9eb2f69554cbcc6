use super::extract;
use super::NON_FIELD_ERRORS_KEY;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fixed copy shown when no response was received at all.
pub const CONNECTIVITY_MESSAGE: &str =
    "Sin conexión con el servidor. Revisa tu conexión a internet e inténtalo de nuevo.";

/// Fixed copy shown for any 5xx response.
pub const SERVER_FAILURE_MESSAGE: &str =
    "El servidor tuvo un problema. Inténtalo de nuevo más tarde.";

/// Fallback copy when the server sent no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Ocurrió un error inesperado. Inténtalo de nuevo.";

/// Structured failure value produced by the API client for every non-2xx
/// response and every transport-level failure.
///
/// `status_code` is the HTTP status, or 0 when no response was received.
/// Instances are immutable after construction; the `with_*` methods return
/// modified copies.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("api error (status {status_code}): {message}")]
pub struct ApiError {
    status_code: u16,
    message: String,
    field_errors: BTreeMap<String, Value>,
    details: BTreeMap<String, Value>,
    cause: Option<String>,
}

impl ApiError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            field_errors: BTreeMap::new(),
            details: BTreeMap::new(),
            cause: None,
        }
    }

    /// A failure with no HTTP response behind it (timeout, DNS, refused).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    /// Parse the server's error shape into a structured error.
    ///
    /// The server is inconsistent about key names across endpoints, so each
    /// piece is pulled out by an ordered list of named extractors; see
    /// [`extract`](super::extract). Missing pieces default to empty.
    pub fn from_payload(status_code: u16, payload: &Value) -> Self {
        let field_errors = extract::field_errors(payload).unwrap_or_default();
        let details = extract::details(payload);
        let message = extract::message(payload)
            .unwrap_or_else(|| format!("El servidor respondió con el estado {status_code}"));

        Self {
            status_code,
            message,
            field_errors,
            details,
            cause: None,
        }
    }

    // Copy-with-override constructors. `ApiError` is a value type: callers
    // that need a variant derive a new instance instead of mutating.

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_field_errors(mut self, field_errors: BTreeMap<String, Value>) -> Self {
        self.field_errors = field_errors;
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> &BTreeMap<String, Value> {
        &self.field_errors
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        &self.details
    }

    /// Diagnostic-only context (original transport error, body snippet).
    /// Never part of any user-facing message.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    // Classification. Pure functions of `status_code` and `details`.

    pub fn is_auth_error(&self) -> bool {
        self.status_code == 401
    }

    pub fn is_forbidden(&self) -> bool {
        self.status_code == 403
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }

    pub fn is_validation_error(&self) -> bool {
        self.status_code == 400
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status_code == 429
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code >= 500
    }

    pub fn is_network_error(&self) -> bool {
        self.status_code == 0
    }

    pub fn is_recoverable(&self) -> bool {
        self.is_network_error()
            || self.is_rate_limited()
            || self.status_code == 503
            || self.status_code == 504
    }

    /// Whether the account behind this failure is administratively locked.
    ///
    /// The server has shipped the flag both inside `details` and inside the
    /// field-error map, under Spanish and English spellings; accept any of
    /// them.
    pub fn is_account_locked(&self) -> bool {
        extract::LOCKED_FLAG_KEYS.iter().any(|key| {
            self.details.get(*key).is_some_and(extract::is_truthy)
                || self.field_errors.get(*key).is_some_and(extract::is_truthy)
        })
    }

    /// First validation message for a form field, if the server sent one.
    pub fn field_error(&self, name: &str) -> Option<String> {
        self.field_errors.get(name).and_then(extract::first_message)
    }

    /// Every field-level message as `"field: message"`, excluding the
    /// reserved non-field key and entries that carry no message (bare flags).
    pub fn all_field_errors(&self) -> Vec<String> {
        self.field_errors
            .iter()
            .filter(|(field, _)| field.as_str() != NON_FIELD_ERRORS_KEY)
            .filter_map(|(field, value)| {
                extract::first_message(value).map(|message| format!("{field}: {message}"))
            })
            .collect()
    }

    /// Seconds the server asked us to wait, for rate-limited responses.
    pub fn retry_after_seconds(&self) -> Option<u64> {
        extract::as_seconds(self.details.get("retry_after")?)
    }

    fn locked_until(&self) -> Option<String> {
        let raw = extract::LOCKED_UNTIL_KEYS
            .iter()
            .find_map(|key| self.details.get(*key))
            .and_then(Value::as_str)?;

        // Re-format machine timestamps for display; pass anything else through.
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.format("%d/%m/%Y %H:%M").to_string()),
            Err(_) => Some(raw.to_string()),
        }
    }

    /// The one message UI layers are allowed to show for this failure,
    /// unless a field-specific message is rendered inline instead.
    pub fn user_facing_message(&self) -> String {
        if self.is_network_error() {
            return CONNECTIVITY_MESSAGE.to_string();
        }
        if self.is_server_error() {
            return SERVER_FAILURE_MESSAGE.to_string();
        }
        if self.is_rate_limited() {
            return match self.retry_after_seconds() {
                Some(seconds) => format!(
                    "Demasiados intentos. Espera {} y vuelve a intentarlo.",
                    humanize_seconds(seconds)
                ),
                None => "Demasiados intentos. Espera un momento y vuelve a intentarlo."
                    .to_string(),
            };
        }
        if self.is_account_locked() {
            return match self.locked_until() {
                Some(until) => {
                    format!("Tu cuenta está bloqueada temporalmente hasta {until}.")
                }
                None => "Tu cuenta está bloqueada temporalmente. Inténtalo más tarde.".to_string(),
            };
        }
        if self.message.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            self.message.clone()
        }
    }

    /// Serialize for logging/telemetry. The cause stays rendered text.
    pub fn to_transport_object(&self) -> Value {
        json!({
            "status_code": self.status_code,
            "message": self.message,
            "field_errors": Value::Object(Map::from_iter(
                self.field_errors.iter().map(|(k, v)| (k.clone(), v.clone())),
            )),
            "details": Value::Object(Map::from_iter(
                self.details.iter().map(|(k, v)| (k.clone(), v.clone())),
            )),
            "cause": self.cause,
            "generated_at": Utc::now().to_rfc3339(),
        })
    }
}

/// "45 segundos", "1 minutos y 30 segundos", "2 minutos".
fn humanize_seconds(total: u64) -> String {
    if total < 60 {
        return format!("{total} segundos");
    }
    let minutes = total / 60;
    let seconds = total % 60;
    if seconds == 0 {
        format!("{minutes} minutos")
    } else {
        format!("{minutes} minutos y {seconds} segundos")
    }
}
