use entrega_core::{ApiError, ApiResult};
use reqwest::Response;
use serde_json::Value;
use tracing::warn;

const CAUSE_SNIPPET_LEN: usize = 256;

/// Decode a response per the client's failure contract.
///
/// 2xx decodes the body as JSON (empty bodies decode as `{}`). Non-2xx with
/// a parseable JSON object becomes a structured [`ApiError`]; anything else,
/// unreadable body included, becomes the status-0 network error with the
/// low-level cause kept as diagnostic text.
pub(crate) async fn handle_response(response: Response, context: &str) -> ApiResult<Value> {
    let status = response.status();
    let url = response.url().clone();

    if status.is_success() {
        let bytes = response
            .bytes()
            .await
            .map_err(|error| transport_error(context, &error))?;
        if bytes.is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_slice(&bytes).map_err(|error| {
            ApiError::network("Respuesta ilegible del servidor")
                .with_cause(format!("{context}: {error}"))
        })
    } else {
        let body = response.text().await.unwrap_or_default();
        warn!(url = %url, status = %status, context = %context, "HTTP request failed");

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) if payload.is_object() => {
                Err(ApiError::from_payload(status.as_u16(), &payload))
            }
            _ => Err(ApiError::network(format!(
                "El servidor respondió {status} sin un cuerpo legible"
            ))
            .with_cause(format!("{context}: {}", snippet(&body)))),
        }
    }
}

/// A request that never produced a response: timeout, DNS, refused.
pub(crate) fn transport_error(context: &str, error: &reqwest::Error) -> ApiError {
    let message = if error.is_timeout() {
        "La solicitud tardó demasiado"
    } else if error.is_connect() {
        "No se pudo conectar con el servidor"
    } else {
        "Fallo de red al contactar al servidor"
    };
    ApiError::network(message).with_cause(format!("{context}: {error}"))
}

/// Deserialize a decoded payload into a typed model.
pub(crate) fn decode<T>(payload: Value, context: &str) -> ApiResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(payload).map_err(|error| {
        ApiError::network("Respuesta inesperada del servidor")
            .with_cause(format!("{context}: {error}"))
    })
}

fn snippet(body: &str) -> &str {
    match body.char_indices().nth(CAUSE_SNIPPET_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
