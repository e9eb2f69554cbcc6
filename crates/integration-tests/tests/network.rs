//! Transport failures: no response at all must surface as the status-0
//! network error with the fixed connectivity message.

use entrega_core::error::CONNECTIVITY_MESSAGE;
use entrega_integration_tests::*;

/// A local port with nothing listening on it.
fn dead_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let client = client_for(&format!("http://127.0.0.1:{}", dead_port()));
    client.load_tokens().await;

    let error = client.get("usuarios/perfil").await.unwrap_err();

    assert!(error.is_network_error());
    assert_eq!(error.status_code(), 0);
    assert!(error.is_recoverable());
    assert!(error.cause().is_some());
    assert_eq!(error.user_facing_message(), CONNECTIVITY_MESSAGE);
}

#[tokio::test]
async fn post_to_unreachable_server_fails_the_same_way() {
    let client = client_for(&format!("http://127.0.0.1:{}", dead_port()));
    client.load_tokens().await;

    let error = client
        .post("direcciones", serde_json::json!({"etiqueta": "Casa"}))
        .await
        .unwrap_err();

    assert!(error.is_network_error());
    assert_eq!(error.user_facing_message(), CONNECTIVITY_MESSAGE);
}
