//! Profile service: concurrent summary fetch and the cached profile read.

use entrega_client::ProfileService;
use entrega_integration_tests::*;
use mockito::Server;
use std::time::Duration;

const CACHE_TTL: Duration = Duration::from_secs(60);

#[tokio::test]
async fn summary_fetches_profile_and_statistics_concurrently() {
    let mut server = Server::new_async().await;
    let profile = server
        .mock("GET", "/usuarios/perfil")
        .with_status(200)
        .with_body(profile_body())
        .expect(1)
        .create_async()
        .await;
    let statistics = server
        .mock("GET", "/usuarios/estadisticas")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "pedidos_totales": 12,
                "pedidos_mes": 3,
                "calificacion_promedio": 4.8,
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let service = ProfileService::new(authenticated_client(&server.url()).await, CACHE_TTL);
    let summary = service.summary().await.unwrap();

    assert_eq!(summary.profile.name, "Lucía Méndez");
    assert_eq!(summary.statistics.total_orders, 12);
    assert_eq!(summary.statistics.average_rating, Some(4.8));

    profile.assert_async().await;
    statistics.assert_async().await;
}

#[tokio::test]
async fn profile_is_cached_until_forced() {
    let mut server = Server::new_async().await;
    let profile = server
        .mock("GET", "/usuarios/perfil")
        .with_status(200)
        .with_body(profile_body())
        .expect(2)
        .create_async()
        .await;

    let service = ProfileService::new(authenticated_client(&server.url()).await, CACHE_TTL);

    let first = service.profile(false).await.unwrap();
    let cached = service.profile(false).await.unwrap();
    assert_eq!(first, cached);

    // Force reload bypasses the cached copy.
    service.profile(true).await.unwrap();
    profile.assert_async().await;
}
