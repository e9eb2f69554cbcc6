//! Order history and detail endpoints.

use crate::client::ApiClient;
use crate::error_handling::decode;
use entrega_core::models::order::{Order, OrderSummary};
use entrega_core::ApiResult;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct OrderListResponse {
    #[serde(rename = "pedidos", default)]
    orders: Vec<OrderSummary>,
}

/// One method per `/pedidos` endpoint; pass-through only.
#[derive(Clone)]
pub struct OrdersApi {
    client: ApiClient,
}

impl OrdersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Page through the order history, optionally filtered by status.
    pub async fn history(
        &self,
        status: Option<&str>,
        page: u32,
    ) -> ApiResult<Vec<OrderSummary>> {
        let mut path = format!("pedidos?pagina={page}");
        if let Some(status) = status {
            path.push_str(&format!("&estado={}", urlencoding::encode(status)));
        }
        let payload = self.client.get(&path).await?;
        let response: OrderListResponse = decode(payload, "historial de pedidos")?;
        Ok(response.orders)
    }

    pub async fn detail(&self, id: u64) -> ApiResult<Order> {
        let payload = self.client.get(&format!("pedidos/{id}")).await?;
        decode(payload, "detalle de pedido")
    }

    /// Rate a delivered order.
    pub async fn rate(&self, id: u64, score: u8, comment: Option<&str>) -> ApiResult<()> {
        self.client
            .post(
                &format!("pedidos/{id}/calificar"),
                json!({ "puntaje": score, "comentario": comment }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_list_defaults_to_empty() {
        let response: OrderListResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.orders.is_empty());

        let response: OrderListResponse = serde_json::from_value(json!({
            "pedidos": [
                {"id": 10, "estado": "entregado", "total": 249.5, "proveedor": "La Esquina"},
            ],
            "total": 1,
        }))
        .unwrap();
        assert_eq!(response.orders.len(), 1);
        assert_eq!(response.orders[0].status, "entregado");
    }
}
