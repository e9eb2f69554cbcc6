use super::address::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in the order history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: u64,
    #[serde(rename = "estado")]
    pub status: String,
    pub total: f64,
    #[serde(rename = "creado_en", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "proveedor", default)]
    pub supplier_name: Option<String>,
}

/// Line item inside an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precio")]
    pub price: f64,
}

/// Full order detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    #[serde(rename = "estado")]
    pub status: String,
    pub total: f64,
    #[serde(rename = "creado_en", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "proveedor", default)]
    pub supplier_name: Option<String>,
    #[serde(rename = "repartidor", default)]
    pub courier_name: Option<String>,
    #[serde(rename = "articulos", default)]
    pub items: Vec<OrderItem>,
    #[serde(rename = "direccion_entrega", default)]
    pub delivery_address: Option<Address>,
}
