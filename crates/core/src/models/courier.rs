use serde::{Deserialize, Serialize};

/// Delivery profile of a courier-role user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourierProfile {
    pub id: u64,
    #[serde(rename = "vehiculo")]
    pub vehicle: String,
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "disponible")]
    pub available: bool,
    #[serde(rename = "calificacion", default)]
    pub rating: Option<f64>,
    #[serde(rename = "entregas_totales", default)]
    pub total_deliveries: u64,
}
