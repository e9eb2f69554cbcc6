use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile of the logged-in user, any role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "correo")]
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "rol")]
    pub role: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(rename = "fecha_registro", default)]
    pub registered_at: Option<DateTime<Utc>>,
}

/// Derived activity counters shown on the profile screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    #[serde(rename = "pedidos_totales", default)]
    pub total_orders: u64,
    #[serde(rename = "pedidos_mes", default)]
    pub orders_this_month: u64,
    #[serde(rename = "calificacion_promedio", default)]
    pub average_rating: Option<f64>,
    #[serde(rename = "gasto_total", default)]
    pub total_spent: Option<f64>,
}

/// Profile and statistics, fetched concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub profile: UserProfile,
    pub statistics: UserStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_deserializes_from_wire_keys() {
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 7,
            "nombre": "Lucía Méndez",
            "correo": "lucia@example.com",
            "telefono": "+52 55 1234 5678",
            "rol": "cliente",
            "fecha_registro": "2025-03-01T12:00:00Z",
        }))
        .unwrap();

        assert_eq!(profile.name, "Lucía Méndez");
        assert_eq!(profile.role, "cliente");
        assert!(profile.avatar_url.is_none());
        assert!(profile.registered_at.is_some());
    }

    #[test]
    fn statistics_fields_default_when_missing() {
        let stats: UserStatistics = serde_json::from_value(json!({})).unwrap();
        assert_eq!(stats.total_orders, 0);
        assert!(stats.average_rating.is_none());
    }
}
