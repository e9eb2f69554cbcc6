use serde::{Deserialize, Serialize};

/// Saved delivery address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: u64,
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "calle")]
    pub street: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "referencia", default)]
    pub reference: Option<String>,
    #[serde(rename = "latitud")]
    pub latitude: f64,
    #[serde(rename = "longitud")]
    pub longitude: f64,
    #[serde(rename = "predeterminada", default)]
    pub is_default: bool,
}

/// Payload for creating (or re-submitting) an address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
    #[serde(rename = "etiqueta")]
    pub label: String,
    #[serde(rename = "calle")]
    pub street: String,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "referencia", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "latitud")]
    pub latitude: f64,
    #[serde(rename = "longitud")]
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_round_trips_through_wire_keys() {
        let address: Address = serde_json::from_value(json!({
            "id": 3,
            "etiqueta": "Casa",
            "calle": "Av. Reforma 123",
            "ciudad": "CDMX",
            "latitud": 19.4326,
            "longitud": -99.1332,
            "predeterminada": true,
        }))
        .unwrap();

        assert_eq!(address.label, "Casa");
        assert!(address.is_default);

        let wire = serde_json::to_value(&address).unwrap();
        assert_eq!(wire["etiqueta"], json!("Casa"));
        assert_eq!(wire["latitud"], json!(19.4326));
    }

    #[test]
    fn new_address_omits_missing_reference() {
        let payload = serde_json::to_value(NewAddress {
            label: "Oficina".to_string(),
            street: "Insurgentes 500".to_string(),
            city: "CDMX".to_string(),
            reference: None,
            latitude: 19.40,
            longitude: -99.17,
        })
        .unwrap();

        assert!(payload.get("referencia").is_none());
    }
}
