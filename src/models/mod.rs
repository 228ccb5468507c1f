use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of operation a listing is published for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperationKind {
    #[serde(rename = "venta")]
    Sale,
    #[serde(rename = "alquiler")]
    Rental,
}

impl OperationKind {
    /// Wire value used by the backend in query parameters and payloads
    pub fn as_param(&self) -> &'static str {
        match self {
            OperationKind::Sale => "venta",
            OperationKind::Rental => "alquiler",
        }
    }

    /// Display label shown in the UI
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Sale => "Venta",
            OperationKind::Rental => "Alquiler",
        }
    }
}

/// Core listing data model
///
/// Field names follow the backend's wire format, so this deserializes
/// directly from the REST responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "aceptaMascotas")]
    pub accepts_pets: bool,
    #[serde(rename = "precioARS")]
    pub price_ars: i64,
    #[serde(rename = "precioUSD")]
    pub price_usd: i64,
    #[serde(rename = "expensas")]
    pub monthly_fee: i64,
    #[serde(rename = "habitaciones")]
    pub bedrooms: u32,
    #[serde(rename = "banos")]
    pub bathrooms: u32,
    #[serde(rename = "ambientes")]
    pub rooms: u32,
    #[serde(rename = "tipoOperacion")]
    pub operation: OperationKind,
    pub images: Vec<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_deserializes_from_wire_format() {
        let json = r#"{
            "_id": "abc123",
            "titulo": "Depto 2 ambientes",
            "descripcion": "Luminoso, a metros del subte",
            "direccion": "Av. Santa Fe 3100",
            "aceptaMascotas": true,
            "precioARS": 450000,
            "precioUSD": 500,
            "expensas": 80000,
            "habitaciones": 1,
            "banos": 1,
            "ambientes": 2,
            "tipoOperacion": "alquiler",
            "images": ["https://img.example/1.jpg"],
            "isActive": true,
            "createdAt": "2025-03-01T12:00:00Z",
            "updatedAt": "2025-03-02T09:30:00Z"
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, "abc123");
        assert_eq!(listing.operation, OperationKind::Rental);
        assert_eq!(listing.price_ars, 450_000);
        assert_eq!(listing.rooms, 2);
        assert!(listing.accepts_pets);
    }

    #[test]
    fn operation_kind_round_trips_wire_values() {
        assert_eq!(OperationKind::Sale.as_param(), "venta");
        assert_eq!(OperationKind::Rental.as_param(), "alquiler");
        let parsed: OperationKind = serde_json::from_str("\"venta\"").unwrap();
        assert_eq!(parsed, OperationKind::Sale);
    }
}
