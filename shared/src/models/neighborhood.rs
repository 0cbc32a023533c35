//! Neighborhood Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Neighborhood (bairro) with a flat delivery fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub id: String,
    pub name: String,
    /// Older rows call this column `delivery_fee`
    #[serde(alias = "delivery_fee")]
    pub fee: Decimal,
}

/// Create neighborhood payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborhoodCreate {
    pub name: String,
    pub fee: Decimal,
}

/// Update neighborhood payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeighborhoodUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
}

/// Normalized form used to compare neighborhood names
pub fn normalize_bairro(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
