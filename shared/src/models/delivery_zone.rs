//! Delivery Zone Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Distance band with its delivery fee (distances in km)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: String,
    pub min_distance: Decimal,
    pub max_distance: Decimal,
    pub delivery_fee: Decimal,
}

impl DeliveryZone {
    /// Whether `km` falls inside `[min, max)`
    pub fn contains(&self, km: Decimal) -> bool {
        km >= self.min_distance && km < self.max_distance
    }
}

/// Create / replace delivery zone payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZoneCreate {
    pub min_distance: Decimal,
    pub max_distance: Decimal,
    pub delivery_fee: Decimal,
}

/// Update delivery zone payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryZoneUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
}
