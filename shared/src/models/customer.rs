//! Customer Model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub phone: String,
    pub name: String,
    /// Any historical address shape, see [`crate::address`]
    #[serde(default)]
    pub address: Value,
    #[serde(default)]
    pub last_order_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Customer form values; `address` is free text or JSON text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInput {
    pub phone: String,
    pub name: String,
    pub address: String,
}
