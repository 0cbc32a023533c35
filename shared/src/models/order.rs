//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
    ];

    /// Stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }

    /// Portuguese label shown to the operator
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Confirmed => "Confirmado",
            Self::Delivered => "Entregue",
            Self::Canceled => "Cancelado",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderStatus(pub String);

impl fmt::Display for UnknownOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownOrderStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            // both spellings exist in stored rows
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(UnknownOrderStatus(s.to_string())),
        }
    }
}

/// Label used when a stored status is not recognized
pub const UNKNOWN_STATUS_LABEL: &str = "Desconhecido";

/// Order entity
///
/// Used for both `orders` and `orders_closed`. Legacy rows miss most
/// fields, so everything except the id is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Array of `{ id, quantity, name?, price? }`, or the same as JSON text
    #[serde(default)]
    pub items: Value,
    #[serde(default)]
    pub order_amount: Option<Decimal>,
    #[serde(default)]
    pub delivery_fee: Option<Decimal>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Stored as text; see [`Order::status_kind`]
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<Value>,
    #[serde(default)]
    pub bairro: Option<String>,
    /// `YYYY-MM-DD` or a full timestamp for scheduled orders
    #[serde(default)]
    pub scheduled_date: Option<String>,
}

impl Order {
    pub fn status_kind(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn status_label(&self) -> &'static str {
        self.status_kind()
            .map(|s| s.label())
            .unwrap_or(UNKNOWN_STATUS_LABEL)
    }

    /// Short receipt number: first 8 chars of the id, uppercased
    pub fn order_number(&self) -> String {
        if self.id.is_empty() {
            return "N/A".to_string();
        }
        self.id.chars().take(8).collect::<String>().to_uppercase()
    }
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_phone: String,
    pub items: Vec<OrderItemRef>,
    pub order_amount: Decimal,
    pub delivery_fee: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    /// Initial status, pending when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

/// Item reference as stored inside an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRef {
    pub id: String,
    pub quantity: u32,
}

/// Resolved receipt line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// Default name for lines whose menu item cannot be found
pub const UNNAMED_ITEM: &str = "Item sem nome";

/// Amounts shown at the bottom of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub order_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
}
