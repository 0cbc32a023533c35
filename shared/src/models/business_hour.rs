//! Business Hour Model

use serde::{Deserialize, Serialize};

/// Day names indexed by weekday (0 = Sunday)
pub const DAY_NAMES: [&str; 7] = [
    "Domingo",
    "Segunda-feira",
    "Terça-feira",
    "Quarta-feira",
    "Quinta-feira",
    "Sexta-feira",
    "Sábado",
];

/// Portuguese name of a weekday, `None` when out of range
pub fn day_name(weekday: u8) -> Option<&'static str> {
    DAY_NAMES.get(weekday as usize).copied()
}

/// Opening hours of one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessHour {
    pub id: String,
    /// 0 = Domingo … 6 = Sábado
    pub weekday: u8,
    /// `HH:MM`
    pub open_time: String,
    /// `HH:MM`
    pub close_time: String,
    pub is_open: bool,
    #[serde(default)]
    pub display_order: i32,
}

impl BusinessHour {
    pub fn day_name(&self) -> &'static str {
        day_name(self.weekday).unwrap_or("?")
    }
}

/// Create business hour payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHourCreate {
    pub weekday: u8,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}

/// Update business hour payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessHourUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
}
