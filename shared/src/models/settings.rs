//! Restaurant Settings Model

use serde::{Deserialize, Serialize};

/// Longest vacation message the settings form accepts
pub const VACATION_MESSAGE_MAX_LEN: usize = 500;

/// Singleton restaurant settings row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSettings {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub is_on_vacation: bool,
    #[serde(default)]
    pub vacation_message: String,
    /// Receipt printer address (`host:port`)
    #[serde(default)]
    pub default_printer: Option<String>,
}
