//! Admin User Model

use serde::{Deserialize, Serialize};

/// Back-office user allowed to sign in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
