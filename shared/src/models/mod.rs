//! Data models
//!
//! One module per back-office collection. Rows are stored as JSON
//! documents, so every entity is plain serde. IDs are UUID strings.
//! Update payloads skip `None` fields so they can be merged into the
//! stored row as-is.

pub mod admin_user;
pub mod business_hour;
pub mod category;
pub mod customer;
pub mod delivery_zone;
pub mod menu_item;
pub mod neighborhood;
pub mod order;
pub mod settings;

// Re-exports
pub use admin_user::*;
pub use business_hour::*;
pub use category::*;
pub use customer::*;
pub use delivery_zone::*;
pub use menu_item::*;
pub use neighborhood::*;
pub use order::*;
pub use settings::*;
