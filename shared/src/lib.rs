//! Shared types for the Entrega back-office
//!
//! Domain models, the delivery-address normalizer, the unified error
//! system and small formatting utilities used by every crate in the
//! workspace. Nothing here performs I/O.

pub mod address;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use address::{DeliveryAddress, bairro_from_address, format_address, resolve_bairro};
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
