//! Unified error codes for the Entrega back-office
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 6xxx: Menu and schedule errors
//! - 7xxx: Delivery area and customer errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for compact serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,

    // ==================== 4xxx: Order ====================
    OrderNotFound = 4001,
    OrderItemsInvalid = 4002,
    InvalidOrderStatus = 4003,

    // ==================== 6xxx: Menu ====================
    MenuItemInvalidPrice = 6002,
    CategoryNotFound = 6101,
    CategoryHasItems = 6102,
    ReorderFailed = 6201,
    InvalidBusinessHours = 6302,

    // ==================== 7xxx: Delivery ====================
    DeliveryZoneInvalidRange = 7002,
    NeighborhoodNameExists = 7102,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
    PrinterNotAvailable = 9201,
    PrintFailed = 9202,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderItemsInvalid => "Order items could not be read",
            ErrorCode::InvalidOrderStatus => "Invalid order status",

            // Menu
            ErrorCode::MenuItemInvalidPrice => "Menu item has invalid price",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategoryHasItems => "Category still has menu items",
            ErrorCode::ReorderFailed => "Could not reorder records",
            ErrorCode::InvalidBusinessHours => "Invalid business hours",

            // Delivery
            ErrorCode::DeliveryZoneInvalidRange => "Delivery zone range is invalid",
            ErrorCode::NeighborhoodNameExists => "Neighborhood already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::PrinterNotAvailable => "Printer is not available",
            ErrorCode::PrintFailed => "Print job failed",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderItemsInvalid),
            4003 => Ok(ErrorCode::InvalidOrderStatus),

            // Menu
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6102 => Ok(ErrorCode::CategoryHasItems),
            6201 => Ok(ErrorCode::ReorderFailed),
            6302 => Ok(ErrorCode::InvalidBusinessHours),

            // Delivery
            7002 => Ok(ErrorCode::DeliveryZoneInvalidRange),
            7102 => Ok(ErrorCode::NeighborhoodNameExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9201 => Ok(ErrorCode::PrinterNotAvailable),
            9202 => Ok(ErrorCode::PrintFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
