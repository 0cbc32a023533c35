//! Data Store Module
//!
//! Document-style access to the back-office collections. Every record is a
//! JSON object keyed by a string `id`; services convert their typed models
//! to and from [`Record`] at this boundary.
//!
//! Two backends implement [`DataStore`]:
//! - [`SqliteStore`]: sqlx + SQLite, one `(id, data)` table per collection
//! - [`MemoryStore`]: in-process, for tests and ephemeral runs

pub mod memory;
pub mod query;
pub mod sqlite;

pub use memory::MemoryStore;
pub use query::{Condition, Query, SortDirection, SortKey};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// One stored record
pub type Record = Map<String, Value>;

/// Back-office collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    MenuItems,
    MenuCategories,
    OperatingHours,
    DeliveryZones,
    Neighborhoods,
    Customers,
    Orders,
    OrdersClosed,
    RestaurantSettings,
    AdminUsers,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::MenuItems,
        Table::MenuCategories,
        Table::OperatingHours,
        Table::DeliveryZones,
        Table::Neighborhoods,
        Table::Customers,
        Table::Orders,
        Table::OrdersClosed,
        Table::RestaurantSettings,
        Table::AdminUsers,
    ];

    /// SQL table name
    pub const fn name(&self) -> &'static str {
        match self {
            Table::MenuItems => "menu_items",
            Table::MenuCategories => "menu_categories",
            Table::OperatingHours => "operating_hours",
            Table::DeliveryZones => "delivery_zones",
            Table::Neighborhoods => "neighborhoods",
            Table::Customers => "customers",
            Table::Orders => "orders",
            Table::OrdersClosed => "orders_closed",
            Table::RestaurantSettings => "restaurant_settings",
            Table::AdminUsers => "admin_users",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {table}/{id}")]
    NotFound { table: Table, id: String },

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store refused the request itself (bad field name, injected fault, ...)
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(db.message().to_string())
            }
            _ => StoreError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Database(format!("Migration failed: {err}"))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { table, id } => {
                AppError::with_message(ErrorCode::NotFound, format!("{table}/{id} not found"))
                    .with_detail("table", table.name())
                    .with_detail("id", id)
            }
            StoreError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            StoreError::Serialization(msg) => AppError::with_message(ErrorCode::InvalidFormat, msg),
            StoreError::Database(msg) | StoreError::Rejected(msg) => AppError::database(msg),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Data-store collaborator
///
/// `update` replaces the given top-level fields and leaves the others
/// untouched; the `id` field is never rewritten. Updating or deleting a
/// missing id is [`StoreError::NotFound`].
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Record>>;

    async fn update(&self, table: Table, id: &str, fields: Record) -> StoreResult<()>;

    /// Insert a record, assigning a UUID `id` when absent; returns the stored record
    async fn insert(&self, table: Table, fields: Record) -> StoreResult<Record>;

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()>;

    async fn count(&self, query: &Query) -> StoreResult<usize> {
        Ok(self.select(query).await?.len())
    }

    /// Apply several updates. The default applies them one by one and stops
    /// at the first failure; backends with transactions apply all or none.
    async fn update_many(&self, table: Table, updates: Vec<(String, Record)>) -> StoreResult<()> {
        for (id, fields) in updates {
            self.update(table, &id, fields).await?;
        }
        Ok(())
    }
}

/// Serialize a model into a record
pub fn to_record<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Deserialize a record into a model
pub fn from_record<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Deserialize records, skipping (and logging) rows that do not fit the model
pub fn from_records<T: DeserializeOwned>(table: Table, records: Vec<Record>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("id").cloned().unwrap_or(Value::Null);
            match from_record(record) {
                Ok(model) => Some(model),
                Err(e) => {
                    tracing::warn!(%table, %id, error = %e, "Skipping unreadable record");
                    None
                }
            }
        })
        .collect()
}

/// Single-field record, the common shape of toggles and reorders
pub fn field(name: &str, value: impl Into<Value>) -> Record {
    let mut record = Record::new();
    record.insert(name.to_string(), value.into());
    record
}

/// Assign a fresh id when the record has none
pub(crate) fn ensure_id(record: &mut Record) -> StoreResult<String> {
    match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            let id = shared::util::new_id();
            record.insert("id".into(), Value::String(id.clone()));
            Ok(id)
        }
        Some(other) => Err(StoreError::Rejected(format!("id must be a string: {other}"))),
    }
}

/// Field names are interpolated into JSON paths; keep them to identifiers
pub(crate) fn check_field_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!("invalid field name: {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_id() {
        let mut record = Record::new();
        let id = ensure_id(&mut record).unwrap();
        assert_eq!(record["id"], json!(id));

        let mut record = field("id", "fixed");
        assert_eq!(ensure_id(&mut record).unwrap(), "fixed");

        let mut record = field("id", 7);
        assert!(ensure_id(&mut record).is_err());
    }

    #[test]
    fn test_check_field_name() {
        assert!(check_field_name("display_order").is_ok());
        assert!(check_field_name("a.b").is_err());
        assert!(check_field_name("x') OR 1=1 --").is_err());
        assert!(check_field_name("").is_err());
    }

    #[test]
    fn test_store_error_into_app_error() {
        let err: AppError = StoreError::NotFound {
            table: Table::MenuItems,
            id: "m1".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("menu_items/m1"));

        let err: AppError = StoreError::Database("disk full".into()).into();
        assert!(err.is_system());
    }

    #[test]
    fn test_from_records_skips_bad_rows() {
        #[derive(serde::Deserialize)]
        struct Named {
            name: String,
        }
        let rows = vec![
            field("name", "Centro"),
            field("name", 3),
            field("name", "Jardim"),
        ];
        let named: Vec<Named> = from_records(Table::Neighborhoods, rows);
        let names: Vec<_> = named.into_iter().map(|n| n.name).collect();
        assert_eq!(names, ["Centro", "Jardim"]);
    }
}
