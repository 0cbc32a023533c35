//! Back-office services
//!
//! One service per admin screen. Every service works through an
//! [`AdminContext`] and follows the same contract: failures are reported
//! to the operator through the notifier and the call resolves normally
//! (`None`, `false` or an empty list).
//!
//! - [`MenuService`] - menu items, availability, ordering
//! - [`CategoryService`] - menu categories
//! - [`BusinessHoursService`] - opening hours per weekday
//! - [`DeliveryZoneService`] - distance-based delivery fees
//! - [`NeighborhoodService`] - flat per-bairro delivery fees
//! - [`CustomerService`] - customer records
//! - [`OrderService`] - orders, scheduled orders, receipt lines
//! - [`SettingsService`] - vacation mode and default printer
//! - [`DashboardService`] - summary counters

pub mod business_hours;
pub mod category;
pub mod customer;
pub mod dashboard;
pub mod delivery_zone;
pub mod menu;
pub mod neighborhood;
pub mod order;
pub mod settings;

pub use business_hours::BusinessHoursService;
pub use category::CategoryService;
pub use customer::CustomerService;
pub use dashboard::{DashboardService, DashboardStats};
pub use delivery_zone::{DeliveryZoneService, zone_for_distance};
pub use menu::{MenuFilter, MenuService};
pub use neighborhood::NeighborhoodService;
pub use order::{OrderFilter, OrderService, build_lines, format_items, order_totals, parse_item_refs};
pub use settings::{SETTINGS_ID, SettingsService};

use crate::notify::{Notification, Notifier};
use crate::sequencer::{ReorderStrategy, Sequencer};
use crate::store::{DataStore, Query, Table, from_record, from_records};
use serde::de::DeserializeOwned;
use shared::{AppError, AppResult, ErrorCode};
use std::sync::Arc;
use tracing::{error, warn};

// =============================================================================
// AdminContext
// =============================================================================

/// Collaborators shared by every service
#[derive(Clone)]
pub struct AdminContext {
    pub store: Arc<dyn DataStore>,
    pub notifier: Arc<dyn Notifier>,
    pub sequencer: Sequencer,
}

impl AdminContext {
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn Notifier>) -> Self {
        let sequencer = Sequencer::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            sequencer,
        }
    }

    pub fn with_strategy(mut self, strategy: ReorderStrategy) -> Self {
        self.sequencer = self.sequencer.with_strategy(strategy);
        self
    }

    pub(crate) fn success(&self, title: &str, description: impl Into<String>) {
        self.notifier.notify(Notification::success(title, description));
    }

    /// Report a failed operation and swallow it
    ///
    /// Validation messages are already written for the operator and are
    /// shown as they are; anything else is logged and replaced by
    /// `failure`.
    pub(crate) fn settle<T>(&self, result: AppResult<T>, failure: &str) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                if is_operator_message(&err) {
                    warn!(code = ?err.code, "{}", err.message);
                    self.notifier.notify(Notification::error(err.message));
                } else {
                    error!(code = ?err.code, error = %err, "{failure}");
                    self.notifier.notify(Notification::error(failure));
                }
                None
            }
        }
    }

    /// Typed rows of a query
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, query: &Query) -> AppResult<Vec<T>> {
        let rows = self.store.select(query).await?;
        Ok(from_records(query.table, rows))
    }

    /// One typed row by id, `None` when absent
    pub(crate) async fn find<T: DeserializeOwned>(&self, table: Table, id: &str) -> AppResult<Option<T>> {
        let row = self
            .store
            .select(&Query::by_id(table, id))
            .await?
            .into_iter()
            .next();
        Ok(row.map(from_record).transpose()?)
    }

    /// One typed row by id, `NotFound` when absent
    pub(crate) async fn get<T: DeserializeOwned>(&self, table: Table, id: &str) -> AppResult<T> {
        self.find(table, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{table}/{id}")))
    }
}

/// Errors whose message is meant for the operator
fn is_operator_message(err: &AppError) -> bool {
    matches!(
        err.code,
        ErrorCode::ValidationFailed
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::MenuItemInvalidPrice
            | ErrorCode::CategoryNotFound
            | ErrorCode::CategoryHasItems
            | ErrorCode::InvalidBusinessHours
            | ErrorCode::DeliveryZoneInvalidRange
            | ErrorCode::NeighborhoodNameExists
            | ErrorCode::OrderItemsInvalid
            | ErrorCode::InvalidOrderStatus
    )
}

// =============================================================================
// Form validation
// =============================================================================

/// Trimmed text with at least `min` characters
pub(crate) fn require_min_chars(value: &str, min: usize, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.chars().count() < min {
        return Err(AppError::validation(message));
    }
    Ok(value.to_string())
}
