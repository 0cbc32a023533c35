//! Display-order sequencing
//!
//! Menu items, categories and business-hour days are listed by an integer
//! `display_order`. Moving a record up or down swaps its value with the
//! adjacent record of the list the operator is looking at.
//!
//! With [`ReorderStrategy::Sequential`] the two writes are issued one after
//! the other and are not rolled back: if the second one fails both records
//! carry the same `display_order` until the next successful move. The
//! operator is told once and nothing is retried.
//! [`ReorderStrategy::Atomic`] hands both writes to
//! [`DataStore::update_many`] instead, which the SQLite store runs in a
//! single transaction.

use crate::notify::{Notification, Notifier};
use crate::store::{DataStore, Record, Table, field};
use shared::models::{BusinessHour, MenuCategory, MenuItem};
use shared::{AppError, ErrorCode};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// A record positioned by `display_order`
pub trait Orderable {
    fn id(&self) -> &str;
    fn display_order(&self) -> i32;
}

impl Orderable for MenuItem {
    fn id(&self) -> &str {
        &self.id
    }

    /// Items created before ordering existed count as 0
    fn display_order(&self) -> i32 {
        self.display_order.unwrap_or(0)
    }
}

impl Orderable for MenuCategory {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_order(&self) -> i32 {
        self.display_order
    }
}

impl Orderable for BusinessHour {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_order(&self) -> i32 {
        self.display_order
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// The two writes of one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub target_id: String,
    /// New value for the target (the adjacent record's old value)
    pub target_order: i32,
    pub adjacent_id: String,
    /// New value for the adjacent record (the target's old value)
    pub adjacent_order: i32,
}

/// Moves that are silently ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    /// Target id is not in the list
    NotFound,
    /// Already first (moving up) or last (moving down)
    AtBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Swapped(SwapPlan),
    NotFound,
    AtBoundary,
    /// A write failed; `first_write_applied` tells whether the target was
    /// already updated when the failure happened
    WriteFailed { first_write_applied: bool },
}

impl MoveOutcome {
    /// Both writes were applied
    pub fn is_swapped(&self) -> bool {
        matches!(self, MoveOutcome::Swapped(_))
    }
}

impl From<MoveRejection> for MoveOutcome {
    fn from(rejection: MoveRejection) -> Self {
        match rejection {
            MoveRejection::NotFound => MoveOutcome::NotFound,
            MoveRejection::AtBoundary => MoveOutcome::AtBoundary,
        }
    }
}

/// How the two writes of a move reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderStrategy {
    /// Target first, then the adjacent record; no rollback
    #[default]
    Sequential,
    /// Both writes through one `update_many` call
    Atomic,
}

impl FromStr for ReorderStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "atomic" => Ok(Self::Atomic),
            other => Err(format!("unknown reorder strategy: {other}")),
        }
    }
}

impl fmt::Display for ReorderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Atomic => f.write_str("atomic"),
        }
    }
}

/// Work out a move against a list sorted by `display_order`
///
/// The two values are exchanged, never incremented, so gaps in the
/// numbering are preserved.
pub fn plan_move<T: Orderable>(
    list: &[T],
    target_id: &str,
    direction: Direction,
) -> Result<SwapPlan, MoveRejection> {
    let current = list
        .iter()
        .position(|r| r.id() == target_id)
        .ok_or(MoveRejection::NotFound)?;

    let adjacent = match direction {
        Direction::Up if current == 0 => return Err(MoveRejection::AtBoundary),
        Direction::Up => current - 1,
        Direction::Down if current + 1 == list.len() => return Err(MoveRejection::AtBoundary),
        Direction::Down => current + 1,
    };

    let target = &list[current];
    let neighbor = &list[adjacent];
    Ok(SwapPlan {
        target_id: target.id().to_string(),
        target_order: neighbor.display_order(),
        adjacent_id: neighbor.id().to_string(),
        adjacent_order: target.display_order(),
    })
}

/// `display_order` for a new record appended to `list`
pub fn next_display_order<T: Orderable>(list: &[T]) -> i32 {
    list.iter()
        .map(Orderable::display_order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Message shown when a move fails
fn reorder_failure_message(table: Table) -> &'static str {
    match table {
        Table::MenuItems => "Não foi possível reordenar os itens.",
        Table::MenuCategories => "Não foi possível reordenar as categorias.",
        Table::OperatingHours => "Não foi possível reordenar os horários.",
        _ => "Não foi possível reordenar os registros.",
    }
}

/// Failure of a move, as reported to the operator
fn reorder_error(table: Table, first_write_applied: bool) -> AppError {
    AppError::with_message(ErrorCode::ReorderFailed, reorder_failure_message(table))
        .with_detail("table", table.name())
        .with_detail("first_write_applied", first_write_applied)
}

/// Applies moves to the store
#[derive(Clone)]
pub struct Sequencer {
    store: Arc<dyn DataStore>,
    notifier: Arc<dyn Notifier>,
    strategy: ReorderStrategy,
}

impl Sequencer {
    pub fn new(store: Arc<dyn DataStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            strategy: ReorderStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ReorderStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> ReorderStrategy {
        self.strategy
    }

    /// Move `target_id` one position within `list`
    ///
    /// `list` must be the sorted view the operator sees. Not-found and
    /// boundary moves write nothing. Store failures are reported through the
    /// notifier exactly once and never returned as errors. The caller
    /// re-reads the list to observe the new order.
    #[instrument(skip(self, list), fields(strategy = %self.strategy))]
    pub async fn move_item<T: Orderable + Sync>(
        &self,
        table: Table,
        list: &[T],
        target_id: &str,
        direction: Direction,
    ) -> MoveOutcome {
        let plan = match plan_move(list, target_id, direction) {
            Ok(plan) => plan,
            Err(rejection) => {
                debug!(?rejection, "Move ignored");
                return rejection.into();
            }
        };

        let outcome = match self.strategy {
            ReorderStrategy::Sequential => self.write_sequential(table, &plan).await,
            ReorderStrategy::Atomic => self.write_atomic(table, &plan).await,
        };

        match outcome {
            Ok(()) => {
                debug!(
                    target_order = plan.target_order,
                    adjacent = %plan.adjacent_id,
                    "Display order swapped"
                );
                MoveOutcome::Swapped(plan)
            }
            Err(first_write_applied) => {
                let err = reorder_error(table, first_write_applied);
                error!(code = ?err.code, %table, first_write_applied, "{}", err.message);
                self.notifier.notify(Notification::error(err.message));
                MoveOutcome::WriteFailed {
                    first_write_applied,
                }
            }
        }
    }

    /// `Err(first_write_applied)` on failure
    async fn write_sequential(&self, table: Table, plan: &SwapPlan) -> Result<(), bool> {
        if let Err(e) = self
            .store
            .update(table, &plan.target_id, order_field(plan.target_order))
            .await
        {
            warn!(error = %e, id = %plan.target_id, "Reorder write failed");
            return Err(false);
        }

        if let Err(e) = self
            .store
            .update(table, &plan.adjacent_id, order_field(plan.adjacent_order))
            .await
        {
            // the target keeps its new value; both records now share it
            warn!(
                error = %e,
                id = %plan.adjacent_id,
                duplicate_order = plan.target_order,
                "Second reorder write failed, display_order left duplicated"
            );
            return Err(true);
        }
        Ok(())
    }

    async fn write_atomic(&self, table: Table, plan: &SwapPlan) -> Result<(), bool> {
        let updates = vec![
            (plan.target_id.clone(), order_field(plan.target_order)),
            (plan.adjacent_id.clone(), order_field(plan.adjacent_order)),
        ];
        self.store.update_many(table, updates).await.map_err(|e| {
            warn!(error = %e, "Atomic reorder failed");
            false
        })
    }
}

fn order_field(order: i32) -> Record {
    field("display_order", order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::{MemoryStore, Query, StoreError, StoreResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Debug, Clone)]
    struct Row {
        id: &'static str,
        order: i32,
    }

    impl Orderable for Row {
        fn id(&self) -> &str {
            self.id
        }
        fn display_order(&self) -> i32 {
            self.order
        }
    }

    fn rows(orders: &[(&'static str, i32)]) -> Vec<Row> {
        orders.iter().map(|&(id, order)| Row { id, order }).collect()
    }

    /// Counts updates and fails the ones aimed at `fail_id`
    struct ScriptedStore {
        inner: MemoryStore,
        fail_id: Option<&'static str>,
        writes: Mutex<Vec<(String, Record)>>,
    }

    impl ScriptedStore {
        async fn seeded(list: &[Row], fail_id: Option<&'static str>) -> Arc<Self> {
            let inner = MemoryStore::new();
            for row in list {
                let mut record = field("id", row.id);
                record.insert("display_order".into(), row.order.into());
                inner.insert(Table::MenuItems, record).await.unwrap();
            }
            Arc::new(Self {
                inner,
                fail_id,
                writes: Mutex::new(Vec::new()),
            })
        }

        async fn order_of(&self, id: &str) -> i64 {
            let rows = self
                .inner
                .select(&Query::by_id(Table::MenuItems, id))
                .await
                .unwrap();
            rows[0]["display_order"].as_i64().unwrap()
        }
    }

    #[async_trait]
    impl DataStore for ScriptedStore {
        async fn select(&self, query: &Query) -> StoreResult<Vec<Record>> {
            self.inner.select(query).await
        }
        async fn update(&self, table: Table, id: &str, fields: Record) -> StoreResult<()> {
            self.writes.lock().push((id.to_string(), fields.clone()));
            if self.fail_id == Some(id) {
                return Err(StoreError::Database("connection reset".into()));
            }
            self.inner.update(table, id, fields).await
        }
        async fn insert(&self, table: Table, fields: Record) -> StoreResult<Record> {
            self.inner.insert(table, fields).await
        }
        async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
            self.inner.delete(table, id).await
        }
    }

    fn sequencer(store: Arc<ScriptedStore>) -> (Sequencer, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (Sequencer::new(store, notifier.clone()), notifier)
    }

    #[test]
    fn test_plan_swaps_values_not_positions() {
        let list = rows(&[("a", 5), ("b", 10), ("c", 20)]);
        let plan = plan_move(&list, "b", Direction::Up).unwrap();
        assert_eq!(
            plan,
            SwapPlan {
                target_id: "b".into(),
                target_order: 5,
                adjacent_id: "a".into(),
                adjacent_order: 10,
            }
        );

        let plan = plan_move(&list, "b", Direction::Down).unwrap();
        assert_eq!(plan.target_order, 20);
        assert_eq!(plan.adjacent_id, "c");
        assert_eq!(plan.adjacent_order, 10);
    }

    #[test]
    fn test_plan_rejections() {
        let list = rows(&[("a", 1), ("b", 2)]);
        assert_eq!(plan_move(&list, "a", Direction::Up), Err(MoveRejection::AtBoundary));
        assert_eq!(plan_move(&list, "b", Direction::Down), Err(MoveRejection::AtBoundary));
        assert_eq!(plan_move(&list, "zz", Direction::Up), Err(MoveRejection::NotFound));

        let single = rows(&[("only", 0)]);
        assert_eq!(plan_move(&single, "only", Direction::Up), Err(MoveRejection::AtBoundary));
        assert_eq!(plan_move(&single, "only", Direction::Down), Err(MoveRejection::AtBoundary));

        let empty: Vec<Row> = Vec::new();
        assert_eq!(plan_move(&empty, "a", Direction::Down), Err(MoveRejection::NotFound));
    }

    #[test]
    fn test_plan_with_duplicate_orders() {
        // whichever two records sit next to each other are swapped
        let list = rows(&[("a", 3), ("b", 3), ("c", 4)]);
        let plan = plan_move(&list, "b", Direction::Up).unwrap();
        assert_eq!(plan.target_order, 3);
        assert_eq!(plan.adjacent_order, 3);
    }

    #[test]
    fn test_next_display_order() {
        assert_eq!(next_display_order::<Row>(&[]), 0);
        assert_eq!(next_display_order(&rows(&[("a", 4), ("b", 9), ("c", 2)])), 10);
    }

    #[test]
    fn test_missing_menu_item_order_counts_as_zero() {
        let item = MenuItem {
            id: "m".into(),
            name: "Pastel".into(),
            description: None,
            price: Default::default(),
            is_available: None,
            category_id: None,
            display_order: None,
        };
        assert_eq!(Orderable::display_order(&item), 0);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Atomic".parse::<ReorderStrategy>(), Ok(ReorderStrategy::Atomic));
        assert_eq!(" sequential ".parse::<ReorderStrategy>(), Ok(ReorderStrategy::Sequential));
        assert!("optimistic".parse::<ReorderStrategy>().is_err());
    }

    #[test]
    fn test_reorder_error() {
        let err = reorder_error(Table::MenuCategories, true);
        assert_eq!(err.code, ErrorCode::ReorderFailed);
        assert_eq!(err.message, "Não foi possível reordenar as categorias.");
        let details = err.details.unwrap();
        assert_eq!(details["table"], "menu_categories");
        assert_eq!(details["first_write_applied"], true);
    }

    #[tokio::test]
    async fn test_boundaries_write_nothing() {
        let list = rows(&[("a", 1), ("b", 2), ("c", 3)]);
        let store = ScriptedStore::seeded(&list, None).await;
        let (seq, notifier) = sequencer(store.clone());

        assert_eq!(seq.move_item(Table::MenuItems, &list, "a", Direction::Up).await, MoveOutcome::AtBoundary);
        assert_eq!(seq.move_item(Table::MenuItems, &list, "c", Direction::Down).await, MoveOutcome::AtBoundary);
        assert_eq!(seq.move_item(Table::MenuItems, &list, "x", Direction::Down).await, MoveOutcome::NotFound);

        assert!(store.writes.lock().is_empty());
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_writes_target_first() {
        let list = rows(&[("a", 5), ("b", 10), ("c", 20)]);
        let store = ScriptedStore::seeded(&list, None).await;
        let (seq, notifier) = sequencer(store.clone());

        let outcome = seq.move_item(Table::MenuItems, &list, "b", Direction::Up).await;
        assert!(outcome.is_swapped());

        let writes = store.writes.lock().clone();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, "b");
        assert_eq!(writes[1].0, "a");

        assert_eq!(store.order_of("a").await, 10);
        assert_eq!(store.order_of("b").await, 5);
        assert_eq!(store.order_of("c").await, 20);
        assert!(notifier.all().is_empty());
    }

    #[tokio::test]
    async fn test_second_write_failure_keeps_first() {
        let list = rows(&[("a", 5), ("b", 10)]);
        let store = ScriptedStore::seeded(&list, Some("a")).await;
        let (seq, notifier) = sequencer(store.clone());

        let outcome = seq.move_item(Table::MenuItems, &list, "b", Direction::Up).await;
        assert_eq!(outcome, MoveOutcome::WriteFailed { first_write_applied: true });

        // no rollback: both rows now carry 5
        assert_eq!(store.order_of("b").await, 5);
        assert_eq!(store.order_of("a").await, 5);

        let errors = notifier.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, "Não foi possível reordenar os itens.");
        // no retry
        assert_eq!(store.writes.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_first_write_failure_stops() {
        let list = rows(&[("a", 5), ("b", 10)]);
        let store = ScriptedStore::seeded(&list, Some("b")).await;
        let (seq, notifier) = sequencer(store.clone());

        let outcome = seq.move_item(Table::MenuItems, &list, "b", Direction::Up).await;
        assert_eq!(outcome, MoveOutcome::WriteFailed { first_write_applied: false });
        assert_eq!(store.writes.lock().len(), 1);
        assert_eq!(store.order_of("a").await, 5);
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_atomic_strategy_uses_update_many() {
        let list = rows(&[("a", 1), ("b", 2)]);
        let store = Arc::new(MemoryStore::new());
        for row in &list {
            let mut record = field("id", row.id);
            record.insert("display_order".into(), row.order.into());
            store.insert(Table::MenuCategories, record).await.unwrap();
        }
        let notifier = Arc::new(RecordingNotifier::new());
        let seq = Sequencer::new(store.clone(), notifier.clone())
            .with_strategy(ReorderStrategy::Atomic);

        let outcome = seq.move_item(Table::MenuCategories, &list, "a", Direction::Down).await;
        assert!(outcome.is_swapped());

        let sorted = store
            .select(&Query::table(Table::MenuCategories).order_asc("display_order"))
            .await
            .unwrap();
        let ids: Vec<_> = sorted.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
