//! Shared helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use entrega_admin::store::{DataStore, Query, Record, StoreError, StoreResult, Table};
use entrega_admin::{AdminContext, MemoryStore, RecordingNotifier, SqliteStore};
use rust_decimal::Decimal;
use shared::models::MenuItemCreate;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store wrapper that refuses every update after the first `allowed`
pub struct FailingStore {
    inner: Arc<dyn DataStore>,
    allowed: usize,
    updates: AtomicUsize,
}

impl FailingStore {
    pub fn failing_after(inner: Arc<dyn DataStore>, allowed: usize) -> Self {
        Self {
            inner,
            allowed,
            updates: AtomicUsize::new(0),
        }
    }

    /// Updates attempted so far, refused ones included
    pub fn attempted(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataStore for FailingStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Record>> {
        self.inner.select(query).await
    }

    async fn update(&self, table: Table, id: &str, fields: Record) -> StoreResult<()> {
        let seen = self.updates.fetch_add(1, Ordering::SeqCst);
        if seen >= self.allowed {
            return Err(StoreError::Rejected(format!("injected fault on {table}/{id}")));
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

/// Both backends, so every property runs against each
pub async fn backends() -> Vec<(&'static str, Arc<dyn DataStore>)> {
    let sqlite = SqliteStore::open(":memory:").await.unwrap();
    vec![
        ("memory", Arc::new(MemoryStore::new()) as Arc<dyn DataStore>),
        ("sqlite", Arc::new(sqlite) as Arc<dyn DataStore>),
    ]
}

pub fn context(store: Arc<dyn DataStore>) -> (AdminContext, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (AdminContext::new(store, notifier.clone()), notifier)
}

pub fn menu_item(name: &str, display_order: i32) -> MenuItemCreate {
    MenuItemCreate {
        name: name.to_string(),
        description: None,
        price: Decimal::new(2500, 2),
        is_available: true,
        category_id: None,
        display_order: Some(display_order),
    }
}
