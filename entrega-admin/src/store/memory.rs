//! In-memory data store

use super::{
    DataStore, Query, Record, StoreError, StoreResult, Table, check_field_name, ensure_id,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process store with the same semantics as [`super::SqliteStore`]
///
/// Rows of a table are kept in insertion order, which is the tie-breaker
/// for sorting.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table
    pub fn len(&self, table: Table) -> usize {
        self.tables.read().get(&table).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> StoreResult<Vec<Record>> {
        query.validate()?;
        let tables = self.tables.read();
        let mut rows: Vec<Record> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        // stable sort keeps insertion order between equal keys
        rows.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, table: Table, id: &str, mut fields: Record) -> StoreResult<()> {
        fields.remove("id");
        fields.keys().try_for_each(|k| check_field_name(k))?;

        let mut tables = self.tables.write();
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| r.get("id").and_then(|v| v.as_str()) == Some(id)))
            .ok_or_else(|| StoreError::NotFound {
                table,
                id: id.to_string(),
            })?;
        row.extend(fields);
        Ok(())
    }

    async fn insert(&self, table: Table, mut fields: Record) -> StoreResult<Record> {
        let id = ensure_id(&mut fields)?;
        fields.keys().try_for_each(|k| check_field_name(k))?;

        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        if rows
            .iter()
            .any(|r| r.get("id").and_then(|v| v.as_str()) == Some(id.as_str()))
        {
            return Err(StoreError::Duplicate(format!("{table}/{id}")));
        }
        rows.push(fields.clone());
        Ok(fields)
    }

    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| r.get("id").and_then(|v| v.as_str()) != Some(id));
        if rows.len() == before {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// All updates are checked before any is applied
    async fn update_many(&self, table: Table, updates: Vec<(String, Record)>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let rows = tables.entry(table).or_default();

        let mut positions = Vec::with_capacity(updates.len());
        for (id, fields) in &updates {
            fields.keys().try_for_each(|k| check_field_name(k))?;
            let pos = rows
                .iter()
                .position(|r| r.get("id").and_then(|v| v.as_str()) == Some(id.as_str()))
                .ok_or_else(|| StoreError::NotFound {
                    table,
                    id: id.clone(),
                })?;
            positions.push(pos);
        }

        for (pos, (_, mut fields)) in positions.into_iter().zip(updates) {
            fields.remove("id");
            rows[pos].extend(fields);
        }
        Ok(())
    }
}
