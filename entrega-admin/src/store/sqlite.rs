//! SQLite data store
//!
//! Each collection is a table of `(id TEXT PRIMARY KEY, data TEXT)` where
//! `data` holds the JSON record. Filters and ordering go through
//! `json_extract`; `rowid` breaks ties so equal keys keep insertion order.

use super::{
    Condition, DataStore, Query, Record, SortDirection, StoreError, StoreResult, Table,
    check_field_name, ensure_id,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{Row, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Value bound to a statement parameter
#[derive(Debug, Clone)]
enum Bind {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Bind {
    /// JSON scalar as `json_extract` would return it
    fn scalar(value: &Value) -> Self {
        match value {
            Value::Null => Bind::Null,
            Value::Bool(b) => Bind::Int(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Bind::Int(i),
                None => Bind::Real(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => Bind::Text(s.clone()),
            other => Bind::Text(other.to_string()),
        }
    }

    fn apply<'q>(self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            Bind::Null => query.bind(None::<String>),
            Bind::Int(i) => query.bind(i),
            Bind::Real(f) => query.bind(f),
            Bind::Text(s) => query.bind(s),
        }
    }
}

fn path(field: &str) -> Bind {
    Bind::Text(format!("$.{field}"))
}

/// `LIKE` pattern matching `term` anywhere, with wildcards escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// WHERE / ORDER BY / LIMIT clauses with their parameters
struct Clauses {
    sql: String,
    binds: Vec<Bind>,
}

impl Clauses {
    fn for_query(query: &Query, with_sort: bool) -> StoreResult<Self> {
        query.validate()?;
        let mut predicates = Vec::new();
        let mut binds = Vec::new();

        for condition in &query.conditions {
            let predicate = match condition {
                Condition::Eq(field, Value::Null) => {
                    binds.push(path(field));
                    "json_extract(data, ?) IS NULL".to_string()
                }
                Condition::Neq(field, Value::Null) | Condition::NotNull(field) => {
                    binds.push(path(field));
                    "json_extract(data, ?) IS NOT NULL".to_string()
                }
                Condition::Eq(field, value) => {
                    binds.extend([path(field), Bind::scalar(value)]);
                    "json_extract(data, ?) = ?".to_string()
                }
                Condition::Neq(field, value) => {
                    binds.extend([path(field), Bind::scalar(value)]);
                    "json_extract(data, ?) != ?".to_string()
                }
                Condition::Gte(field, value) => {
                    binds.extend([path(field), Bind::scalar(value)]);
                    "json_extract(data, ?) >= ?".to_string()
                }
                Condition::Lte(field, value) => {
                    binds.extend([path(field), Bind::scalar(value)]);
                    "json_extract(data, ?) <= ?".to_string()
                }
                Condition::InList(_, values) if values.is_empty() => "0".to_string(),
                Condition::InList(field, values) => {
                    binds.push(path(field));
                    binds.extend(values.iter().map(Bind::scalar));
                    let marks = vec!["?"; values.len()].join(", ");
                    format!("json_extract(data, ?) IN ({marks})")
                }
                Condition::Search { fields, term } => {
                    let pattern = like_pattern(term);
                    let ors: Vec<_> = fields
                        .iter()
                        .map(|field| {
                            binds.extend([path(field), Bind::Text(pattern.clone())]);
                            "json_extract(data, ?) LIKE ? ESCAPE '\\'"
                        })
                        .collect();
                    format!("({})", ors.join(" OR "))
                }
            };
            predicates.push(predicate);
        }

        let mut sql = String::new();
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if with_sort {
            let mut keys: Vec<String> = Vec::new();
            for key in &query.sort {
                binds.push(path(&key.field));
                keys.push(match key.direction {
                    SortDirection::Asc => "json_extract(data, ?) ASC".into(),
                    SortDirection::Desc => "json_extract(data, ?) DESC".into(),
                });
            }
            keys.push("rowid ASC".into());
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));

            if let Some(limit) = query.limit {
                sql.push_str(" LIMIT ?");
                binds.push(Bind::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
            }
        }

        Ok(Self { sql, binds })
    }
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database and apply migrations
    ///
    /// `:memory:` opens a private in-memory database held by a single
    /// connection.
    pub async fn open(db_path: &str) -> StoreResult<Self> {
        let pool = if db_path == ":memory:" {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StoreError::Database(format!("Invalid database path: {e}")))?;
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .busy_timeout(std::time::Duration::from_secs(5));
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        tracing::info!(path = db_path, "Database connection established");
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, applying migrations
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> StoreResult<Record> {
        let id: String = row.try_get("id")?;
        let data: String = row.try_get("data")?;
        let mut record: Record = match serde_json::from_str(&data)? {
            Value::Object(map) => map,
            other => {
                return Err(StoreError::Serialization(format!(
                    "row {id} is not an object: {other}"
                )));
            }
        };
        record.insert("id".into(), Value::String(id));
        Ok(record)
    }

    /// `UPDATE ... SET data = json_set(data, path, json(value), ...)`
    fn update_statement(table: Table, fields: &Record) -> StoreResult<(String, Vec<Bind>)> {
        let mut args = Vec::with_capacity(fields.len());
        let mut binds = Vec::with_capacity(fields.len() * 2);
        for (name, value) in fields {
            check_field_name(name)?;
            args.push("?, json(?)");
            binds.push(path(name));
            binds.push(Bind::Text(serde_json::to_string(value)?));
        }
        let sql = format!(
            "UPDATE {} SET data = json_set(data, {}) WHERE id = ?",
            table.name(),
            args.join(", ")
        );
        Ok((sql, binds))
    }

    async fn exists(&self, table: Table, id: &str) -> StoreResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table.name());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl DataStore for SqliteStore {
    #[instrument(skip(self, query), fields(table = %query.table))]
    async fn select(&self, query: &Query) -> StoreResult<Vec<Record>> {
        let clauses = Clauses::for_query(query, true)?;
        let sql = format!("SELECT id, data FROM {}{}", query.table.name(), clauses.sql);

        let mut statement = sqlx::query(&sql);
        for bind in clauses.binds {
            statement = bind.apply(statement);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(Self::parse_row).collect()
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, table: Table, id: &str, mut fields: Record) -> StoreResult<()> {
        fields.remove("id");
        if fields.is_empty() {
            return if self.exists(table, id).await? {
                Ok(())
            } else {
                Err(StoreError::NotFound {
                    table,
                    id: id.to_string(),
                })
            };
        }

        let (sql, binds) = Self::update_statement(table, &fields)?;
        let mut statement = sqlx::query(&sql);
        for bind in binds {
            statement = bind.apply(statement);
        }
        let result = statement.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn insert(&self, table: Table, mut fields: Record) -> StoreResult<Record> {
        let id = ensure_id(&mut fields)?;
        fields.keys().try_for_each(|k| check_field_name(k))?;
        let data = serde_json::to_string(&fields)?;

        let sql = format!("INSERT INTO {} (id, data) VALUES (?, ?)", table.name());
        sqlx::query(&sql)
            .bind(&id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(fields)
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn count(&self, query: &Query) -> StoreResult<usize> {
        let clauses = Clauses::for_query(query, false)?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", query.table.name(), clauses.sql);

        let mut statement = sqlx::query(&sql);
        for bind in clauses.binds {
            statement = bind.apply(statement);
        }
        let count: i64 = statement.fetch_one(&self.pool).await?.try_get(0)?;
        let mut count = usize::try_from(count).unwrap_or(0);
        if let Some(limit) = query.limit {
            count = count.min(limit);
        }
        Ok(count)
    }

    /// One transaction: either every row is updated or none is
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    async fn update_many(&self, table: Table, updates: Vec<(String, Record)>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for (id, mut fields) in updates {
            fields.remove("id");
            if fields.is_empty() {
                continue;
            }
            let (sql, binds) = Self::update_statement(table, &fields)?;
            let mut statement = sqlx::query(&sql);
            for bind in binds {
                statement = bind.apply(statement);
            }
            let result = statement.bind(id.clone()).execute(&mut *tx).await?;
            if result.rows_affected() == 0 {
                // dropping the transaction rolls it back
                return Err(StoreError::NotFound { table, id });
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::field;
    use serde_json::json;

    async fn memory_store() -> SqliteStore {
        SqliteStore::open(":memory:").await.unwrap()
    }

    fn item(id: &str, name: &str, order: Value) -> Record {
        let mut r = field("id", id);
        r.insert("name".into(), json!(name));
        r.insert("display_order".into(), order);
        r
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[tokio::test]
    async fn test_insert_select_order() {
        let store = memory_store().await;
        store.insert(Table::MenuItems, item("a", "Pizza", json!(20))).await.unwrap();
        store.insert(Table::MenuItems, item("b", "Pastel", json!(5))).await.unwrap();
        store.insert(Table::MenuItems, item("c", "Suco", json!(null))).await.unwrap();
        store.insert(Table::MenuItems, item("d", "Açaí", json!(5))).await.unwrap();

        let rows = store
            .select(&Query::table(Table::MenuItems).order_asc("display_order"))
            .await
            .unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["c", "b", "d", "a"]);
    }

    #[tokio::test]
    async fn test_filters() {
        let store = memory_store().await;
        let mut r = item("a", "Pizza Calabresa", json!(1));
        r.insert("is_available".into(), json!(true));
        store.insert(Table::MenuItems, r).await.unwrap();
        let mut r = item("b", "Pizza Doce", json!(2));
        r.insert("is_available".into(), json!(false));
        store.insert(Table::MenuItems, r).await.unwrap();

        let available = store
            .select(&Query::table(Table::MenuItems).eq("is_available", true))
            .await
            .unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0]["id"], json!("a"));
        // booleans survive the round trip as JSON booleans
        assert_eq!(available[0]["is_available"], json!(true));

        let found = store
            .select(&Query::table(Table::MenuItems).search(&["name", "description"], "DOCE"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!("b"));

        let count = store
            .count(&Query::table(Table::MenuItems).gte("display_order", 1))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_update_replaces_fields() {
        let store = memory_store().await;
        let mut r = field("id", "c1");
        r.insert("name".into(), json!("Ana"));
        r.insert("address".into(), json!({ "Logradouro": "Rua A", "Bairro": "Centro" }));
        store.insert(Table::Customers, r).await.unwrap();

        let mut fields = field("address", json!([{ "endereco": "Rua B", "numero": "2" }]));
        fields.insert("price".into(), json!(12.5));
        store.update(Table::Customers, "c1", fields).await.unwrap();

        let row = &store.select(&Query::by_id(Table::Customers, "c1")).await.unwrap()[0];
        assert_eq!(row["name"], json!("Ana"));
        assert_eq!(row["address"], json!([{ "endereco": "Rua B", "numero": "2" }]));
        assert_eq!(row["price"], json!(12.5));
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found() {
        let store = memory_store().await;
        let err = store
            .update(Table::MenuItems, "ghost", field("display_order", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.delete(Table::MenuItems, "ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_update_many_rolls_back() {
        let store = memory_store().await;
        store.insert(Table::MenuItems, item("a", "A", json!(1))).await.unwrap();

        let result = store
            .update_many(
                Table::MenuItems,
                vec![
                    ("a".into(), field("display_order", 9)),
                    ("ghost".into(), field("display_order", 1)),
                ],
            )
            .await;
        assert!(result.is_err());

        let row = &store.select(&Query::by_id(Table::MenuItems, "a")).await.unwrap()[0];
        assert_eq!(row["display_order"], json!(1));
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entrega.db");
        let path = path.to_str().unwrap();

        {
            let store = SqliteStore::open(path).await.unwrap();
            store
                .insert(Table::Neighborhoods, field("name", "Centro"))
                .await
                .unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::open(path).await.unwrap();
        let count = store.count(&Query::table(Table::Neighborhoods)).await.unwrap();
        assert_eq!(count, 1);
    }
}
