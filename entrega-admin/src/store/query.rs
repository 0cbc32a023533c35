//! Query builder
//!
//! Filters follow SQL semantics so that both backends agree: a missing or
//! null field never satisfies a comparison, booleans compare as 1 / 0 and
//! values order as null < numbers < text.

use super::{Record, StoreResult, Table, check_field_name};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// One filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field = value` (`IS NULL` when value is null)
    Eq(String, Value),
    /// `field != value` (`IS NOT NULL` when value is null)
    Neq(String, Value),
    NotNull(String),
    Gte(String, Value),
    Lte(String, Value),
    InList(String, Vec<Value>),
    /// Case-insensitive substring match on any of the fields
    Search { fields: Vec<String>, term: String },
}

/// Select query over one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl Query {
    /// All records of a table, in insertion order
    pub fn table(table: Table) -> Self {
        Self {
            table,
            conditions: Vec::new(),
            sort: Vec::new(),
            limit: None,
        }
    }

    pub fn by_id(table: Table, id: &str) -> Self {
        Self::table(table).eq("id", id).limit(1)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn neq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Neq(field.to_string(), value.into()));
        self
    }

    pub fn not_null(mut self, field: &str) -> Self {
        self.conditions.push(Condition::NotNull(field.to_string()));
        self
    }

    pub fn gte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Gte(field.to_string(), value.into()));
        self
    }

    pub fn lte(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Lte(field.to_string(), value.into()));
        self
    }

    pub fn in_list(mut self, field: &str, values: Vec<Value>) -> Self {
        self.conditions
            .push(Condition::InList(field.to_string(), values));
        self
    }

    /// Blank terms are ignored
    pub fn search(mut self, fields: &[&str], term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() && !fields.is_empty() {
            self.conditions.push(Condition::Search {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn order_asc(self, field: &str) -> Self {
        self.order_by(field, SortDirection::Asc)
    }

    pub fn order_desc(self, field: &str) -> Self {
        self.order_by(field, SortDirection::Desc)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Every field name this query touches
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        let filtered = self.conditions.iter().flat_map(|c| match c {
            Condition::Eq(f, _)
            | Condition::Neq(f, _)
            | Condition::NotNull(f)
            | Condition::Gte(f, _)
            | Condition::Lte(f, _)
            | Condition::InList(f, _) => vec![f.as_str()],
            Condition::Search { fields, .. } => fields.iter().map(String::as_str).collect(),
        });
        filtered.chain(self.sort.iter().map(|k| k.field.as_str()))
    }

    pub fn validate(&self) -> StoreResult<()> {
        self.fields().try_for_each(check_field_name)
    }

    /// In-process evaluation of the filter
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// In-process ordering; equal keys keep their relative order
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        for key in &self.sort {
            let left = Scalar::of(a.get(&key.field));
            let right = Scalar::of(b.get(&key.field));
            let ord = match key.direction {
                SortDirection::Asc => left.cmp(&right),
                SortDirection::Desc => right.cmp(&left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl Condition {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(field, Value::Null) => Scalar::of(record.get(field)).is_null(),
            Condition::Neq(field, Value::Null) | Condition::NotNull(field) => {
                !Scalar::of(record.get(field)).is_null()
            }
            Condition::Eq(field, value) => {
                compare_present(record, field, value) == Some(Ordering::Equal)
            }
            Condition::Neq(field, value) => matches!(
                compare_present(record, field, value),
                Some(Ordering::Less | Ordering::Greater)
            ),
            Condition::Gte(field, value) => matches!(
                compare_present(record, field, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lte(field, value) => matches!(
                compare_present(record, field, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Condition::InList(field, values) => values
                .iter()
                .any(|v| compare_present(record, field, v) == Some(Ordering::Equal)),
            Condition::Search { fields, term } => {
                let needle = term.to_ascii_lowercase();
                fields.iter().any(|field| {
                    Scalar::of(record.get(field))
                        .as_text()
                        .is_some_and(|text| text.to_ascii_lowercase().contains(&needle))
                })
            }
        }
    }
}

/// `None` when either side is null, mirroring SQL three-valued logic
fn compare_present(record: &Record, field: &str, value: &Value) -> Option<Ordering> {
    let left = Scalar::of(record.get(field));
    let right = Scalar::of(Some(value));
    if left.is_null() || right.is_null() {
        None
    } else {
        Some(left.cmp(&right))
    }
}

/// A JSON value as SQLite's `json_extract` sees it
#[derive(Debug, Clone)]
pub(crate) enum Scalar {
    Null,
    Num(f64),
    Text(String),
}

impl Scalar {
    pub(crate) fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Scalar::Null,
            Some(Value::Bool(b)) => Scalar::Num(if *b { 1.0 } else { 0.0 }),
            Some(Value::Number(n)) => Scalar::Num(n.as_f64().unwrap_or(0.0)),
            Some(Value::String(s)) => Scalar::Text(s.clone()),
            Some(other) => Scalar::Text(other.to_string()),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    fn rank(&self) -> u8 {
        match self {
            Scalar::Null => 0,
            Scalar::Num(_) => 1,
            Scalar::Text(_) => 2,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Num(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Scalar::Num(n) => Some(n.to_string()),
            Scalar::Text(s) => Some(s.clone()),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Scalar::Num(a), Scalar::Num(b)) => a.total_cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_null_never_compares() {
        let r = record(json!({ "status": null }));
        assert!(!Condition::Eq("status".into(), json!("pending")).matches(&r));
        assert!(!Condition::Neq("status".into(), json!("pending")).matches(&r));
        assert!(!Condition::Gte("missing".into(), json!(0)).matches(&r));
        assert!(Condition::Eq("status".into(), Value::Null).matches(&r));
        assert!(!Condition::NotNull("status".into()).matches(&r));
    }

    #[test]
    fn test_bool_compares_as_number() {
        let r = record(json!({ "is_open": true }));
        assert!(Condition::Eq("is_open".into(), json!(true)).matches(&r));
        assert!(Condition::Eq("is_open".into(), json!(1)).matches(&r));
        assert!(!Condition::Eq("is_open".into(), json!(false)).matches(&r));
    }

    #[test]
    fn test_date_window_on_text() {
        let r = record(json!({ "created_at": "2024-03-07T18:30:00.000Z" }));
        let q = Query::table(Table::Orders)
            .gte("created_at", "2024-03-07T00:00:00")
            .lte("created_at", "2024-03-07T23:59:59");
        assert!(q.matches(&r));

        let q = Query::table(Table::Orders).gte("created_at", "2024-03-08T00:00:00");
        assert!(!q.matches(&r));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let r = record(json!({ "name": "Pizza Calabresa", "description": null }));
        let q = Query::table(Table::MenuItems).search(&["name", "description"], "CALAB");
        assert!(q.matches(&r));
        let q = Query::table(Table::MenuItems).search(&["description"], "calab");
        assert!(!q.matches(&r));
        // blank terms add no condition
        assert!(Query::table(Table::MenuItems).search(&["name"], "  ").conditions.is_empty());
    }

    #[test]
    fn test_in_list() {
        let r = record(json!({ "status": "confirmed" }));
        let q = Query::table(Table::Orders).in_list("status", vec![json!("pending"), json!("confirmed")]);
        assert!(q.matches(&r));
        let q = Query::table(Table::Orders).in_list("status", vec![]);
        assert!(!q.matches(&r));
    }

    #[test]
    fn test_compare_null_number_text() {
        let q = Query::table(Table::MenuItems).order_asc("display_order");
        let none = record(json!({}));
        let two = record(json!({ "display_order": 2 }));
        let ten = record(json!({ "display_order": 10.0 }));
        let text = record(json!({ "display_order": "1" }));
        assert_eq!(q.compare(&none, &two), Ordering::Less);
        assert_eq!(q.compare(&two, &ten), Ordering::Less);
        assert_eq!(q.compare(&ten, &text), Ordering::Less);

        let q = Query::table(Table::MenuItems).order_desc("display_order");
        assert_eq!(q.compare(&two, &ten), Ordering::Greater);
    }

    #[test]
    fn test_validate_rejects_paths() {
        assert!(Query::table(Table::Customers).eq("name", "x").validate().is_ok());
        assert!(Query::table(Table::Customers).order_asc("a.b").validate().is_err());
    }
}
