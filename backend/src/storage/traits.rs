//! # Storage Traits
//!
//! This module defines the record store abstraction that the domain layer
//! talks to. The store is table oriented: rows are JSON objects, reads are
//! expressed as a [`Query`] (filter, ordering, limit) and writes are plain
//! inserts or keyed updates. No transaction spans two calls, so any rule that
//! must hold across a read and a write is expressed as a single conditional
//! update ([`RecordStore::update_if`]).
//!
//! Implementations:
//!
//! - **InMemoryRecordStore** - process-local tables, used by tests and demos
//! - **SqliteRecordStore** - SQLite through `sqlx`

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A single table row as returned by the store
pub type Row = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Players,
    Packages,
    PlayerPackages,
    Attendance,
    Expenses,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Players,
        Table::Packages,
        Table::PlayerPackages,
        Table::Attendance,
        Table::Expenses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Players => "players",
            Table::Packages => "packages",
            Table::PlayerPackages => "player_packages",
            Table::Attendance => "attendance",
            Table::Expenses => "expenses",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|table| table.as_str() == name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }
}

/// Failure of a store call. The message is meant to be shown to the user as is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store rejected the request: {0}")]
    Rejected(String),
    #[error("No row with id {id} in {table}")]
    NotFound { table: Table, id: String },
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    #[error("Unknown column {column} on {table}")]
    UnknownColumn { table: Table, column: String },
    #[error("Malformed row in {table}: {message}")]
    Decode { table: Table, message: String },
}

/// Row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
    /// Case-insensitive substring match
    Contains(String, String),
    /// `left < right`, both columns of the same row
    ColumnLt(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(column.to_string(), value.into())
    }

    pub fn lt(column: &str, value: impl Into<Value>) -> Self {
        Filter::Lt(column.to_string(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: &str, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(column.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Filter::Contains(column.to_string(), needle.to_string())
    }

    pub fn column_lt(left: &str, right: &str) -> Self {
        Filter::ColumnLt(left.to_string(), right.to_string())
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            filter => Filter::And(vec![filter, other]),
        }
    }

    /// Every column name this filter refers to
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Filter::All => Vec::new(),
            Filter::Eq(column, _)
            | Filter::Gte(column, _)
            | Filter::Lt(column, _)
            | Filter::In(column, _)
            | Filter::Contains(column, _) => vec![column.as_str()],
            Filter::ColumnLt(left, right) => vec![left.as_str(), right.as_str()],
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().flat_map(Filter::columns).collect()
            }
        }
    }

    /// Evaluate against a row. Comparisons involving a missing or null value
    /// are false, as in SQL; `Eq(column, Null)` tests for null.
    pub fn matches(&self, row: &Row) -> bool {
        let field = |column: &str| row.get(column).unwrap_or(&Value::Null);
        match self {
            Filter::All => true,
            Filter::Eq(column, Value::Null) => field(column).is_null(),
            Filter::Eq(column, value) => {
                compare_values(field(column), value) == Some(Ordering::Equal)
            }
            Filter::Gte(column, value) => matches!(
                compare_values(field(column), value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Filter::Lt(column, value) => {
                compare_values(field(column), value) == Some(Ordering::Less)
            }
            Filter::In(column, values) => values
                .iter()
                .any(|value| compare_values(field(column), value) == Some(Ordering::Equal)),
            Filter::Contains(column, needle) => match field(column) {
                Value::String(text) => text.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Filter::ColumnLt(left, right) => {
                compare_values(field(left), field(right)) == Some(Ordering::Less)
            }
            Filter::And(filters) => filters.iter().all(|filter| filter.matches(row)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(row)),
        }
    }
}

/// Compare two scalar values. `None` when either side is null or the kinds differ.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Sort key for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: true }
    }

    pub fn desc(column: &str) -> Self {
        Self { column: column.to_string(), ascending: false }
    }
}

/// A read against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order: Vec<Order>,
    pub limit: Option<u32>,
}

impl Default for Query {
    fn default() -> Self {
        Self { filter: Filter::All, order: Vec::new(), limit: None }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A single column change
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    Set(String, Value),
    /// Add to an integer column in place, without reading it first
    Increment(String, i64),
}

/// Column changes applied by a keyed update
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.ops.push(PatchOp::Set(column.to_string(), value.into()));
        self
    }

    pub fn increment(mut self, column: &str, by: i64) -> Self {
        self.ops.push(PatchOp::Increment(column.to_string(), by));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|op| match op {
            PatchOp::Set(column, _) | PatchOp::Increment(column, _) => column.as_str(),
        })
    }
}

/// Trait defining the interface for the record store
///
/// Every call is one request/response round trip. Implementations must make
/// each individual call atomic; nothing is promised across calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` matching the query, in the requested order
    async fn find(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>>;

    /// Insert rows and return them as stored, with generated ids and
    /// store-side defaults filled in. Either all rows are inserted or none.
    async fn insert(&self, table: Table, rows: Vec<Row>) -> StoreResult<Vec<Row>>;

    /// Apply `patch` to the row with the given id and return the updated row
    async fn update(&self, table: Table, id: &str, patch: &Patch) -> StoreResult<Row>;

    /// Apply `patch` only if the row currently satisfies `guard`, as one
    /// atomic step. Returns `Ok(None)` when the guard rejects the row and
    /// `StoreError::NotFound` when there is no such row.
    async fn update_if(
        &self,
        table: Table,
        id: &str,
        patch: &Patch,
        guard: &Filter,
    ) -> StoreResult<Option<Row>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
        assert_eq!(
            "coaches".parse::<Table>(),
            Err(StoreError::UnknownTable("coaches".to_string()))
        );
    }

    #[test]
    fn test_filter_matches_package_guard() {
        let open = row(json!({"sessions_used": 9, "sessions_total": 10}));
        let full = row(json!({"sessions_used": 10, "sessions_total": 10}));
        let guard = Filter::column_lt("sessions_used", "sessions_total");

        assert!(guard.matches(&open));
        assert!(!guard.matches(&full));
    }

    #[test]
    fn test_filter_contains_is_case_insensitive_and_skips_null() {
        let player = row(json!({"first_name": "Maya", "last_name": "Lopez", "phone": null}));
        let search = Filter::Or(vec![
            Filter::contains("first_name", "MAY"),
            Filter::contains("phone", "555"),
        ]);
        assert!(search.matches(&player));
        assert!(!Filter::contains("phone", "555").matches(&player));
    }

    #[test]
    fn test_filter_null_comparisons_are_false() {
        let expense = row(json!({"description": null, "amount_cents": 100}));
        assert!(Filter::eq("description", Value::Null).matches(&expense));
        assert!(!Filter::lt("description", "z").matches(&expense));
        assert!(!Filter::gte("missing", 0).matches(&expense));
    }

    #[test]
    fn test_filter_and_flattens() {
        let filter = Filter::All
            .and(Filter::eq("player_id", "p1"))
            .and(Filter::gte("date", "2024-01-01"));
        assert_eq!(
            filter,
            Filter::And(vec![
                Filter::eq("player_id", "p1"),
                Filter::gte("date", "2024-01-01"),
            ])
        );
        assert_eq!(filter.columns(), vec!["player_id", "date"]);
    }
}
