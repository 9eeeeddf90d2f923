//! # In-Memory Record Store
//!
//! Process-local implementation of [`RecordStore`]. Tables live behind one
//! `RwLock`, so every call (including the guarded update) is atomic with
//! respect to every other call. Used by the domain tests and by
//! `database_url = "memory"` for throwaway demos.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::schema;
use super::traits::{
    compare_values, Filter, Order, Patch, PatchOp, Query, RecordStore, Row, StoreError,
    StoreResult, Table,
};
use crate::clock::{Clock, SystemClock};

pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose insert defaults (`created_at`, `date`, ...) come from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { tables: RwLock::new(HashMap::new()), clock }
    }

    /// Number of rows currently in `table`
    pub async fn count(&self, table: Table) -> usize {
        self.tables.read().await.get(&table).map_or(0, Vec::len)
    }
}

fn sort_rows(rows: &mut [Row], order: &[Order]) {
    if order.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in order {
            let left = a.get(&key.column).unwrap_or(&Value::Null);
            let right = b.get(&key.column).unwrap_or(&Value::Null);
            // nulls sort first ascending, last descending
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
            };
            let ordering = if key.ascending { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn apply_patch(table: Table, row: &mut Row, patch: &Patch) -> StoreResult<()> {
    // Work on a copy so a failing op leaves the stored row untouched
    let mut updated = row.clone();
    for op in &patch.ops {
        match op {
            PatchOp::Set(column, value) => {
                updated.insert(column.clone(), value.clone());
            }
            PatchOp::Increment(column, by) => {
                let current = updated
                    .get(column)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| StoreError::Decode {
                        table,
                        message: format!("{} is not an integer", column),
                    })?;
                updated.insert(column.clone(), Value::from(current + by));
            }
        }
    }
    schema::check_constraints(table, &updated)?;
    *row = updated;
    Ok(())
}

fn row_id(row: &Row) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
        schema::validate_query(table, query)?;

        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(&table)
            .map(|rows| rows.iter().filter(|row| query.filter.matches(row)).cloned().collect())
            .unwrap_or_default();
        drop(tables);

        sort_rows(&mut rows, &query.order);
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        debug!("find {}: {} rows", table, rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        let now = self.clock.now();
        let prepared = rows
            .into_iter()
            .map(|row| schema::prepare_insert(table, row, now))
            .collect::<StoreResult<Vec<Row>>>()?;

        let mut tables = self.tables.write().await;
        let stored = tables.entry(table).or_default();
        for row in &prepared {
            if stored.iter().any(|existing| row_id(existing) == row_id(row)) {
                return Err(StoreError::Rejected(format!(
                    "Duplicate id {} in {}",
                    row_id(row).unwrap_or_default(),
                    table
                )));
            }
        }
        stored.extend(prepared.iter().cloned());
        debug!("insert {}: {} rows", table, prepared.len());
        Ok(prepared)
    }

    async fn update(&self, table: Table, id: &str, patch: &Patch) -> StoreResult<Row> {
        self.update_if(table, id, patch, &Filter::All)
            .await?
            .ok_or_else(|| StoreError::NotFound { table, id: id.to_string() })
    }

    async fn update_if(
        &self,
        table: Table,
        id: &str,
        patch: &Patch,
        guard: &Filter,
    ) -> StoreResult<Option<Row>> {
        schema::validate_patch(table, patch)?;
        schema::validate_filter(table, guard)?;

        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| StoreError::NotFound { table, id: id.to_string() })?;

        if !guard.matches(row) {
            debug!("update {} {}: guard rejected", table, id);
            return Ok(None);
        }
        apply_patch(table, row, patch)?;
        Ok(Some(row.clone()))
    }
}
