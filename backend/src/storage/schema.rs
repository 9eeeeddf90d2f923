//! Column layout of every table, plus the defaults a store fills in on insert.
//!
//! Both store implementations validate names against this module before they
//! touch data, so table and column names never reach SQL unchecked.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::traits::{Filter, Patch, PatchOp, Query, Row, StoreError, StoreResult, Table};
use crate::clock::{format_date, format_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn text(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Text, nullable: false }
}

const fn optional_text(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Text, nullable: true }
}

const fn integer(name: &'static str) -> Column {
    Column { name, kind: ColumnKind::Integer, nullable: false }
}

const PLAYERS: &[Column] = &[
    text("id"),
    text("first_name"),
    text("last_name"),
    optional_text("phone"),
    optional_text("notes"),
    text("created_at"),
];

const PACKAGES: &[Column] = &[
    text("id"),
    text("name"),
    integer("sessions_included"),
    integer("price_cents"),
];

const PLAYER_PACKAGES: &[Column] = &[
    text("id"),
    text("player_id"),
    optional_text("package_id"),
    integer("sessions_total"),
    integer("sessions_used"),
    integer("price_cents"),
    text("purchased_at"),
];

const ATTENDANCE: &[Column] = &[
    text("id"),
    text("player_id"),
    text("date"),
    text("created_at"),
];

const EXPENSES: &[Column] = &[
    text("id"),
    text("date"),
    text("category"),
    optional_text("description"),
    integer("amount_cents"),
    text("created_at"),
];

pub fn columns(table: Table) -> &'static [Column] {
    match table {
        Table::Players => PLAYERS,
        Table::Packages => PACKAGES,
        Table::PlayerPackages => PLAYER_PACKAGES,
        Table::Attendance => ATTENDANCE,
        Table::Expenses => EXPENSES,
    }
}

pub fn column(table: Table, name: &str) -> StoreResult<&'static Column> {
    columns(table)
        .iter()
        .find(|column| column.name == name)
        .ok_or_else(|| StoreError::UnknownColumn { table, column: name.to_string() })
}

/// Comma separated column list for SELECT / RETURNING clauses
pub fn select_list(table: Table) -> String {
    columns(table)
        .iter()
        .map(|column| column.name)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate_query(table: Table, query: &Query) -> StoreResult<()> {
    validate_filter(table, &query.filter)?;
    for order in &query.order {
        column(table, &order.column)?;
    }
    Ok(())
}

pub fn validate_filter(table: Table, filter: &Filter) -> StoreResult<()> {
    for name in filter.columns() {
        column(table, name)?;
    }
    Ok(())
}

pub fn validate_patch(table: Table, patch: &Patch) -> StoreResult<()> {
    if patch.is_empty() {
        return Err(StoreError::Rejected("Update contains no changes".to_string()));
    }
    for op in &patch.ops {
        match op {
            PatchOp::Set(name, value) => {
                if name == "id" {
                    return Err(StoreError::Rejected("Row ids cannot be changed".to_string()));
                }
                check_value(table, column(table, name)?, value)?;
            }
            PatchOp::Increment(name, _) => {
                if column(table, name)?.kind != ColumnKind::Integer {
                    return Err(StoreError::Rejected(format!(
                        "Cannot increment non-integer column {}.{}",
                        table, name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Validate an incoming row and fill in store-side defaults.
///
/// Defaults: `id`, `created_at`, `attendance.date`, `expenses.date`,
/// `player_packages.purchased_at` and `player_packages.sessions_used`.
pub fn prepare_insert(table: Table, mut row: Row, now: DateTime<Utc>) -> StoreResult<Row> {
    for name in row.keys() {
        column(table, name)?;
    }

    let mut default = |name: &str, value: Value| {
        if row.get(name).map_or(true, Value::is_null) && column(table, name).is_ok() {
            row.insert(name.to_string(), value);
        }
    };
    default("id", Value::String(Uuid::new_v4().to_string()));
    default("created_at", Value::String(format_timestamp(now)));
    match table {
        Table::Attendance | Table::Expenses => {
            default("date", Value::String(format_date(now.date_naive())));
        }
        Table::PlayerPackages => {
            default("purchased_at", Value::String(format_timestamp(now)));
            default("sessions_used", Value::from(0));
        }
        Table::Players | Table::Packages => {}
    }

    for column in columns(table) {
        match row.get(column.name) {
            Some(value) => check_value(table, column, value)?,
            None if column.nullable => {
                row.insert(column.name.to_string(), Value::Null);
            }
            None => {
                return Err(StoreError::Rejected(format!(
                    "Missing required column {}.{}",
                    table, column.name
                )))
            }
        }
    }

    check_constraints(table, &row)?;
    Ok(row)
}

/// Row-level CHECK constraints, the same ones the SQLite schema declares
pub fn check_constraints(table: Table, row: &Row) -> StoreResult<()> {
    let integer = |name: &str| row.get(name).and_then(Value::as_i64);
    let ok = match table {
        Table::Packages => {
            integer("sessions_included").map_or(true, |n| n > 0)
                && integer("price_cents").map_or(true, |n| n >= 0)
        }
        Table::PlayerPackages => match (integer("sessions_used"), integer("sessions_total")) {
            (Some(used), Some(total)) => used >= 0 && used <= total,
            _ => true,
        },
        Table::Players | Table::Attendance | Table::Expenses => true,
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!("CHECK constraint failed: {}", table)))
    }
}

fn check_value(table: Table, column: &Column, value: &Value) -> StoreResult<()> {
    let ok = match (value, column.kind) {
        (Value::Null, _) => column.nullable,
        (Value::String(_), ColumnKind::Text) => true,
        (Value::Number(number), ColumnKind::Integer) => number.is_i64(),
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(StoreError::Rejected(format!(
            "Invalid value for {}.{}: {}",
            table, column.name, value
        )))
    }
}
