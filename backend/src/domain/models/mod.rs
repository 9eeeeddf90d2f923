pub mod attendance;
pub mod expense;
pub mod package;
pub mod player;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::storage::{Row, StoreError, StoreResult, Table};

/// Decode a store row into a typed model
pub(crate) fn from_row<T: DeserializeOwned>(table: Table, row: Row) -> StoreResult<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| StoreError::Decode { table, message: e.to_string() })
}

pub(crate) fn from_rows<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter().map(|row| from_row(table, row)).collect()
}

/// Turn a `json!({...})` literal into a row
pub(crate) fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}
