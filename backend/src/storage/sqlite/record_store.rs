//! SQLite implementation of [`RecordStore`].
//!
//! Queries are assembled with `sqlx::QueryBuilder`; every value is bound, and
//! table/column names come from the schema module after validation. Guarded
//! updates are a single `UPDATE ... WHERE id = ? AND (guard) RETURNING ...`
//! statement, which SQLite executes atomically.
//!
//! SQLite's `lower()` and `LIKE` only fold ASCII, so substring filters are
//! evaluated in Rust with [`Filter::matches`]: the SQL side treats them as
//! true and the fetched rows are narrowed (and then limited) afterwards.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row as _, Sqlite};

use super::connection::DbConnection;
use crate::clock::{Clock, SystemClock};
use crate::storage::schema::{self, ColumnKind};
use crate::storage::traits::{
    Filter, Patch, PatchOp, Query, RecordStore, Row, StoreError, StoreResult, Table,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct SqliteRecordStore {
    db: DbConnection,
    clock: Arc<dyn Clock>,
}

impl SqliteRecordStore {
    pub fn new(db: DbConnection) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: DbConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }
}

/// Translate a driver error into the store's error vocabulary
pub fn map_sqlx_error(error: sqlx::Error) -> StoreError {
    match error {
        sqlx::Error::Database(db_error) => StoreError::Rejected(db_error.message().to_string()),
        sqlx::Error::RowNotFound => StoreError::Rejected("Row not found".to_string()),
        other => StoreError::Unavailable(other.to_string()),
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) -> StoreResult<()> {
    match value {
        Value::Null => {
            builder.push("NULL");
        }
        Value::Bool(flag) => {
            builder.push_bind(*flag);
        }
        Value::Number(number) => match number.as_i64() {
            Some(integer) => {
                builder.push_bind(integer);
            }
            None => {
                builder.push_bind(number.as_f64().unwrap_or_default());
            }
        },
        Value::String(text) => {
            builder.push_bind(text.clone());
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::Rejected(
                "Nested values cannot be stored in a column".to_string(),
            ))
        }
    }
    Ok(())
}

/// True when the filter has a substring match anywhere in it
fn has_text_match(filter: &Filter) -> bool {
    match filter {
        Filter::Contains(..) => true,
        Filter::And(filters) | Filter::Or(filters) => filters.iter().any(has_text_match),
        _ => false,
    }
}

fn push_filter(
    builder: &mut QueryBuilder<'_, Sqlite>,
    table: Table,
    filter: &Filter,
) -> StoreResult<()> {
    match filter {
        Filter::All => {
            builder.push("1 = 1");
        }
        Filter::Eq(column, Value::Null) => {
            builder.push(schema::column(table, column)?.name).push(" IS NULL");
        }
        Filter::Eq(column, value) => {
            builder.push(schema::column(table, column)?.name).push(" = ");
            push_value(builder, value)?;
        }
        Filter::Gte(column, value) => {
            builder.push(schema::column(table, column)?.name).push(" >= ");
            push_value(builder, value)?;
        }
        Filter::Lt(column, value) => {
            builder.push(schema::column(table, column)?.name).push(" < ");
            push_value(builder, value)?;
        }
        Filter::In(column, values) => {
            let name = schema::column(table, column)?.name;
            if values.is_empty() {
                builder.push("0 = 1");
            } else {
                builder.push(name).push(" IN (");
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        builder.push(", ");
                    }
                    push_value(builder, value)?;
                }
                builder.push(")");
            }
        }
        // Matched in Rust after the fetch; no other filter is negated, so
        // relaxing this one only widens the SQL result
        Filter::Contains(column, _) => {
            schema::column(table, column)?;
            builder.push("1 = 1");
        }
        Filter::ColumnLt(left, right) => {
            builder
                .push(schema::column(table, left)?.name)
                .push(" < ")
                .push(schema::column(table, right)?.name);
        }
        Filter::And(filters) | Filter::Or(filters) => {
            let joiner = if matches!(filter, Filter::And(_)) { " AND " } else { " OR " };
            if filters.is_empty() {
                builder.push(if matches!(filter, Filter::And(_)) { "1 = 1" } else { "0 = 1" });
                return Ok(());
            }
            builder.push("(");
            for (index, inner) in filters.iter().enumerate() {
                if index > 0 {
                    builder.push(joiner);
                }
                push_filter(builder, table, inner)?;
            }
            builder.push(")");
        }
    }
    Ok(())
}

fn push_patch(builder: &mut QueryBuilder<'_, Sqlite>, table: Table, patch: &Patch) -> StoreResult<()> {
    for (index, op) in patch.ops.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        match op {
            PatchOp::Set(column, value) => {
                builder.push(schema::column(table, column)?.name).push(" = ");
                push_value(builder, value)?;
            }
            PatchOp::Increment(column, by) => {
                let name = schema::column(table, column)?.name;
                builder.push(name).push(" = ").push(name).push(" + ").push_bind(*by);
            }
        }
    }
    Ok(())
}

fn decode_row(table: Table, row: &SqliteRow) -> StoreResult<Row> {
    let decode_error = |error: sqlx::Error| StoreError::Decode { table, message: error.to_string() };

    let mut decoded = Row::new();
    for column in schema::columns(table) {
        let value = match column.kind {
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(column.name)
                .map_err(decode_error)?
                .map_or(Value::Null, Value::String),
            ColumnKind::Integer => row
                .try_get::<Option<i64>, _>(column.name)
                .map_err(decode_error)?
                .map_or(Value::Null, Value::from),
        };
        decoded.insert(column.name.to_string(), value);
    }
    Ok(decoded)
}

impl SqliteRecordStore {
    /// Guarded update whose guard SQLite cannot evaluate: read, check and
    /// write inside one transaction
    async fn update_if_matching(
        &self,
        table: Table,
        id: &str,
        patch: &Patch,
        guard: &Filter,
    ) -> StoreResult<Option<Row>> {
        let mut tx = self.db.pool().begin().await.map_err(map_sqlx_error)?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT ");
        select
            .push(schema::select_list(table))
            .push(" FROM ")
            .push(table.as_str())
            .push(" WHERE id = ")
            .push_bind(id.to_string());
        let current = select
            .build()
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or_else(|| StoreError::NotFound { table, id: id.to_string() })?;

        if !guard.matches(&decode_row(table, &current)?) {
            debug!("update {} {}: guard rejected", table, id);
            return Ok(None);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
        builder.push(table.as_str()).push(" SET ");
        push_patch(&mut builder, table, patch)?;
        builder
            .push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" RETURNING ")
            .push(schema::select_list(table));
        let updated = builder
            .build()
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(Some(decode_row(table, &updated)?))
    }

    async fn exists(&self, table: Table, id: &str) -> StoreResult<bool> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT 1 FROM ");
        builder.push(table.as_str()).push(" WHERE id = ").push_bind(id.to_string());
        let found = builder
            .build()
            .fetch_optional(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
        schema::validate_query(table, query)?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        builder.push(schema::select_list(table)).push(" FROM ").push(table.as_str());

        if query.filter != Filter::All {
            builder.push(" WHERE ");
            push_filter(&mut builder, table, &query.filter)?;
        }

        for (index, order) in query.order.iter().enumerate() {
            builder.push(if index == 0 { " ORDER BY " } else { ", " });
            builder
                .push(schema::column(table, &order.column)?.name)
                .push(if order.ascending { " ASC" } else { " DESC" });
        }

        let text_match = has_text_match(&query.filter);
        if let Some(limit) = query.limit.filter(|_| !text_match) {
            builder.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = builder
            .build()
            .fetch_all(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut decoded = rows
            .iter()
            .map(|row| decode_row(table, row))
            .collect::<StoreResult<Vec<Row>>>()?;
        if text_match {
            decoded.retain(|row| query.filter.matches(row));
            if let Some(limit) = query.limit {
                decoded.truncate(limit as usize);
            }
        }
        debug!("find {}: {} rows", table, decoded.len());
        Ok(decoded)
    }

    async fn insert(&self, table: Table, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
        let now = self.clock.now();
        let prepared = rows
            .into_iter()
            .map(|row| schema::prepare_insert(table, row, now))
            .collect::<StoreResult<Vec<Row>>>()?;

        let mut tx = self.db.pool().begin().await.map_err(map_sqlx_error)?;
        let mut inserted = Vec::with_capacity(prepared.len());

        for row in &prepared {
            let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO ");
            builder.push(table.as_str()).push(" (");
            for (index, column) in schema::columns(table).iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                builder.push(column.name);
            }
            builder.push(") VALUES (");
            for (index, column) in schema::columns(table).iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_value(&mut builder, row.get(column.name).unwrap_or(&Value::Null))?;
            }
            builder.push(") RETURNING ").push(schema::select_list(table));

            let stored = builder
                .build()
                .fetch_one(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            inserted.push(decode_row(table, &stored)?);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!("insert {}: {} rows", table, inserted.len());
        Ok(inserted)
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
        if has_text_match(guard) {
            return self.update_if_matching(table, id, patch, guard).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
        builder.push(table.as_str()).push(" SET ");
        push_patch(&mut builder, table, patch)?;
        builder.push(" WHERE id = ").push_bind(id.to_string());
        if *guard != Filter::All {
            builder.push(" AND (");
            push_filter(&mut builder, table, guard)?;
            builder.push(")");
        }
        builder.push(" RETURNING ").push(schema::select_list(table));

        let updated = builder
            .build()
            .fetch_optional(self.db.pool())
            .await
            .map_err(map_sqlx_error)?;

        match updated {
            Some(row) => Ok(Some(decode_row(table, &row)?)),
            None if self.exists(table, id).await? => {
                debug!("update {} {}: guard rejected", table, id);
                Ok(None)
            }
            None => Err(StoreError::NotFound { table, id: id.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::traits::Order;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn setup_test() -> SqliteRecordStore {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        SqliteRecordStore::with_clock(db, Arc::new(ManualClock::on_date(2024, 2, 1)))
    }

    async fn insert_player(store: &SqliteRecordStore, first: &str, last: &str, phone: Option<&str>) -> String {
        let inserted = store
            .insert(
                Table::Players,
                vec![row(json!({"first_name": first, "last_name": last, "phone": phone}))],
            )
            .await
            .unwrap();
        inserted[0]["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_has_text_match_looks_inside_groups() {
        assert!(!has_text_match(&Filter::eq("id", "a")));
        assert!(has_text_match(&Filter::Or(vec![
            Filter::eq("id", "a"),
            Filter::contains("first_name", "b"),
        ])));
    }

    #[tokio::test]
    async fn test_insert_returns_defaults() {
        let store = setup_test().await;
        let player_id = insert_player(&store, "Maya", "Lopez", None).await;

        let inserted = store
            .insert(Table::Attendance, vec![row(json!({"player_id": player_id}))])
            .await
            .unwrap();

        assert_eq!(inserted[0]["date"], "2024-02-01");
        assert_eq!(inserted[0]["player_id"], json!(player_id));
    }

    #[tokio::test]
    async fn test_search_filter_and_order() {
        let store = setup_test().await;
        insert_player(&store, "maya", "Lopez", Some("555-0100")).await;
        insert_player(&store, "Ben", "Mayer", None).await;
        insert_player(&store, "Cara", "Diaz", Some("555-0199")).await;

        let query = Query::new()
            .filter(Filter::Or(vec![
                Filter::contains("first_name", "MAY"),
                Filter::contains("last_name", "MAY"),
                Filter::contains("phone", "MAY"),
            ]))
            .order_by(Order::asc("first_name"));
        let found = store.find(Table::Players, &query).await.unwrap();

        let names: Vec<_> = found.iter().map(|p| p["first_name"].clone()).collect();
        assert_eq!(names, vec![json!("Ben"), json!("maya")]);
    }

    #[tokio::test]
    async fn test_search_folds_case_beyond_ascii() {
        let store = setup_test().await;
        insert_player(&store, "Émile", "Øster", None).await;
        insert_player(&store, "Ana", "Ålund", None).await;
        insert_player(&store, "Ben", "Smith", None).await;

        let search = |needle: &str| {
            Query::new()
                .filter(Filter::Or(vec![
                    Filter::contains("first_name", needle),
                    Filter::contains("last_name", needle),
                ]))
                .order_by(Order::asc("first_name"))
        };

        for needle in ["émile", "ÉMILE", "øster", "ØSTER"] {
            let found = store.find(Table::Players, &search(needle)).await.unwrap();
            assert_eq!(found.len(), 1, "searching {}", needle);
            assert_eq!(found[0]["first_name"], "Émile");
        }

        // limit applies after the text match, not before
        let limited = store.find(Table::Players, &search("ø").limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0]["last_name"], "Øster");
    }

    #[tokio::test]
    async fn test_update_if_with_text_guard() {
        let store = setup_test().await;
        let player_id = insert_player(&store, "Émile", "Øster", None).await;

        let patch = Patch::new().set("notes", "goalkeeper");
        let updated = store
            .update_if(Table::Players, &player_id, &patch, &Filter::contains("first_name", "ÉMI"))
            .await
            .unwrap();
        assert_eq!(updated.unwrap()["notes"], "goalkeeper");

        let rejected = store
            .update_if(Table::Players, &player_id, &patch, &Filter::contains("first_name", "zoe"))
            .await
            .unwrap();
        assert!(rejected.is_none());

        let missing = store
            .update_if(Table::Players, "missing", &patch, &Filter::contains("first_name", "a"))
            .await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_in_filter_and_limit() {
        let store = setup_test().await;
        let a = insert_player(&store, "A", "One", None).await;
        let b = insert_player(&store, "B", "Two", None).await;
        insert_player(&store, "C", "Three", None).await;

        let query = Query::new()
            .filter(Filter::is_in("id", [a.clone(), b.clone()]))
            .order_by(Order::desc("first_name"))
            .limit(1);
        let found = store.find(Table::Players, &query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["id"], json!(b));

        let none = store
            .find(Table::Players, &Query::new().filter(Filter::is_in("id", Vec::<String>::new())))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_guarded_increment_stops_at_total() {
        let store = setup_test().await;
        let player_id = insert_player(&store, "Maya", "Lopez", None).await;
        let inserted = store
            .insert(
                Table::PlayerPackages,
                vec![row(json!({
                    "player_id": player_id,
                    "sessions_total": 2,
                    "sessions_used": 1,
                    "price_cents": 4000
                }))],
            )
            .await
            .unwrap();
        let id = inserted[0]["id"].as_str().unwrap().to_string();

        let patch = Patch::new().increment("sessions_used", 1);
        let guard = Filter::column_lt("sessions_used", "sessions_total");

        let updated = store.update_if(Table::PlayerPackages, &id, &patch, &guard).await.unwrap();
        assert_eq!(updated.unwrap()["sessions_used"], 2);

        let rejected = store.update_if(Table::PlayerPackages, &id, &patch, &guard).await.unwrap();
        assert!(rejected.is_none());

        let missing = store.update(Table::PlayerPackages, "missing", &patch).await;
        assert_eq!(
            missing,
            Err(StoreError::NotFound { table: Table::PlayerPackages, id: "missing".to_string() })
        );
    }

    #[tokio::test]
    async fn test_check_constraint_surfaces_as_rejected() {
        let store = setup_test().await;
        let player_id = insert_player(&store, "Maya", "Lopez", None).await;
        let inserted = store
            .insert(
                Table::PlayerPackages,
                vec![row(json!({
                    "player_id": player_id,
                    "sessions_total": 1,
                    "sessions_used": 1,
                    "price_cents": 2000
                }))],
            )
            .await
            .unwrap();
        let id = inserted[0]["id"].as_str().unwrap();

        let unguarded = store
            .update(Table::PlayerPackages, id, &Patch::new().increment("sessions_used", 1))
            .await;
        assert!(matches!(unguarded, Err(StoreError::Rejected(_))));
    }
}
