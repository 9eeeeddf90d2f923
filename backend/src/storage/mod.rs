//! # Storage Module
//!
//! Handles all data persistence for the camp ledger.
//!
//! The domain layer only ever sees the [`RecordStore`] trait: a table-oriented
//! request/response API (find, insert, keyed update, guarded update). The
//! implementation can be swapped without touching domain logic.
//!
//! ## Current Implementations
//!
//! - **SQLite**: `sqlx` pool, schema created on connect
//! - **In-memory**: tables behind a lock, for tests and demos
//!
//! ## Design Principles
//!
//! - **Dependency Inversion**: services receive an `Arc<dyn RecordStore>`
//! - **One call, one atomic step**: nothing is assumed across calls
//! - **Checked names**: table and column names are validated against `schema`

pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use memory::InMemoryRecordStore;
pub use sqlite::{DbConnection, SqliteRecordStore};
pub use traits::{Filter, Order, Patch, PatchOp, Query, RecordStore, Row, StoreError, StoreResult, Table};
