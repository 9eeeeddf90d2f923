//! # SQLite Storage Module
//!
//! SQLite-backed record store.
//!
//! ## Components
//!
//! - **connection.rs** - pool creation and schema set-up
//! - **record_store.rs** - the `RecordStore` implementation

pub mod connection;
pub mod record_store;

pub use connection::DbConnection;
pub use record_store::SqliteRecordStore;
