//! # Domain Module
//!
//! Business rules for the camp ledger: who the players are, which session
//! packages they own, how a check-in consumes a session, and what the camp
//! earned and spent in a month.
//!
//! Services never touch SQL or HTTP. They receive an `Arc<dyn RecordStore>`
//! and an `Arc<dyn Clock>` at construction and return [`DomainResult`].
//!
//! ## Module Organization
//!
//! - **package_ledger_service**: active package selection and check-in
//! - **roster_service**: player search, registration, listing, detail
//! - **package_sales_service**: package catalog and selling packages
//! - **attendance_service**: today's check-ins and attendance history
//! - **expense_service**: logging and listing expenses
//! - **summary_service**: monthly revenue, expenses and profit
//!
//! ## Business Rules
//!
//! - A player's active package is the earliest purchase with sessions left
//! - `0 <= sessions_used <= sessions_total` for every purchase, always
//! - A check-in's attendance record stands even if the package update fails
//! - Purchases copy session count and price from the catalog at sale time
//! - Money is integer cents everywhere

pub mod attendance_service;
pub mod commands;
pub mod errors;
pub mod expense_service;
pub mod models;
pub mod package_ledger_service;
pub mod package_sales_service;
pub mod roster_service;
pub mod summary_service;

pub use attendance_service::AttendanceService;
pub use errors::{DomainError, DomainResult, LogicError};
pub use expense_service::ExpenseService;
pub use package_ledger_service::{LedgerPolicy, PackageLedgerService};
pub use package_sales_service::{CatalogSeed, PackageSalesService};
pub use roster_service::RosterService;
pub use summary_service::SummaryService;
