//! # Expense Service
//!
//! Logging camp expenses and listing the most recent ones. Amounts arrive as
//! the dollar string the user typed and are stored as integer cents.

use chrono::NaiveDate;
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::clock::{format_date, Clock};
use crate::domain::commands::expenses::RecordExpenseCommand;
use crate::domain::errors::{DomainResult, LogicError};
use crate::domain::models::expense::Expense;
use crate::domain::models::{from_row, from_rows, into_row};
use crate::storage::{Order, Query, RecordStore, StoreError, Table};

pub const DEFAULT_EXPENSE_LIST_LIMIT: u32 = 50;

/// Service for recording and listing expenses
#[derive(Clone)]
pub struct ExpenseService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    default_limit: u32,
}

impl ExpenseService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, default_limit: u32) -> Self {
        Self { store, clock, default_limit }
    }

    /// Log an expense. The date defaults to today.
    pub async fn record_expense(&self, command: RecordExpenseCommand) -> DomainResult<Expense> {
        let category = command.category.trim();
        if category.is_empty() {
            return Err(LogicError::MissingCategory.into());
        }

        let amount_cents = parse_dollars_to_cents(&command.amount)?;

        let date = match command.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| LogicError::InvalidDate(raw.to_string()))?,
            None => self.clock.today(),
        };

        let description = command
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        info!("Recording expense: {} {} cents on {}", category, amount_cents, date);

        let row = into_row(json!({
            "date": format_date(date),
            "category": category,
            "description": description.map_or(Value::Null, Value::from),
            "amount_cents": amount_cents,
        }));
        let inserted = self.store.insert(Table::Expenses, vec![row]).await?;
        let expense: Expense = match inserted.into_iter().next() {
            Some(row) => from_row(Table::Expenses, row)?,
            None => {
                return Err(StoreError::Rejected("Expense insert returned no row".to_string()).into())
            }
        };

        info!("Recorded expense with ID: {}", expense.id);
        Ok(expense)
    }

    /// Most recent expenses, newest date first. `None` uses the configured
    /// default limit.
    pub async fn list_recent_expenses(&self, limit: Option<u32>) -> DomainResult<Vec<Expense>> {
        let limit = limit.unwrap_or(self.default_limit);
        info!("Listing up to {} recent expenses", limit);

        let query = Query::new()
            .order_by(Order::desc("date"))
            .order_by(Order::desc("created_at"))
            .limit(limit);
        let rows = self.store.find(Table::Expenses, &query).await?;
        Ok(from_rows(Table::Expenses, rows)?)
    }
}

/// Parse a positive dollar amount such as `"12"`, `"$12.5"` or `"12.345"`
/// into cents, rounding half up past the second decimal.
pub fn parse_dollars_to_cents(input: &str) -> Result<i64, LogicError> {
    let invalid = || LogicError::InvalidAmount(input.to_string());

    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (trimmed, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(invalid());
    }

    let dollars: i64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| invalid())? };

    let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let hundredths = digits.next().unwrap_or(0);
    let round_up = digits.next().map_or(false, |d| d >= 5);

    let cents = dollars
        .checked_mul(100)
        .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
        .ok_or_else(invalid)?;

    if cents <= 0 {
        return Err(invalid());
    }
    Ok(cents)
}
