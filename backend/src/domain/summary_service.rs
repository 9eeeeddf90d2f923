//! # Summary Service
//!
//! Month-level totals: package revenue by purchase time, expenses by expense
//! date, and the difference. The month is the half-open range
//! `[first day, first day of next month)` in UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use serde_json::Value;
use std::sync::Arc;

use crate::clock::{format_date, format_timestamp, Clock};
use crate::domain::commands::summary::{MonthlySummary, MonthlySummaryQuery};
use crate::domain::errors::{DomainResult, LogicError};
use crate::storage::{Filter, Query, RecordStore, Row, StoreResult, Table};

/// Service for monthly financial summaries
#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl SummaryService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Totals for the requested month, the current one by default. A read that
    /// fails counts as zero and adds a warning instead of failing the summary.
    pub async fn monthly_summary(&self, query: MonthlySummaryQuery) -> DomainResult<MonthlySummary> {
        let today = self.clock.today();
        let year = query.year.unwrap_or_else(|| today.year());
        let month = query.month.unwrap_or_else(|| today.month());

        let (start, next) = month_bounds(year, month)?;
        let label = start.format("%B %Y").to_string();
        info!("Building summary for {}", label);

        let mut warnings = Vec::new();

        let revenue_cents = match self.revenue_between(start, next).await {
            Ok(total) => total,
            Err(e) => {
                warn!("Revenue for {} unavailable: {}", label, e);
                warnings.push(format!("Could not load revenue: {}", e));
                0
            }
        };

        let expenses_cents = match self.expenses_between(start, next).await {
            Ok(total) => total,
            Err(e) => {
                warn!("Expenses for {} unavailable: {}", label, e);
                warnings.push(format!("Could not load expenses: {}", e));
                0
            }
        };

        let profit_cents = revenue_cents - expenses_cents;
        info!(
            "{}: revenue {} cents, expenses {} cents, profit {} cents",
            label, revenue_cents, expenses_cents, profit_cents
        );

        Ok(MonthlySummary {
            year,
            month,
            start,
            label,
            revenue_cents,
            expenses_cents,
            profit_cents,
            warnings,
        })
    }

    async fn revenue_between(&self, start: NaiveDate, next: NaiveDate) -> StoreResult<i64> {
        let filter = Filter::gte("purchased_at", format_timestamp(start_of_day(start)))
            .and(Filter::lt("purchased_at", format_timestamp(start_of_day(next))));
        let rows = self
            .store
            .find(Table::PlayerPackages, &Query::new().filter(filter))
            .await?;
        Ok(sum_column(&rows, "price_cents"))
    }

    async fn expenses_between(&self, start: NaiveDate, next: NaiveDate) -> StoreResult<i64> {
        let filter = Filter::gte("date", format_date(start)).and(Filter::lt("date", format_date(next)));
        let rows = self.store.find(Table::Expenses, &Query::new().filter(filter)).await?;
        Ok(sum_column(&rows, "amount_cents"))
    }
}

/// First day of the month and first day of the following month
fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), LogicError> {
    if !(1..=12).contains(&month) {
        return Err(LogicError::InvalidMonth(month));
    }
    let invalid = || LogicError::InvalidDate(format!("{}-{:02}", year, month));
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1).ok_or_else(invalid)?, 1)
    } else {
        (year, month + 1)
    };

    let start = NaiveDate::from_ymd_opt(year, month, 1);
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (start, next) {
        (Some(start), Some(next)) => Ok((start, next)),
        _ => Err(invalid()),
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// Missing or null amounts count as zero
fn sum_column(rows: &[Row], column: &str) -> i64 {
    rows.iter().filter_map(|row| row.get(column).and_then(Value::as_i64)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::errors::DomainError;
    use crate::domain::models::into_row;
    use crate::storage::{InMemoryRecordStore, Patch, StoreError};
    use async_trait::async_trait;
    use serde_json::json;

    fn setup_test() -> (Arc<InMemoryRecordStore>, SummaryService) {
        let clock = Arc::new(ManualClock::on_date(2024, 3, 15));
        let store = Arc::new(InMemoryRecordStore::with_clock(clock.clone()));
        let service = SummaryService::new(store.clone(), clock);
        (store, service)
    }

    async fn seed(store: &InMemoryRecordStore) {
        let purchase = |purchased_at: &str, price: i64| {
            into_row(json!({
                "player_id": "p1",
                "sessions_total": 5,
                "price_cents": price,
                "purchased_at": purchased_at,
            }))
        };
        store
            .insert(
                Table::PlayerPackages,
                vec![
                    purchase("2024-02-29T23:59:59.999999Z", 1000),
                    purchase("2024-03-01T00:00:00.000000Z", 7500),
                    purchase("2024-03-31T23:59:59.000000Z", 14000),
                    purchase("2024-04-01T00:00:00.000000Z", 2000),
                ],
            )
            .await
            .unwrap();

        let expense = |date: &str, amount: i64| {
            into_row(json!({ "date": date, "category": "Misc", "amount_cents": amount }))
        };
        store
            .insert(
                Table::Expenses,
                vec![
                    expense("2024-02-29", 100),
                    expense("2024-03-01", 2500),
                    expense("2024-03-31", 500),
                    expense("2024-04-01", 900),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_current_month_sums_only_its_rows() {
        let (store, service) = setup_test();
        seed(&store).await;

        let summary = service.monthly_summary(MonthlySummaryQuery::default()).await.unwrap();

        assert_eq!(summary.label, "March 2024");
        assert_eq!(summary.revenue_cents, 21500);
        assert_eq!(summary.expenses_cents, 3000);
        assert_eq!(summary.profit_cents, 18500);
        assert!(summary.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_month_and_december_rollover() {
        let (store, service) = setup_test();
        seed(&store).await;

        let february = service
            .monthly_summary(MonthlySummaryQuery { year: Some(2024), month: Some(2) })
            .await
            .unwrap();
        assert_eq!(february.revenue_cents, 1000);
        assert_eq!(february.expenses_cents, 100);

        let december = service
            .monthly_summary(MonthlySummaryQuery { year: Some(2023), month: Some(12) })
            .await
            .unwrap();
        assert_eq!(december.label, "December 2023");
        assert_eq!(december.profit_cents, 0);
    }

    #[tokio::test]
    async fn test_invalid_month() {
        let (_store, service) = setup_test();

        let result = service
            .monthly_summary(MonthlySummaryQuery { year: Some(2024), month: Some(13) })
            .await;

        assert_eq!(result.unwrap_err(), DomainError::Logic(LogicError::InvalidMonth(13)));
    }

    #[tokio::test]
    async fn test_year_past_calendar_range_is_invalid() {
        let (_store, service) = setup_test();

        let result = service
            .monthly_summary(MonthlySummaryQuery { year: Some(i32::MAX), month: Some(12) })
            .await;

        assert!(matches!(result, Err(DomainError::Logic(LogicError::InvalidDate(_)))));
    }

    /// Serves everything but expenses
    struct NoExpensesStore(InMemoryRecordStore);

    #[async_trait]
    impl RecordStore for NoExpensesStore {
        async fn find(&self, table: Table, query: &Query) -> StoreResult<Vec<Row>> {
            if table == Table::Expenses {
                return Err(StoreError::Unavailable("expenses offline".to_string()));
            }
            self.0.find(table, query).await
        }
        async fn insert(&self, table: Table, rows: Vec<Row>) -> StoreResult<Vec<Row>> {
            self.0.insert(table, rows).await
        }
        async fn update(&self, table: Table, id: &str, patch: &Patch) -> StoreResult<Row> {
            self.0.update(table, id, patch).await
        }
        async fn update_if(
            &self,
            table: Table,
            id: &str,
            patch: &Patch,
            guard: &Filter,
        ) -> StoreResult<Option<Row>> {
            self.0.update_if(table, id, patch, guard).await
        }
    }

    #[tokio::test]
    async fn test_failed_read_counts_as_zero_with_warning() {
        let clock = Arc::new(ManualClock::on_date(2024, 3, 15));
        let inner = InMemoryRecordStore::with_clock(clock.clone());
        seed(&inner).await;
        let service = SummaryService::new(Arc::new(NoExpensesStore(inner)), clock);

        let summary = service.monthly_summary(MonthlySummaryQuery::default()).await.unwrap();

        assert_eq!(summary.revenue_cents, 21500);
        assert_eq!(summary.expenses_cents, 0);
        assert_eq!(summary.profit_cents, 21500);
        assert_eq!(summary.warnings.len(), 1);
        assert!(summary.warnings[0].contains("expenses offline"));
    }

    #[test]
    fn test_month_bounds() {
        let (start, next) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.to_string(), "2024-12-01");
        assert_eq!(next.to_string(), "2025-01-01");
        assert_eq!(month_bounds(2024, 0), Err(LogicError::InvalidMonth(0)));
    }
}
