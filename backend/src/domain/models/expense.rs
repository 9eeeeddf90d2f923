use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub date: NaiveDate,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}
