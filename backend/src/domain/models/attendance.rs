use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One check-in. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    pub id: String,
    pub player_id: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}
