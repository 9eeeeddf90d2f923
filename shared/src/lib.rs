use serde::{Deserialize, Serialize};

/// A registered camp player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: String, // RFC 3339 timestamp
}

/// A purchasable plan from the package catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    pub sessions_included: i64,
    pub price_cents: i64,
    /// e.g. "$120.00"
    pub formatted_price: String,
}

/// A package purchased by a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerPackage {
    pub id: String,
    pub player_id: String,
    pub package_id: Option<String>,
    pub sessions_total: i64,
    pub sessions_used: i64,
    pub sessions_remaining: i64,
    pub price_cents: i64,
    pub purchased_at: String, // RFC 3339 timestamp
}

/// A single check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub player_id: String,
    pub date: String, // ISO 8601 date format (YYYY-MM-DD)
    pub created_at: String,
}

/// A logged camp expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub date: String,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub formatted_amount: String,
    pub created_at: String,
}

/// Request for registering a new player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPlayerRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Response after registering a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPlayerResponse {
    pub player: Player,
    pub success_message: String,
}

/// Response for a roster search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSearchResponse {
    pub players: Vec<Player>,
    /// Set when the search came back empty or could not be completed
    pub message: Option<String>,
}

/// A roster row: the player and the package currently backing their check-ins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerWithPackage {
    pub player: Player,
    pub active_package: Option<PlayerPackage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerListResponse {
    pub players: Vec<PlayerWithPackage>,
    pub message: Option<String>,
}

/// Everything shown on a player's detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetailResponse {
    pub player: Player,
    pub active_package: Option<PlayerPackage>,
    /// Newest purchase first
    pub packages: Vec<PlayerPackage>,
    /// Most recent date first
    pub attendance: Vec<AttendanceRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePackageResponse {
    pub active_package: Option<PlayerPackage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageCatalogResponse {
    pub packages: Vec<Package>,
}

/// Request for selling a catalog package to a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellPackageRequest {
    pub player_id: String,
    pub package_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellPackageResponse {
    pub player_package: PlayerPackage,
    pub success_message: String,
}

/// Request for checking a player in for today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub player_id: String,
    /// Id of the active package the caller already loaded, if any
    #[serde(default)]
    pub active_package_id: Option<String>,
}

/// What happened to the player's package balance during a check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckInOutcome {
    PackageDecremented {
        package_id: String,
        sessions_used: i64,
        sessions_total: i64,
        sessions_remaining: i64,
    },
    DropIn,
    PackageUpdateFailed {
        /// Absent when the package could not even be looked up
        package_id: Option<String>,
    },
    PackageBecameFull {
        package_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckInResponse {
    pub attendance: AttendanceRecord,
    pub outcome: CheckInOutcome,
    pub success_message: String,
    /// Present on partial success: the check-in stands but needs attention
    pub warning: Option<String>,
}

/// One row of today's check-in list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayCheckIn {
    pub id: String,
    pub player_id: String,
    pub player_name: String,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayCheckInsResponse {
    pub date: String,
    pub check_ins: Vec<TodayCheckIn>,
    pub message: Option<String>,
}

/// Request for logging an expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExpenseRequest {
    /// Defaults to today when omitted (YYYY-MM-DD)
    #[serde(default)]
    pub date: Option<String>,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Dollar amount as typed by the user, e.g. "12.50"
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordExpenseResponse {
    pub expense: Expense,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
}

/// Revenue, expenses and profit for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummaryResponse {
    pub year: i32,
    pub month: u32,
    pub month_label: String, // e.g., "October 2026"
    pub revenue_cents: i64,
    pub expenses_cents: i64,
    pub profit_cents: i64,
    pub formatted_revenue: String,
    pub formatted_expenses: String,
    pub formatted_profit: String,
    pub warnings: Vec<String>,
}

/// Body of every non-2xx API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Format integer cents as dollars, e.g. `12050` -> `"$120.50"`, `-500` -> `"-$5.00"`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "$0.00");
        assert_eq!(format_cents(5), "$0.05");
        assert_eq!(format_cents(12050), "$120.50");
        assert_eq!(format_cents(-500), "-$5.00");
    }

    #[test]
    fn test_check_in_outcome_is_tagged() {
        let json = serde_json::to_value(CheckInOutcome::DropIn).unwrap();
        assert_eq!(json["kind"], "drop_in");

        let decremented = CheckInOutcome::PackageDecremented {
            package_id: "pkg-1".to_string(),
            sessions_used: 10,
            sessions_total: 10,
            sessions_remaining: 0,
        };
        let json = serde_json::to_value(&decremented).unwrap();
        assert_eq!(json["kind"], "package_decremented");
        assert_eq!(json["sessions_remaining"], 0);
    }

    #[test]
    fn test_check_in_request_defaults_package() {
        let request: CheckInRequest = serde_json::from_str(r#"{"player_id":"p1"}"#).unwrap();
        assert_eq!(request.player_id, "p1");
        assert!(request.active_package_id.is_none());
    }
}
