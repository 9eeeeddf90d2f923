//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs from the
//! `shared` crate to these types and back.

pub mod ledger {
    use crate::domain::models::attendance::AttendanceRecord;
    use crate::domain::models::package::PlayerPackage;
    use crate::storage::StoreError;

    pub const PACKAGE_UPDATE_FAILED_WARNING: &str =
        "Checked in, but failed to update package sessions. You may want to adjust manually.";
    pub const PACKAGE_BECAME_FULL_WARNING: &str =
        "Checked in, but the package ran out of sessions before this visit was deducted. Treat it as a drop-in or sell a new package.";

    /// Input for recording a check-in.
    #[derive(Debug, Clone)]
    pub struct CheckInCommand {
        pub player_id: String,
        /// Active package the caller already fetched; looked up when absent
        pub active_package: Option<PlayerPackage>,
    }

    /// What the check-in did to the package balance. Every variant means the
    /// attendance record was written.
    #[derive(Debug, Clone, PartialEq)]
    pub enum CheckInOutcome {
        /// One session consumed; carries the package as it is now
        PackageDecremented { package: PlayerPackage },
        /// No package with sessions left
        DropIn,
        /// Attendance stands, the package could not be read or updated
        PackageUpdateFailed { package_id: Option<String>, error: StoreError },
        /// The package was exhausted between lookup and update
        PackageBecameFull { package_id: String },
    }

    impl CheckInOutcome {
        /// Message the caller must show alongside the success, if any
        pub fn warning(&self) -> Option<&'static str> {
            match self {
                CheckInOutcome::PackageUpdateFailed { .. } => Some(PACKAGE_UPDATE_FAILED_WARNING),
                CheckInOutcome::PackageBecameFull { .. } => Some(PACKAGE_BECAME_FULL_WARNING),
                CheckInOutcome::PackageDecremented { .. } | CheckInOutcome::DropIn => None,
            }
        }

        pub fn consumed_session(&self) -> bool {
            matches!(self, CheckInOutcome::PackageDecremented { .. })
        }
    }

    /// Result of a check-in.
    #[derive(Debug, Clone, PartialEq)]
    pub struct CheckInResult {
        pub attendance: AttendanceRecord,
        pub outcome: CheckInOutcome,
    }
}

pub mod roster {
    use crate::domain::models::attendance::AttendanceRecord;
    use crate::domain::models::package::PlayerPackage;
    use crate::domain::models::player::Player;

    pub const NO_PLAYERS_FOUND: &str = "No players found. Try a different name or phone.";

    /// Input for registering a player.
    #[derive(Debug, Clone, Default)]
    pub struct RegisterPlayerCommand {
        pub first_name: String,
        pub last_name: String,
        pub phone: Option<String>,
        pub notes: Option<String>,
    }

    /// Result of a roster search. Never an error: failures become `message`.
    #[derive(Debug, Clone, Default)]
    pub struct PlayerSearchResult {
        pub players: Vec<Player>,
        pub message: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct RosterEntry {
        pub player: Player,
        pub active_package: Option<PlayerPackage>,
    }

    /// Result of listing the roster.
    #[derive(Debug, Clone, Default)]
    pub struct PlayerListResult {
        pub entries: Vec<RosterEntry>,
        pub message: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct PlayerDetail {
        pub player: Player,
        pub active_package: Option<PlayerPackage>,
        /// Newest purchase first
        pub packages: Vec<PlayerPackage>,
        /// Most recent date first
        pub attendance: Vec<AttendanceRecord>,
    }
}

pub mod sales {
    use crate::domain::models::package::{CatalogPackage, PlayerPackage};
    use crate::domain::models::player::Player;

    /// Input for selling a package.
    #[derive(Debug, Clone)]
    pub struct SellPackageCommand {
        pub player_id: String,
        pub package_id: String,
    }

    /// Result of selling a package.
    #[derive(Debug, Clone)]
    pub struct SellPackageResult {
        pub player_package: PlayerPackage,
        pub player: Player,
        pub package: CatalogPackage,
        pub success_message: String,
    }
}

pub mod attendance {
    use chrono::NaiveDate;

    use crate::domain::models::attendance::AttendanceRecord;

    pub const UNKNOWN_PLAYER: &str = "Unknown player";

    #[derive(Debug, Clone)]
    pub struct TodayCheckIn {
        pub record: AttendanceRecord,
        pub player_name: String,
    }

    /// Today's check-ins, newest first. Failures become `message`.
    #[derive(Debug, Clone)]
    pub struct TodayCheckInsResult {
        pub date: NaiveDate,
        pub check_ins: Vec<TodayCheckIn>,
        pub message: Option<String>,
    }
}

pub mod expenses {
    /// Input for logging an expense.
    #[derive(Debug, Clone, Default)]
    pub struct RecordExpenseCommand {
        /// YYYY-MM-DD; today when absent
        pub date: Option<String>,
        pub category: String,
        pub description: Option<String>,
        /// Dollars as typed, e.g. "12.50"
        pub amount: String,
    }
}

pub mod summary {
    use chrono::NaiveDate;

    /// Which month to summarise; the current month when fields are absent.
    #[derive(Debug, Clone, Default)]
    pub struct MonthlySummaryQuery {
        pub year: Option<i32>,
        pub month: Option<u32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct MonthlySummary {
        pub year: i32,
        pub month: u32,
        pub start: NaiveDate,
        pub label: String,
        pub revenue_cents: i64,
        pub expenses_cents: i64,
        pub profit_cents: i64,
        pub warnings: Vec<String>,
    }
}
