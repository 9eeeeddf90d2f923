use shared::{
    AttendanceRecord as SharedAttendance, CheckInOutcome as SharedOutcome, CheckInResponse,
    TodayCheckIn as SharedTodayCheckIn, TodayCheckInsResponse,
};

use crate::clock::{format_date, format_timestamp};
use crate::domain::commands::attendance::TodayCheckInsResult;
use crate::domain::commands::ledger::{CheckInOutcome, CheckInResult};
use crate::domain::models::attendance::AttendanceRecord;
use crate::domain::models::player::Player;

/// Mapper for attendance records.
pub struct AttendanceMapper;

impl AttendanceMapper {
    pub fn to_dto(domain: AttendanceRecord) -> SharedAttendance {
        SharedAttendance {
            id: domain.id,
            player_id: domain.player_id,
            date: format_date(domain.date),
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_today_dto(result: TodayCheckInsResult) -> TodayCheckInsResponse {
        TodayCheckInsResponse {
            date: format_date(result.date),
            check_ins: result
                .check_ins
                .into_iter()
                .map(|check_in| SharedTodayCheckIn {
                    id: check_in.record.id,
                    player_id: check_in.record.player_id,
                    player_name: check_in.player_name,
                    date: format_date(check_in.record.date),
                    created_at: format_timestamp(check_in.record.created_at),
                })
                .collect(),
            message: result.message,
        }
    }
}

/// Mapper for check-in results.
pub struct CheckInMapper;

impl CheckInMapper {
    pub fn outcome_to_dto(outcome: &CheckInOutcome) -> SharedOutcome {
        match outcome {
            CheckInOutcome::PackageDecremented { package } => SharedOutcome::PackageDecremented {
                package_id: package.id.clone(),
                sessions_used: package.sessions_used,
                sessions_total: package.sessions_total,
                sessions_remaining: package.sessions_remaining(),
            },
            CheckInOutcome::DropIn => SharedOutcome::DropIn,
            CheckInOutcome::PackageUpdateFailed { package_id, .. } => {
                SharedOutcome::PackageUpdateFailed { package_id: package_id.clone() }
            }
            CheckInOutcome::PackageBecameFull { package_id } => {
                SharedOutcome::PackageBecameFull { package_id: package_id.clone() }
            }
        }
    }

    /// e.g. "Checked in Maya Lopez for today. Session deducted from their package."
    pub fn success_message(player: &Player, outcome: &CheckInOutcome) -> String {
        let suffix = match outcome {
            CheckInOutcome::PackageDecremented { .. } => " Session deducted from their package.",
            CheckInOutcome::DropIn => " (No active package on file.)",
            CheckInOutcome::PackageUpdateFailed { .. } | CheckInOutcome::PackageBecameFull { .. } => "",
        };
        format!("Checked in {} {} for today.{}", player.first_name, player.last_name, suffix)
    }

    pub fn to_dto(player: &Player, result: CheckInResult) -> CheckInResponse {
        CheckInResponse {
            outcome: Self::outcome_to_dto(&result.outcome),
            success_message: Self::success_message(player, &result.outcome),
            warning: result.outcome.warning().map(str::to_string),
            attendance: AttendanceMapper::to_dto(result.attendance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::package::PlayerPackage;
    use crate::storage::StoreError;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn player() -> Player {
        Player {
            id: "p1".to_string(),
            first_name: "Maya".to_string(),
            last_name: "Lopez".to_string(),
            phone: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn result(outcome: CheckInOutcome) -> CheckInResult {
        CheckInResult {
            attendance: AttendanceRecord {
                id: "a1".to_string(),
                player_id: "p1".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                created_at: Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap(),
            },
            outcome,
        }
    }

    #[test]
    fn test_decremented_message_and_remaining() {
        let package = PlayerPackage {
            id: "pp1".to_string(),
            player_id: "p1".to_string(),
            package_id: None,
            sessions_total: 10,
            sessions_used: 10,
            price_cents: 16000,
            purchased_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        let dto = CheckInMapper::to_dto(&player(), result(CheckInOutcome::PackageDecremented { package }));

        assert_eq!(
            dto.success_message,
            "Checked in Maya Lopez for today. Session deducted from their package."
        );
        assert!(dto.warning.is_none());
        assert_eq!(
            dto.outcome,
            SharedOutcome::PackageDecremented {
                package_id: "pp1".to_string(),
                sessions_used: 10,
                sessions_total: 10,
                sessions_remaining: 0,
            }
        );
        assert_eq!(dto.attendance.date, "2024-03-15");
        assert_eq!(dto.attendance.created_at, "2024-03-15T12:00:00.000000Z");
    }

    #[test]
    fn test_drop_in_and_failure_messages() {
        let drop_in = CheckInMapper::to_dto(&player(), result(CheckInOutcome::DropIn));
        assert_eq!(drop_in.success_message, "Checked in Maya Lopez for today. (No active package on file.)");

        let failed = CheckInMapper::to_dto(
            &player(),
            result(CheckInOutcome::PackageUpdateFailed {
                package_id: Some("pp1".to_string()),
                error: StoreError::Unavailable("timeout".to_string()),
            }),
        );
        assert_eq!(failed.success_message, "Checked in Maya Lopez for today.");
        assert_eq!(
            failed.warning.as_deref(),
            Some("Checked in, but failed to update package sessions. You may want to adjust manually.")
        );
    }
}
