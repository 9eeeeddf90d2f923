//! # Package Ledger Service
//!
//! Owns the two rules that keep session balances honest:
//!
//! - **Active package**: the earliest purchased package that still has
//!   sessions left backs the player's next check-in (first in, first used).
//! - **Check-in**: the attendance record is written first and always stands;
//!   consuming a session is a second, guarded step whose failure is reported
//!   as a warning, never as a failed check-in.
//!
//! ```text
//! Start -> AttendanceWritten -> PackageDecremented
//!                            -> PackageUpdateFailed
//!                            -> PackageBecameFull
//!                            -> DropIn
//! Start -> AttendanceWriteFailed   (the only error)
//! ```

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{format_date, Clock};
use crate::domain::commands::ledger::{CheckInCommand, CheckInOutcome, CheckInResult};
use crate::domain::errors::{DomainError, DomainResult, LogicError};
use crate::domain::models::attendance::AttendanceRecord;
use crate::domain::models::package::{select_active_package, PlayerPackage};
use crate::domain::models::{from_row, from_rows, into_row};
use crate::storage::{Filter, Order, Patch, Query, RecordStore, StoreError, Table};

/// Check-in rules that are a business decision rather than a fixed invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    /// Whether a player may be checked in more than once on the same date
    /// (e.g. make-up sessions). When false the second check-in is refused
    /// before anything is written.
    pub allow_duplicate_same_day_check_in: bool,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self { allow_duplicate_same_day_check_in: true }
    }
}

/// Service for package balances and check-ins
#[derive(Clone)]
pub struct PackageLedgerService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    policy: LedgerPolicy,
}

impl PackageLedgerService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>, policy: LedgerPolicy) -> Self {
        Self { store, clock, policy }
    }

    pub fn policy(&self) -> LedgerPolicy {
        self.policy
    }

    /// The package that would be consumed by the player's next check-in, or
    /// `None` for a drop-in. A snapshot; it may be stale by the time it is used.
    pub async fn find_active_package(&self, player_id: &str) -> DomainResult<Option<PlayerPackage>> {
        let player_id = require_player_id(player_id)?;
        let packages = self.packages_oldest_first(player_id).await?;
        Ok(select_active_package(packages))
    }

    /// Every purchase of the player, oldest first
    pub async fn packages_oldest_first(&self, player_id: &str) -> DomainResult<Vec<PlayerPackage>> {
        let query = Query::new()
            .filter(Filter::eq("player_id", player_id))
            .order_by(Order::asc("purchased_at"));
        let rows = self.store.find(Table::PlayerPackages, &query).await?;
        Ok(from_rows(Table::PlayerPackages, rows)?)
    }

    /// A single purchase by id
    pub async fn get_player_package(&self, package_id: &str) -> DomainResult<Option<PlayerPackage>> {
        let query = Query::new().filter(Filter::eq("id", package_id)).limit(1);
        let rows = self.store.find(Table::PlayerPackages, &query).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(from_row(Table::PlayerPackages, row)?)),
            None => Ok(None),
        }
    }

    /// Active package for each of the given players, from one read
    pub async fn active_packages_by_player(
        &self,
        player_ids: &[String],
    ) -> DomainResult<HashMap<String, PlayerPackage>> {
        if player_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = Query::new()
            .filter(Filter::is_in("player_id", player_ids.iter().cloned()))
            .order_by(Order::asc("purchased_at"));
        let rows = self.store.find(Table::PlayerPackages, &query).await?;
        let packages: Vec<PlayerPackage> = from_rows(Table::PlayerPackages, rows)?;

        let mut by_player: HashMap<String, Vec<PlayerPackage>> = HashMap::new();
        for package in packages {
            by_player.entry(package.player_id.clone()).or_default().push(package);
        }

        Ok(by_player
            .into_iter()
            .filter_map(|(player_id, packages)| {
                select_active_package(packages).map(|active| (player_id, active))
            })
            .collect())
    }

    /// Record that the player showed up today and consume one session from
    /// their active package, if they have one.
    ///
    /// Only a failure to write the attendance record is an error. Problems on
    /// the package side come back as [`CheckInOutcome::PackageUpdateFailed`]
    /// or [`CheckInOutcome::PackageBecameFull`] with the attendance intact.
    pub async fn check_in(&self, command: CheckInCommand) -> DomainResult<CheckInResult> {
        let player_id = require_player_id(&command.player_id)?.to_string();
        let today = format_date(self.clock.today());
        info!("Checking in player {} for {}", player_id, today);

        if !self.policy.allow_duplicate_same_day_check_in
            && self.has_attendance_on(&player_id, &today).await?
        {
            warn!("Player {} already checked in for {}", player_id, today);
            return Err(LogicError::AlreadyCheckedIn { player_id, date: today }.into());
        }

        let attendance = self.record_attendance(&player_id, &today).await.map_err(|e| {
            error!("Failed to record attendance for {}: {}", player_id, e);
            e
        })?;

        let package = match command.active_package {
            Some(package) if package.player_id == player_id => Ok(Some(package)),
            Some(package) => {
                warn!(
                    "Ignoring package {} supplied for player {}: it belongs to {}",
                    package.id, player_id, package.player_id
                );
                self.find_active_package(&player_id).await
            }
            None => self.find_active_package(&player_id).await,
        };

        let outcome = match package {
            Ok(Some(package)) => self.consume_session(&package).await,
            Ok(None) => {
                info!("Player {} has no active package, recorded as drop-in", player_id);
                CheckInOutcome::DropIn
            }
            Err(e) => {
                error!("Checked in {} but could not look up packages: {}", player_id, e);
                let error = match e {
                    DomainError::Store(store_error) => store_error,
                    other => StoreError::Rejected(other.to_string()),
                };
                CheckInOutcome::PackageUpdateFailed { package_id: None, error }
            }
        };

        Ok(CheckInResult { attendance, outcome })
    }

    async fn has_attendance_on(&self, player_id: &str, date: &str) -> DomainResult<bool> {
        let query = Query::new()
            .filter(Filter::eq("player_id", player_id).and(Filter::eq("date", date)))
            .limit(1);
        let rows = self.store.find(Table::Attendance, &query).await?;
        Ok(!rows.is_empty())
    }

    async fn record_attendance(&self, player_id: &str, date: &str) -> DomainResult<AttendanceRecord> {
        let row = into_row(json!({ "player_id": player_id, "date": date }));
        let inserted = self.store.insert(Table::Attendance, vec![row]).await?;
        let row = inserted.into_iter().next().ok_or_else(|| {
            StoreError::Rejected("Attendance insert returned no row".to_string())
        })?;
        Ok(from_row(Table::Attendance, row)?)
    }

    /// Add one used session as a single guarded update, so two concurrent
    /// check-ins can never push `sessions_used` past `sessions_total`.
    async fn consume_session(&self, package: &PlayerPackage) -> CheckInOutcome {
        let patch = Patch::new().increment("sessions_used", 1);
        let guard = Filter::column_lt("sessions_used", "sessions_total");

        match self
            .store
            .update_if(Table::PlayerPackages, &package.id, &patch, &guard)
            .await
        {
            Ok(Some(row)) => {
                let updated = from_row::<PlayerPackage>(Table::PlayerPackages, row).unwrap_or_else(|e| {
                    warn!("Package {} updated but returned row was unreadable: {}", package.id, e);
                    PlayerPackage { sessions_used: package.sessions_used + 1, ..package.clone() }
                });
                info!(
                    "Package {} now at {}/{} sessions",
                    updated.id, updated.sessions_used, updated.sessions_total
                );
                CheckInOutcome::PackageDecremented { package: updated }
            }
            Ok(None) => {
                warn!("Package {} was full before the session could be deducted", package.id);
                CheckInOutcome::PackageBecameFull { package_id: package.id.clone() }
            }
            Err(e) => {
                error!("Checked in, but failed to update package {}: {}", package.id, e);
                CheckInOutcome::PackageUpdateFailed { package_id: Some(package.id.clone()), error: e }
            }
        }
    }
}

fn require_player_id(player_id: &str) -> Result<&str, LogicError> {
    let trimmed = player_id.trim();
    if trimmed.is_empty() {
        Err(LogicError::MissingPlayer)
    } else {
        Ok(trimmed)
    }
}
