//! # Roster Service
//!
//! Player lookup and registration. Searching and listing never fail: a store
//! error is logged and handed back as a message next to an empty list, the
//! same way an empty search says "No players found".

use log::{debug, error, info, warn};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::attendance_service::AttendanceService;
use crate::domain::commands::roster::{
    PlayerDetail, PlayerListResult, PlayerSearchResult, RegisterPlayerCommand, RosterEntry,
    NO_PLAYERS_FOUND,
};
use crate::domain::errors::{DomainResult, LogicError};
use crate::domain::models::package::select_active_package;
use crate::domain::models::player::Player;
use crate::domain::models::{from_row, from_rows, into_row};
use crate::domain::package_ledger_service::PackageLedgerService;
use crate::storage::{Filter, Order, Query, RecordStore, StoreError, Table};

const MAX_NAME_CHARS: usize = 100;
const MAX_NOTES_CHARS: usize = 256;

/// Service for finding and registering players
#[derive(Clone)]
pub struct RosterService {
    store: Arc<dyn RecordStore>,
    ledger: PackageLedgerService,
    attendance: AttendanceService,
}

impl RosterService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        ledger: PackageLedgerService,
        attendance: AttendanceService,
    ) -> Self {
        Self { store, ledger, attendance }
    }

    /// Case-insensitive substring search over first name, last name and phone,
    /// ordered by first name. A blank query returns nothing and does not hit
    /// the store.
    pub async fn search_players(&self, query: &str) -> PlayerSearchResult {
        let needle = query.trim();
        if needle.is_empty() {
            debug!("Empty roster search, skipping store");
            return PlayerSearchResult::default();
        }

        info!("Searching players for '{}'", needle);

        let filter = Filter::Or(vec![
            Filter::contains("first_name", needle),
            Filter::contains("last_name", needle),
            Filter::contains("phone", needle),
        ]);
        let query = Query::new().filter(filter).order_by(Order::asc("first_name"));

        let players = self
            .store
            .find(Table::Players, &query)
            .await
            .and_then(|rows| from_rows::<Player>(Table::Players, rows));

        match players {
            Ok(players) if players.is_empty() => PlayerSearchResult {
                players,
                message: Some(NO_PLAYERS_FOUND.to_string()),
            },
            Ok(players) => {
                info!("Found {} players matching '{}'", players.len(), needle);
                PlayerSearchResult { players, message: None }
            }
            Err(e) => {
                error!("Player search failed: {}", e);
                PlayerSearchResult { players: Vec::new(), message: Some(e.to_string()) }
            }
        }
    }

    /// Register a new player
    pub async fn register_player(&self, command: RegisterPlayerCommand) -> DomainResult<Player> {
        let first_name = command.first_name.trim();
        let last_name = command.last_name.trim();
        info!("Registering player: {} {}", first_name, last_name);

        // Validate the command
        if first_name.is_empty() || last_name.is_empty() {
            return Err(LogicError::MissingName.into());
        }
        if first_name.chars().count() > MAX_NAME_CHARS {
            return Err(LogicError::TooLong { field: "First name", max: MAX_NAME_CHARS }.into());
        }
        if last_name.chars().count() > MAX_NAME_CHARS {
            return Err(LogicError::TooLong { field: "Last name", max: MAX_NAME_CHARS }.into());
        }
        let notes = non_blank(command.notes.as_deref());
        if notes.map_or(false, |n| n.chars().count() > MAX_NOTES_CHARS) {
            return Err(LogicError::TooLong { field: "Notes", max: MAX_NOTES_CHARS }.into());
        }

        let row = into_row(json!({
            "first_name": first_name,
            "last_name": last_name,
            "phone": non_blank(command.phone.as_deref()).map_or(Value::Null, Value::from),
            "notes": notes.map_or(Value::Null, Value::from),
        }));

        let inserted = self.store.insert(Table::Players, vec![row]).await?;
        let player: Player = match inserted.into_iter().next() {
            Some(row) => from_row(Table::Players, row)?,
            None => {
                return Err(StoreError::Rejected("Player insert returned no row".to_string()).into())
            }
        };

        info!("Registered player {} with ID: {}", player.full_name(), player.id);
        Ok(player)
    }

    /// All players, newest first, each with the package backing their next
    /// check-in
    pub async fn list_players(&self) -> PlayerListResult {
        info!("Listing all players");

        match self.roster_entries().await {
            Ok(entries) => {
                info!("Found {} players", entries.len());
                PlayerListResult { entries, message: None }
            }
            Err(e) => {
                error!("Failed to list players: {}", e);
                PlayerListResult { entries: Vec::new(), message: Some(e.to_string()) }
            }
        }
    }

    async fn roster_entries(&self) -> DomainResult<Vec<RosterEntry>> {
        let query = Query::new().order_by(Order::desc("created_at"));
        let rows = self.store.find(Table::Players, &query).await?;
        let players: Vec<Player> = from_rows(Table::Players, rows)?;

        let ids: Vec<String> = players.iter().map(|p| p.id.clone()).collect();
        let mut active = self.ledger.active_packages_by_player(&ids).await?;

        Ok(players
            .into_iter()
            .map(|player| {
                let active_package = active.remove(&player.id);
                RosterEntry { player, active_package }
            })
            .collect())
    }

    /// A single player by id
    pub async fn get_player(&self, player_id: &str) -> DomainResult<Player> {
        debug!("Getting player: {}", player_id);

        let query = Query::new().filter(Filter::eq("id", player_id)).limit(1);
        let rows = self.store.find(Table::Players, &query).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(from_row(Table::Players, row)?),
            None => {
                warn!("Player not found: {}", player_id);
                Err(LogicError::PlayerNotFound(player_id.to_string()).into())
            }
        }
    }

    /// Player with every purchase (newest first) and their attendance history
    pub async fn get_player_detail(&self, player_id: &str) -> DomainResult<PlayerDetail> {
        info!("Loading detail for player {}", player_id);

        let player = self.get_player(player_id).await?;
        let oldest_first = self.ledger.packages_oldest_first(&player.id).await?;
        let active_package = select_active_package(oldest_first.clone());

        let mut packages = oldest_first;
        packages.reverse();

        let attendance = self.attendance.player_attendance(&player.id).await?;

        Ok(PlayerDetail { player, active_package, packages, attendance })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
