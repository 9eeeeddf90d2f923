//! # Attendance Service
//!
//! Read side of check-ins: today's list for the front desk and a player's
//! history. Writing attendance belongs to the package ledger.

use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{format_date, Clock};
use crate::domain::commands::attendance::{TodayCheckIn, TodayCheckInsResult, UNKNOWN_PLAYER};
use crate::domain::errors::DomainResult;
use crate::domain::models::attendance::AttendanceRecord;
use crate::domain::models::from_rows;
use crate::domain::models::player::Player;
use crate::storage::{Filter, Order, Query, RecordStore, Table};

/// Service for reading attendance
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Check-ins dated today, newest first, with the player's name
    pub async fn todays_check_ins(&self) -> TodayCheckInsResult {
        let date = self.clock.today();
        info!("Loading check-ins for {}", date);

        match self.check_ins_on(&format_date(date)).await {
            Ok(check_ins) => {
                info!("Found {} check-ins for {}", check_ins.len(), date);
                TodayCheckInsResult { date, check_ins, message: None }
            }
            Err(e) => {
                error!("Failed to load today's check-ins: {}", e);
                TodayCheckInsResult { date, check_ins: Vec::new(), message: Some(e.to_string()) }
            }
        }
    }

    async fn check_ins_on(&self, date: &str) -> DomainResult<Vec<TodayCheckIn>> {
        let query = Query::new()
            .filter(Filter::eq("date", date))
            .order_by(Order::desc("created_at"));
        let rows = self.store.find(Table::Attendance, &query).await?;
        let records: Vec<AttendanceRecord> = from_rows(Table::Attendance, rows)?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        // One read for all names
        let mut player_ids: Vec<String> = records.iter().map(|r| r.player_id.clone()).collect();
        player_ids.sort();
        player_ids.dedup();
        let query = Query::new().filter(Filter::is_in("id", player_ids));
        let rows = self.store.find(Table::Players, &query).await?;
        let names: HashMap<String, String> = from_rows::<Player>(Table::Players, rows)?
            .into_iter()
            .map(|p| (p.id.clone(), p.full_name()))
            .collect();

        Ok(records
            .into_iter()
            .map(|record| {
                let player_name = names
                    .get(&record.player_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_PLAYER.to_string());
                TodayCheckIn { record, player_name }
            })
            .collect())
    }

    /// A player's attendance, most recent date first
    pub async fn player_attendance(&self, player_id: &str) -> DomainResult<Vec<AttendanceRecord>> {
        let query = Query::new()
            .filter(Filter::eq("player_id", player_id))
            .order_by(Order::desc("date"))
            .order_by(Order::desc("created_at"));
        let rows = self.store.find(Table::Attendance, &query).await?;
        Ok(from_rows(Table::Attendance, rows)?)
    }
}
