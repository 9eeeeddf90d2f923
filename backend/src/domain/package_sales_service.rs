//! # Package Sales Service
//!
//! The catalog of purchasable plans and the act of selling one to a player.
//! A sale snapshots the catalog's session count and price into the new
//! purchase, so editing the catalog later never changes what a player owns.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::commands::sales::{SellPackageCommand, SellPackageResult};
use crate::domain::errors::{DomainResult, LogicError};
use crate::domain::models::package::{CatalogPackage, PlayerPackage};
use crate::domain::models::{from_row, from_rows, into_row};
use crate::domain::roster_service::RosterService;
use crate::storage::{Filter, Order, Query, RecordStore, StoreError, Table};

/// A catalog entry to create at startup if no entry with that name exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    pub name: String,
    pub sessions_included: i64,
    pub price_cents: i64,
}

/// Service for the package catalog and package sales
#[derive(Clone)]
pub struct PackageSalesService {
    store: Arc<dyn RecordStore>,
    roster: RosterService,
}

impl PackageSalesService {
    pub fn new(store: Arc<dyn RecordStore>, roster: RosterService) -> Self {
        Self { store, roster }
    }

    /// All catalog packages, smallest first
    pub async fn list_catalog(&self) -> DomainResult<Vec<CatalogPackage>> {
        info!("Listing package catalog");

        let query = Query::new()
            .order_by(Order::asc("sessions_included"))
            .order_by(Order::asc("price_cents"));
        let rows = self.store.find(Table::Packages, &query).await?;
        let packages: Vec<CatalogPackage> = from_rows(Table::Packages, rows)?;

        info!("Found {} catalog packages", packages.len());
        Ok(packages)
    }

    /// Insert every seed whose name is not in the catalog yet. Returns how
    /// many were added.
    pub async fn seed_catalog(&self, seeds: &[CatalogSeed]) -> DomainResult<usize> {
        let existing: HashSet<String> = self
            .list_catalog()
            .await?
            .into_iter()
            .map(|package| package.name)
            .collect();

        let rows: Vec<_> = seeds
            .iter()
            .filter(|seed| !existing.contains(&seed.name))
            .filter(|seed| {
                let valid = seed.sessions_included > 0 && seed.price_cents >= 0;
                if !valid {
                    warn!("Skipping invalid catalog seed '{}'", seed.name);
                }
                valid
            })
            .map(|seed| {
                into_row(json!({
                    "name": seed.name,
                    "sessions_included": seed.sessions_included,
                    "price_cents": seed.price_cents,
                }))
            })
            .collect();

        if rows.is_empty() {
            return Ok(0);
        }

        let inserted = self.store.insert(Table::Packages, rows).await?;
        info!("Seeded {} catalog packages", inserted.len());
        Ok(inserted.len())
    }

    /// Sell a catalog package to a player
    pub async fn sell_package(&self, command: SellPackageCommand) -> DomainResult<SellPackageResult> {
        let player_id = command.player_id.trim();
        let package_id = command.package_id.trim();

        // Validate the command
        if player_id.is_empty() {
            return Err(LogicError::MissingPlayer.into());
        }
        if package_id.is_empty() {
            return Err(LogicError::MissingPackage.into());
        }

        info!("Selling package {} to player {}", package_id, player_id);

        let package = self.get_catalog_package(package_id).await?;
        let player = self.roster.get_player(player_id).await?;

        let row = into_row(json!({
            "player_id": player.id,
            "package_id": package.id,
            "sessions_total": package.sessions_included,
            "sessions_used": 0,
            "price_cents": package.price_cents,
        }));
        let inserted = self.store.insert(Table::PlayerPackages, vec![row]).await?;
        let player_package: PlayerPackage = match inserted.into_iter().next() {
            Some(row) => from_row(Table::PlayerPackages, row)?,
            None => {
                return Err(StoreError::Rejected("Package sale returned no row".to_string()).into())
            }
        };

        let success_message = format!(
            "Sold {} to {} {}.",
            package.name, player.first_name, player.last_name
        );
        info!("{} Purchase ID: {}", success_message, player_package.id);

        Ok(SellPackageResult { player_package, player, package, success_message })
    }

    async fn get_catalog_package(&self, package_id: &str) -> DomainResult<CatalogPackage> {
        let query = Query::new().filter(Filter::eq("id", package_id)).limit(1);
        let rows = self.store.find(Table::Packages, &query).await?;

        match rows.into_iter().next() {
            Some(row) => Ok(from_row(Table::Packages, row)?),
            None => {
                warn!("Catalog package not found: {}", package_id);
                Err(LogicError::PackageNotFound(package_id.to_string()).into())
            }
        }
    }
}
