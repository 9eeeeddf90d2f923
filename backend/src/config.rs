//! # Configuration
//!
//! Settings come from an optional YAML file, then environment variables.
//!
//! ```yaml
//! server:
//!   bind: "127.0.0.1:3000"
//!   cors_origin: "http://localhost:8080"
//! database_url: "sqlite://camp-ledger.db"   # or "memory"
//! log_level: "info"
//! ledger:
//!   allow_duplicate_same_day_check_in: true
//! expense_list_limit: 50
//! catalog:
//!   - name: "5-Session Pack"
//!     sessions_included: 5
//!     price_cents: 7500
//! ```
//!
//! Environment overrides: `CAMP_LEDGER_BIND`, `CAMP_LEDGER_DATABASE_URL`,
//! `CAMP_LEDGER_LOG`. The file path is `CAMP_LEDGER_CONFIG`, default
//! `camp-ledger.yaml`; a missing file means defaults.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::expense_service::DEFAULT_EXPENSE_LIST_LIMIT;
use crate::domain::{CatalogSeed, LedgerPolicy};

pub const CONFIG_PATH_ENV: &str = "CAMP_LEDGER_CONFIG";
pub const BIND_ENV: &str = "CAMP_LEDGER_BIND";
pub const DATABASE_URL_ENV: &str = "CAMP_LEDGER_DATABASE_URL";
pub const LOG_ENV: &str = "CAMP_LEDGER_LOG";

pub const DEFAULT_CONFIG_PATH: &str = "camp-ledger.yaml";

/// `database_url` value that selects the in-memory store
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Origin allowed by CORS; `None` allows any origin
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_origin: Some("http://localhost:8080".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub log_level: String,
    pub ledger: LedgerPolicy,
    pub expense_list_limit: u32,
    /// Catalog entries created at startup when missing
    pub catalog: Vec<CatalogSeed>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database_url: "sqlite://camp-ledger.db".to_string(),
            log_level: "info".to_string(),
            ledger: LedgerPolicy::default(),
            expense_list_limit: DEFAULT_EXPENSE_LIST_LIMIT,
            catalog: default_catalog(),
        }
    }
}

fn default_catalog() -> Vec<CatalogSeed> {
    vec![
        CatalogSeed { name: "Single Session".to_string(), sessions_included: 1, price_cents: 2000 },
        CatalogSeed { name: "5-Session Pack".to_string(), sessions_included: 5, price_cents: 9000 },
        CatalogSeed { name: "10-Session Pack".to_string(), sessions_included: 10, price_cents: 16000 },
    ]
}

impl AppConfig {
    /// Load the file named by `CAMP_LEDGER_CONFIG` (if present) and apply the
    /// environment overrides
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::load(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read a YAML config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let yaml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Invalid config file {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment overrides; `lookup` returns the variable's value
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(bind) = value(BIND_ENV) {
            self.server.bind = bind;
        }
        if let Some(url) = value(DATABASE_URL_ENV) {
            self.database_url = url;
        }
        if let Some(level) = value(LOG_ENV) {
            self.log_level = level;
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE
    }
}
