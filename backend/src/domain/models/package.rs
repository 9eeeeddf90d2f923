use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry: what can be sold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPackage {
    pub id: String,
    pub name: String,
    pub sessions_included: i64,
    pub price_cents: i64,
}

/// A package a player bought. Session count and price are copied from the
/// catalog at purchase time; later catalog changes do not affect it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerPackage {
    pub id: String,
    pub player_id: String,
    pub package_id: Option<String>,
    pub sessions_total: i64,
    pub sessions_used: i64,
    pub price_cents: i64,
    pub purchased_at: DateTime<Utc>,
}

impl PlayerPackage {
    /// Still has sessions left to consume
    pub fn is_active(&self) -> bool {
        self.sessions_used < self.sessions_total
    }

    pub fn sessions_remaining(&self) -> i64 {
        (self.sessions_total - self.sessions_used).max(0)
    }
}

/// The package that backs a player's next check-in: the earliest purchase
/// that still has sessions left. Ties keep the input order.
pub fn select_active_package<I>(packages: I) -> Option<PlayerPackage>
where
    I: IntoIterator<Item = PlayerPackage>,
{
    packages
        .into_iter()
        .filter(PlayerPackage::is_active)
        .min_by(|a, b| a.purchased_at.cmp(&b.purchased_at))
}
