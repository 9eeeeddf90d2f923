//! Error types for the domain layer.
//!
//! Two kinds only: the store failed ([`StoreError`]) or the caller broke a
//! precondition ([`LogicError`]). Messages are written to be shown to the
//! user unchanged.

use crate::storage::StoreError;

/// A precondition or validation failure. Nothing was written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LogicError {
    #[error("Select a player first.")]
    MissingPlayer,
    #[error("Select a package to sell.")]
    MissingPackage,
    #[error("Player not found: {0}")]
    PlayerNotFound(String),
    #[error("Selected package not found.")]
    PackageNotFound(String),
    #[error("First name and last name are required.")]
    MissingName,
    #[error("{field} cannot exceed {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("Please select a category.")]
    MissingCategory,
    #[error("Please enter a valid amount in dollars.")]
    InvalidAmount(String),
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
    #[error("Player {player_id} is already checked in for {date}")]
    AlreadyCheckedIn { player_id: String, date: String },
}

impl LogicError {
    /// True for the variants that mean "the thing you referred to does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, LogicError::PlayerNotFound(_) | LogicError::PackageNotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Logic(#[from] LogicError),
}

pub type DomainResult<T> = Result<T, DomainError>;
