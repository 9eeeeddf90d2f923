//! Conversions between domain models and the `shared` DTOs

pub mod check_in_mapper;
pub mod expense_mapper;
pub mod package_mapper;
pub mod player_mapper;
pub mod summary_mapper;
