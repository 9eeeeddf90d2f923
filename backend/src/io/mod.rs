//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handlers turn
//! JSON requests into domain commands, call one service, and map the result
//! (or the domain error) back into a `shared` DTO with a status code.

pub mod rest;

pub use rest::*;
