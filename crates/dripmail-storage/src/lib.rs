//! Dripmail Storage - Database access layer
//!
//! This crate provides the PostgreSQL pool wrapper, row models, and
//! per-entity repositories used by the outbound-messaging engine.

pub mod db;
pub mod models;
pub mod repository;

pub use db::{Database, DatabasePool};
pub use models::*;
pub use repository::*;
