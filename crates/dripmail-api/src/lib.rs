//! Dripmail API - REST surface for the outbound-messaging engine
//!
//! Exposes scheduled-email CRUD, campaign reads, and the externally
//! triggered worker tick endpoints.

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::AppState;
pub use routes::create_router;
