//! Campaign Drip Module - Per-lead step advancement over time

mod scheduler;

pub use scheduler::{DripScheduler, DripSummary};
