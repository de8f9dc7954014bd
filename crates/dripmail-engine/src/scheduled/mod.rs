//! Scheduled Email Module - One-off sends at a precise future instant

mod manager;
mod worker;

pub use manager::{CreateScheduledEmailRequest, ScheduledEmailManager, UpdateScheduledEmailRequest};
pub use worker::{DispatchWorker, TickItemResult, TickSummary};
