//! Dripmail Engine - Time-driven outbound messaging
//!
//! The engine has four parts: the credential vault (symmetric encryption of
//! mail-account passwords), the outbound dispatcher (per-call SMTP
//! submission), the scheduled-email state machine (one-off sends at a future
//! instant), and the campaign drip scheduler (per-lead step advancement).
//! All progress is persisted; ticks hold no state between invocations.

pub mod dispatch;
pub mod drip;
pub mod scheduled;
pub mod template;
pub mod vault;

pub use dispatch::{DispatchError, Dispatcher, OutboundMessage, SmtpConnection};
pub use drip::{DripScheduler, DripSummary};
pub use scheduled::{
    CreateScheduledEmailRequest, DispatchWorker, ScheduledEmailManager, TickItemResult,
    TickSummary, UpdateScheduledEmailRequest,
};
pub use template::TemplateRenderer;
pub use vault::{CredentialVault, VaultError};
