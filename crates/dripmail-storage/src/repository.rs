//! Repository layer for data access

pub mod activity;
pub mod campaign_leads;
pub mod campaigns;
pub mod mail_accounts;
pub mod scheduled_emails;

pub use activity::ActivityLogRepository;
pub use campaign_leads::CampaignLeadRepository;
pub use campaigns::CampaignRepository;
pub use mail_accounts::MailAccountRepository;
pub use scheduled_emails::ScheduledEmailRepository;
