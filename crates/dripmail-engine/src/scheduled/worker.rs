//! Scheduled Delivery Worker - Dispatches due one-off emails
//!
//! Each tick pulls a bounded batch of due rows, claims each one, and fans
//! the SMTP calls out under a concurrency limit. State is committed per
//! item, so one failure never aborts the batch.

use crate::dispatch::{Dispatcher, OutboundMessage, SmtpConnection};
use crate::vault::CredentialVault;
use dripmail_common::config::WorkerConfig;
use dripmail_common::{Error, Result};
use dripmail_storage::models::{MailAccount, ScheduledEmail};
use dripmail_storage::repository::{MailAccountRepository, ScheduledEmailRepository};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Outcome of one item within a tick
#[derive(Debug, Clone, Serialize)]
pub struct TickItemResult {
    pub id: Uuid,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one dispatch tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<TickItemResult>,
}

/// Scheduled email dispatch worker
#[derive(Clone)]
pub struct DispatchWorker {
    emails: ScheduledEmailRepository,
    accounts: MailAccountRepository,
    vault: CredentialVault,
    dispatcher: Dispatcher,
    batch_size: i64,
    concurrency: usize,
}

impl DispatchWorker {
    /// Create a new dispatch worker
    pub fn new(
        pool: PgPool,
        vault: CredentialVault,
        dispatcher: Dispatcher,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            emails: ScheduledEmailRepository::new(pool.clone()),
            accounts: MailAccountRepository::new(pool),
            vault,
            dispatcher,
            batch_size: config.batch_size,
            concurrency: config.concurrency,
        }
    }

    /// Process all due scheduled emails
    ///
    /// A failing due-item query is fatal for the tick; everything after that
    /// point is isolated per item.
    pub async fn run_tick(&self) -> Result<TickSummary> {
        let due = self
            .emails
            .fetch_due(self.batch_size)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        if due.is_empty() {
            return Ok(TickSummary::default());
        }

        debug!("Processing {} due scheduled emails", due.len());

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::new();

        for email in due {
            // claim before dispatch; an overlapping tick skips this row, and
            // a claim that errors only costs this one item
            match self.emails.claim(email.id).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    error!(id = %email.id, "Failed to claim scheduled email: {}", e);
                    continue;
                }
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                // the semaphore is never closed; nothing to do but move on
                continue;
            };
            let worker = self.clone();

            handles.push(tokio::spawn(async move {
                let result = worker.dispatch_one(&email).await;
                let outcome = worker.commit_outcome(&email, result).await;
                drop(permit);
                outcome
            }));
        }

        let mut summary = TickSummary::default();
        for handle in handles {
            match handle.await {
                Ok(result) => {
                    summary.processed += 1;
                    match result.status.as_str() {
                        "sent" => summary.sent += 1,
                        _ => summary.failed += 1,
                    }
                    summary.results.push(result);
                }
                Err(e) => error!("Dispatch task error: {}", e),
            }
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            "Scheduled email tick complete"
        );

        Ok(summary)
    }

    /// Resolve the account and hand the message to the dispatcher
    async fn dispatch_one(&self, email: &ScheduledEmail) -> std::result::Result<String, String> {
        let account = self
            .accounts
            .get_by_tenant(email.tenant_id, email.account_id)
            .await
            .map_err(|e| format!("Account lookup failed: {}", e))?
            .ok_or_else(|| "Mail account not found".to_string())?;

        if !account.active {
            return Err("Mail account is inactive".to_string());
        }

        let password = self
            .vault
            .decrypt(&account.encrypted_password)
            .map_err(|_| "Failed to decrypt account password".to_string())?;

        let connection = smtp_connection(&account, password);
        let message = build_message(&account, email);

        self.dispatcher
            .send(&connection, &message)
            .await
            .map_err(|e| e.to_string())
    }

    /// Write the item's final state back
    async fn commit_outcome(
        &self,
        email: &ScheduledEmail,
        result: std::result::Result<String, String>,
    ) -> TickItemResult {
        match result {
            Ok(message_id) => {
                debug!(id = %email.id, %message_id, "Scheduled email sent");
                if let Err(e) = self.emails.mark_sent(email.id).await {
                    error!(id = %email.id, "Failed to mark email as sent: {}", e);
                }
                TickItemResult {
                    id: email.id,
                    status: "sent".to_string(),
                    error: None,
                }
            }
            Err(reason) => {
                warn!(id = %email.id, "Scheduled email failed: {}", reason);
                if let Err(e) = self.emails.mark_failed(email.id, &reason).await {
                    error!(id = %email.id, "Failed to mark email as failed: {}", e);
                }
                TickItemResult {
                    id: email.id,
                    status: "failed".to_string(),
                    error: Some(reason),
                }
            }
        }
    }
}

fn smtp_connection(account: &MailAccount, password: String) -> SmtpConnection {
    let username = if account.username.is_empty() {
        account.from_address.clone()
    } else {
        account.username.clone()
    };

    SmtpConnection {
        host: account.smtp_host.clone(),
        port: account.smtp_port as u16,
        secure: account.smtp_secure,
        username,
        password,
    }
}

fn build_message(account: &MailAccount, email: &ScheduledEmail) -> OutboundMessage {
    // rows composed as plain text still go out with a simple html rendering
    let html_body = email.html_body.clone().or_else(|| {
        email
            .text_body
            .as_ref()
            .map(|text| format!("<p>{}</p>", text.replace('\n', "<br>")))
    });

    OutboundMessage {
        from_name: Some(account.name.clone()),
        from_address: account.from_address.clone(),
        to: email.to_address.clone(),
        cc: email.cc_address.clone(),
        bcc: email.bcc_address.clone(),
        subject: email.subject.clone(),
        text_body: email.text_body.clone(),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn account() -> MailAccount {
        let now = Utc::now();
        MailAccount {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Support".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 465,
            smtp_secure: true,
            imap_host: None,
            imap_port: None,
            imap_secure: false,
            username: String::new(),
            encrypted_password: "irrelevant".to_string(),
            from_address: "support@example.com".to_string(),
            from_name: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn email(account: &MailAccount) -> ScheduledEmail {
        let now = Utc::now();
        ScheduledEmail {
            id: Uuid::new_v4(),
            tenant_id: account.tenant_id,
            account_id: account.id,
            to_address: "a@example.com".to_string(),
            cc_address: None,
            bcc_address: None,
            subject: "Hi".to_string(),
            text_body: Some("line one\nline two".to_string()),
            html_body: None,
            attachments: None,
            scheduled_at: now,
            status: "pending".to_string(),
            attempts: 1,
            last_error: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_username_falls_back_to_from_address() {
        let account = account();
        let connection = smtp_connection(&account, "pw".to_string());

        assert_eq!(connection.username, "support@example.com");
        assert!(connection.secure);
        assert_eq!(connection.port, 465);
    }

    #[test]
    fn test_text_only_rows_get_simple_html() {
        let account = account();
        let email = email(&account);
        let message = build_message(&account, &email);

        assert_eq!(
            message.html_body.as_deref(),
            Some("<p>line one<br>line two</p>")
        );
        assert_eq!(message.text_body.as_deref(), Some("line one\nline two"));
        assert_eq!(message.from_name.as_deref(), Some("Support"));
    }

    #[test]
    fn test_stored_html_wins_over_derived() {
        let account = account();
        let mut email = email(&account);
        email.html_body = Some("<h1>Hello</h1>".to_string());

        let message = build_message(&account, &email);
        assert_eq!(message.html_body.as_deref(), Some("<h1>Hello</h1>"));
    }
}
