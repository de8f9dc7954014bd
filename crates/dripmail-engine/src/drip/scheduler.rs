//! Campaign Drip Scheduler - Advances leads through ordered campaign steps
//!
//! One step per eligible lead per tick. A send step leaves the lead
//! immediately due again so back-to-back sends chain across ticks; a wait
//! step defers the lead by its delay. A lead with no step left completes.
//! Ticks are short and stateless: a crash mid-batch loses at most the
//! in-flight lead's step.

use crate::dispatch::{Dispatcher, OutboundMessage, SmtpConnection};
use crate::template::TemplateRenderer;
use crate::vault::CredentialVault;
use chrono::{DateTime, Duration, Utc};
use dripmail_common::config::WorkerConfig;
use dripmail_common::types::{CampaignId, StepKind, TenantId};
use dripmail_common::{Error, Result};
use dripmail_storage::models::{Campaign, CampaignLead, CampaignStep, RecordActivity};
use dripmail_storage::repository::{
    ActivityLogRepository, CampaignLeadRepository, CampaignRepository, MailAccountRepository,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info, warn};

/// Summary of one drip tick
#[derive(Debug, Clone, Default, Serialize)]
pub struct DripSummary {
    pub processed: usize,
    pub errors: usize,
    pub emails_sent: usize,
}

/// What the next eligible step means for a lead
#[derive(Debug, PartialEq, Eq)]
enum StepPlan {
    /// No step beyond the cursor: the lead is done
    Complete,
    /// Record the wait as done and defer the lead until the delay elapses
    Wait {
        to_step: i32,
        next_due: DateTime<Utc>,
    },
    /// Dispatch, then leave the lead immediately due for the step after
    Send { to_step: i32 },
}

/// Outcome of processing one lead
enum LeadOutcome {
    Completed,
    Waiting,
    Sent,
    /// Another tick claimed or advanced the lead first
    Skipped,
}

/// Campaign drip scheduler
#[derive(Clone)]
pub struct DripScheduler {
    campaigns: CampaignRepository,
    leads: CampaignLeadRepository,
    accounts: MailAccountRepository,
    activity: ActivityLogRepository,
    vault: CredentialVault,
    dispatcher: Dispatcher,
    renderer: TemplateRenderer,
    batch_size: i64,
    claim_secs: i64,
}

impl DripScheduler {
    /// Create a new drip scheduler
    pub fn new(
        pool: PgPool,
        vault: CredentialVault,
        dispatcher: Dispatcher,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            campaigns: CampaignRepository::new(pool.clone()),
            leads: CampaignLeadRepository::new(pool.clone()),
            accounts: MailAccountRepository::new(pool.clone()),
            activity: ActivityLogRepository::new(pool),
            vault,
            dispatcher,
            renderer: TemplateRenderer::new(),
            batch_size: config.batch_size,
            claim_secs: config.claim_secs,
        }
    }

    /// Advance all due leads across active campaigns
    pub async fn run_tick(&self) -> Result<DripSummary> {
        let due = self
            .leads
            .fetch_due(self.batch_size)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(self.process_leads(due).await)
    }

    /// Advance due leads of a single campaign within a tenant
    pub async fn run_campaign(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<DripSummary> {
        let campaign = self
            .campaigns
            .get_by_tenant(tenant_id, campaign_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound("Campaign not found".to_string()))?;

        if campaign.account_id.is_none() {
            return Err(Error::Validation(
                "Campaign has no mail account configured".to_string(),
            ));
        }

        let due = self
            .leads
            .fetch_due_for_campaign(tenant_id, campaign_id, self.batch_size)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(self.process_leads(due).await)
    }

    /// Process a batch of due leads sequentially
    ///
    /// Each lead's transition is independent; an error affects only its own
    /// lead, which stays deferred one claim window and is retried after.
    async fn process_leads(&self, due: Vec<CampaignLead>) -> DripSummary {
        let mut summary = DripSummary::default();

        for lead in due {
            match self.process_lead(&lead).await {
                Ok(LeadOutcome::Skipped) => {}
                Ok(LeadOutcome::Sent) => {
                    summary.processed += 1;
                    summary.emails_sent += 1;
                }
                Ok(LeadOutcome::Completed) | Ok(LeadOutcome::Waiting) => {
                    summary.processed += 1;
                }
                Err(e) => {
                    warn!(lead_id = %lead.id, "Error processing lead: {}", e);
                    summary.errors += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            errors = summary.errors,
            emails_sent = summary.emails_sent,
            "Drip tick complete"
        );

        summary
    }

    /// Advance one lead by at most one step
    async fn process_lead(&self, lead: &CampaignLead) -> Result<LeadOutcome> {
        let now = Utc::now();

        // claim first: the deferral window keeps an overlapping tick (and a
        // failed dispatch) from immediately re-selecting this lead
        let claimed = self
            .leads
            .claim(lead.id, now + Duration::seconds(self.claim_secs))
            .await
            .map_err(|e| Error::Database(e.to_string()))?;
        if !claimed {
            return Ok(LeadOutcome::Skipped);
        }

        let campaign = self
            .campaigns
            .get(lead.campaign_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound("Campaign not found".to_string()))?;

        let step = self
            .campaigns
            .next_step(lead.campaign_id, lead.current_step)
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        match plan_step(step.as_ref(), now)? {
            StepPlan::Complete => {
                let done = self
                    .leads
                    .complete(lead.id, lead.current_step)
                    .await
                    .map_err(|e| Error::Database(e.to_string()))?;
                if !done {
                    return Ok(LeadOutcome::Skipped);
                }

                debug!(lead_id = %lead.id, "Lead completed campaign");
                self.record(&campaign, lead, "campaign_completed", "Campaign completed for this lead")
                    .await;

                Ok(LeadOutcome::Completed)
            }
            StepPlan::Wait { to_step, next_due } => {
                let advanced = self
                    .leads
                    .advance(lead.id, lead.current_step, to_step, next_due)
                    .await
                    .map_err(|e| Error::Database(e.to_string()))?;
                if !advanced {
                    return Ok(LeadOutcome::Skipped);
                }

                self.record(
                    &campaign,
                    lead,
                    "campaign_delay_started",
                    &format!("Waiting until {} after step {}", next_due, to_step),
                )
                .await;

                Ok(LeadOutcome::Waiting)
            }
            StepPlan::Send { to_step } => {
                let step = step
                    .as_ref()
                    .ok_or_else(|| Error::Internal("Send plan without a step".to_string()))?;

                let subject = match self.send_step(&campaign, lead, step).await {
                    Ok(subject) => subject,
                    Err(e) => {
                        // leave the cursor where it is; the claim window
                        // defers the retry instead of re-selecting immediately
                        self.record(
                            &campaign,
                            lead,
                            "campaign_error",
                            &format!("Error at step {}: {}", to_step, e),
                        )
                        .await;
                        return Err(e);
                    }
                };

                // sent-count bookkeeping is best-effort
                if let Err(e) = self.campaigns.increment_sent_count(campaign.id, 1).await {
                    warn!(campaign_id = %campaign.id, "Failed to increment sent count: {}", e);
                }

                // immediately due again so the following step runs next tick
                let advanced = self
                    .leads
                    .advance(lead.id, lead.current_step, to_step, now)
                    .await
                    .map_err(|e| Error::Database(e.to_string()))?;
                if !advanced {
                    warn!(lead_id = %lead.id, "Cursor moved during dispatch; possible duplicate send");
                }

                self.record(
                    &campaign,
                    lead,
                    "campaign_email_sent",
                    &format!("Sent step {}: {}", to_step, subject),
                )
                .await;

                Ok(LeadOutcome::Sent)
            }
        }
    }

    /// Render and dispatch one send step, returning the rendered subject
    async fn send_step(
        &self,
        campaign: &Campaign,
        lead: &CampaignLead,
        step: &CampaignStep,
    ) -> Result<String> {
        let account_id = campaign.account_id.ok_or_else(|| {
            Error::Validation("Campaign has no mail account configured".to_string())
        })?;

        let account = self
            .accounts
            .get_by_tenant(campaign.tenant_id, account_id)
            .await
            .map_err(|e| Error::Database(e.to_string()))?
            .ok_or_else(|| Error::NotFound("Mail account not found".to_string()))?;

        if !account.active {
            return Err(Error::InvalidState("Mail account is inactive".to_string()));
        }

        let password = self
            .vault
            .decrypt(&account.encrypted_password)
            .map_err(|_| Error::Internal("Failed to decrypt account password".to_string()))?;

        let vars = self.renderer.lead_variables(&lead.lead_email);
        let subject = self
            .renderer
            .render(step.subject.as_deref().unwrap_or_default(), &vars);
        let html = self
            .renderer
            .render(step.html_body.as_deref().unwrap_or_default(), &vars);
        let text = self.renderer.strip_tags(&html);

        let username = if account.username.is_empty() {
            account.from_address.clone()
        } else {
            account.username.clone()
        };

        let connection = SmtpConnection {
            host: account.smtp_host.clone(),
            port: account.smtp_port as u16,
            secure: account.smtp_secure,
            username,
            password,
        };

        let message = OutboundMessage {
            from_name: Some(campaign.name.clone()),
            from_address: account.from_address.clone(),
            to: lead.lead_email.clone(),
            cc: None,
            bcc: None,
            subject: subject.clone(),
            text_body: Some(text),
            html_body: Some(html),
        };

        self.dispatcher
            .send(&connection, &message)
            .await
            .map_err(|e| Error::Dispatch(e.to_string()))?;

        Ok(subject)
    }

    async fn record(&self, campaign: &Campaign, lead: &CampaignLead, kind: &str, description: &str) {
        self.activity
            .record(RecordActivity {
                tenant_id: campaign.tenant_id,
                actor_id: campaign.created_by,
                kind: kind.to_string(),
                description: description.to_string(),
                subject_type: "campaign_lead".to_string(),
                subject_id: Some(lead.id),
            })
            .await;
    }
}

/// Decide what the next step means for a lead
///
/// Wait steps with no stored delay fall back to one hour.
fn plan_step(step: Option<&CampaignStep>, now: DateTime<Utc>) -> Result<StepPlan> {
    let Some(step) = step else {
        return Ok(StepPlan::Complete);
    };

    match StepKind::parse(&step.kind) {
        Some(StepKind::Wait) => {
            let delay = step.delay_seconds.unwrap_or(3600);
            Ok(StepPlan::Wait {
                to_step: step.step_order,
                next_due: now + Duration::seconds(delay),
            })
        }
        Some(StepKind::Send) => Ok(StepPlan::Send {
            to_step: step.step_order,
        }),
        None => Err(Error::Internal(format!(
            "Unknown step kind: {}",
            step.kind
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn step(order: i32, kind: &str, delay: Option<i64>) -> CampaignStep {
        CampaignStep {
            id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            step_order: order,
            kind: kind.to_string(),
            subject: Some("Hi {{firstname}}".to_string()),
            html_body: Some("<p>Hello {{email}}</p>".to_string()),
            delay_seconds: delay,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_step_completes_lead() {
        let now = Utc::now();
        assert_eq!(plan_step(None, now).unwrap(), StepPlan::Complete);
    }

    #[test]
    fn test_wait_step_defers_by_delay() {
        let now = Utc::now();
        let wait = step(2, "wait", Some(60));

        match plan_step(Some(&wait), now).unwrap() {
            StepPlan::Wait { to_step, next_due } => {
                assert_eq!(to_step, 2);
                assert_eq!(next_due, now + Duration::seconds(60));
            }
            other => panic!("expected wait plan, got {:?}", other),
        }
    }

    #[test]
    fn test_wait_step_defaults_to_an_hour() {
        let now = Utc::now();
        let wait = step(1, "wait", None);

        match plan_step(Some(&wait), now).unwrap() {
            StepPlan::Wait { next_due, .. } => {
                assert_eq!(next_due, now + Duration::seconds(3600));
            }
            other => panic!("expected wait plan, got {:?}", other),
        }
    }

    #[test]
    fn test_send_step_advances_cursor_only() {
        let now = Utc::now();
        let send = step(3, "send", None);

        assert_eq!(
            plan_step(Some(&send), now).unwrap(),
            StepPlan::Send { to_step: 3 }
        );
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let now = Utc::now();
        let bad = step(1, "sms", None);

        assert!(plan_step(Some(&bad), now).is_err());
    }

    #[test]
    fn test_steps_never_skip() {
        // the plan always targets the single next step, whatever the cursor
        let now = Utc::now();
        let next = step(2, "send", None);

        match plan_step(Some(&next), now).unwrap() {
            StepPlan::Send { to_step } => assert_eq!(to_step, 2),
            other => panic!("expected send plan, got {:?}", other),
        }
    }
}
