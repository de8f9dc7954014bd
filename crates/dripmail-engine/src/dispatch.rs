//! Outbound Mail Dispatcher - Per-call SMTP submission
//!
//! Stateless: each send opens a transient connection, authenticates,
//! transmits, and closes. Retry policy belongs to the callers.

use chrono::Utc;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Dispatch errors
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid message: {0}")]
    Invalid(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Connection parameters for one outbound account
///
/// `secure` selects implicit TLS (the port-465 convention made explicit);
/// otherwise STARTTLS is required. The password arrives already decrypted.
#[derive(Debug, Clone)]
pub struct SmtpConnection {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub username: String,
    pub password: String,
}

/// A composed outbound message
///
/// `to`, `cc`, and `bcc` accept comma-separated address lists.
#[derive(Debug, Clone, Default)]
pub struct OutboundMessage {
    pub from_name: Option<String>,
    pub from_address: String,
    pub to: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

/// Outbound mail dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    /// Bound on each transport call so a stuck peer cannot stall a tick
    timeout: Duration,
    /// Hostname used in generated Message-IDs
    hostname: String,
}

impl Dispatcher {
    /// Create a new dispatcher
    pub fn new(timeout: Duration, hostname: impl Into<String>) -> Self {
        Self {
            timeout,
            hostname: hostname.into(),
        }
    }

    /// Send a message through the given account connection
    ///
    /// Returns the generated Message-ID on acceptance. Transport errors carry
    /// the transport's own error text; no transient/permanent classification
    /// happens here.
    pub async fn send(
        &self,
        connection: &SmtpConnection,
        message: &OutboundMessage,
    ) -> Result<String, DispatchError> {
        validate(message)?;

        let from = parse_from(message)?;
        let to = parse_address_list(&message.to)?;
        let cc = parse_optional_list(message.cc.as_deref())?;
        let bcc = parse_optional_list(message.bcc.as_deref())?;

        let mut builder = Message::builder().from(from).subject(&message.subject);
        for mailbox in to {
            builder = builder.to(mailbox);
        }
        for mailbox in cc {
            builder = builder.cc(mailbox);
        }
        for mailbox in bcc {
            builder = builder.bcc(mailbox);
        }

        let email = match (&message.html_body, &message.text_body) {
            (Some(html), Some(text)) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(text.clone()))
                    .singlepart(SinglePart::html(html.clone())),
            ),
            (Some(html), None) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
            (None, Some(text)) => builder.header(ContentType::TEXT_PLAIN).body(text.clone()),
            (None, None) => unreachable!("validated above"),
        }
        .map_err(|e| DispatchError::Build(e.to_string()))?;

        let message_id = format!(
            "<{}.{}@{}>",
            Uuid::new_v4(),
            Utc::now().timestamp(),
            self.hostname
        );

        let transport = if connection.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&connection.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&connection.host)
        }
        .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let mailer = transport
            .port(connection.port)
            .credentials(Credentials::new(
                connection.username.clone(),
                connection.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        Ok(message_id)
    }
}

/// Fail fast on messages no transport call should ever see
fn validate(message: &OutboundMessage) -> Result<(), DispatchError> {
    if message.to.trim().is_empty() {
        return Err(DispatchError::Invalid(
            "At least one recipient is required".to_string(),
        ));
    }

    if message.subject.trim().is_empty() {
        return Err(DispatchError::Invalid("Subject is required".to_string()));
    }

    if message.text_body.is_none() && message.html_body.is_none() {
        return Err(DispatchError::Invalid(
            "Either text or html body is required".to_string(),
        ));
    }

    Ok(())
}

fn parse_from(message: &OutboundMessage) -> Result<Mailbox, DispatchError> {
    let address = message
        .from_address
        .parse()
        .map_err(|e| DispatchError::Address(format!("Invalid from address: {}", e)))?;

    Ok(Mailbox::new(message.from_name.clone(), address))
}

fn parse_address_list(list: &str) -> Result<Vec<Mailbox>, DispatchError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Mailbox>()
                .map_err(|e| DispatchError::Address(format!("Invalid address {}: {}", s, e)))
        })
        .collect()
}

fn parse_optional_list(list: Option<&str>) -> Result<Vec<Mailbox>, DispatchError> {
    match list {
        Some(list) => parse_address_list(list),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message() -> OutboundMessage {
        OutboundMessage {
            from_name: Some("Acme Outreach".to_string()),
            from_address: "outreach@acme.example".to_string(),
            to: "a@example.com".to_string(),
            subject: "Hi".to_string(),
            text_body: Some("hello".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_requires_recipient() {
        let mut m = message();
        m.to = "  ".to_string();
        assert!(matches!(validate(&m), Err(DispatchError::Invalid(_))));
    }

    #[test]
    fn test_validate_requires_subject() {
        let mut m = message();
        m.subject = String::new();
        assert!(matches!(validate(&m), Err(DispatchError::Invalid(_))));
    }

    #[test]
    fn test_validate_requires_some_body() {
        let mut m = message();
        m.text_body = None;
        m.html_body = None;
        assert!(matches!(validate(&m), Err(DispatchError::Invalid(_))));
    }

    #[test]
    fn test_validate_accepts_html_only() {
        let mut m = message();
        m.text_body = None;
        m.html_body = Some("<p>hello</p>".to_string());
        assert!(validate(&m).is_ok());
    }

    #[test]
    fn test_parse_address_list_splits_commas() {
        let mailboxes = parse_address_list("a@example.com, b@example.com").unwrap();
        assert_eq!(mailboxes.len(), 2);
    }

    #[test]
    fn test_parse_address_list_rejects_garbage() {
        assert!(matches!(
            parse_address_list("not-an-address"),
            Err(DispatchError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_send_fails_fast_without_connecting() {
        // an invalid message must be rejected before any network activity;
        // the host below would hang if a connection were attempted
        let dispatcher = Dispatcher::new(Duration::from_secs(30), "test.local");
        let connection = SmtpConnection {
            host: "smtp.invalid".to_string(),
            port: 587,
            secure: false,
            username: "user".to_string(),
            password: "pass".to_string(),
        };

        let mut m = message();
        m.text_body = None;
        m.html_body = None;

        let err = dispatcher.send(&connection, &m).await.unwrap_err();
        assert!(matches!(err, DispatchError::Invalid(_)));
    }
}
