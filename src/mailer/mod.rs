//! Outbound SMTP.
//!
//! The relay only decides *who* sends *what*; moving bytes to Microsoft's
//! submission endpoint is behind [`MailTransport`] so tests can substitute an
//! in-process recorder.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MessageBuilder, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{config::MailConfig, error::AppError};

/// Mailbox login used to authenticate the SMTP session.
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from_email: String,
    pub from_name: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("smtp transport error: {0}")]
    Transport(String),
    #[error("smtp send timed out after {0}s")]
    Timeout(u64),
}

impl From<DeliveryError> for AppError {
    fn from(err: DeliveryError) -> Self {
        AppError::delivery_failed(err.to_string())
    }
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        credentials: &SmtpCredentials,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError>;
}

/// Sends once, bounded by `timeout`. No retry.
pub async fn deliver(
    transport: &dyn MailTransport,
    credentials: &SmtpCredentials,
    message: &OutgoingMessage,
    timeout: Duration,
) -> Result<(), DeliveryError> {
    match tokio::time::timeout(timeout, transport.send(credentials, message)).await {
        Ok(result) => result,
        Err(_) => Err(DeliveryError::Timeout(timeout.as_secs())),
    }
}

/// STARTTLS submission against the configured Microsoft host.
#[derive(Debug, Clone)]
pub struct LettreTransport {
    host: String,
    port: u16,
}

impl LettreTransport {
    pub fn new(cfg: &MailConfig) -> Self {
        Self {
            host: cfg.smtp_host.clone(),
            port: cfg.smtp_port,
        }
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn send(
        &self,
        credentials: &SmtpCredentials,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        let email = build_message(message)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
            .map_err(|err| DeliveryError::Transport(format!("SMTP setup failed: {err}")))?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .build();

        transport
            .send(email)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        Ok(())
    }
}

fn mailbox(name: Option<&str>, address: &str) -> Result<Mailbox, DeliveryError> {
    let address = address
        .parse()
        .map_err(|err| DeliveryError::InvalidMessage(format!("bad address {address:?}: {err}")))?;
    Ok(Mailbox::new(name.map(str::to_string), address))
}

pub(crate) fn build_message(message: &OutgoingMessage) -> Result<Message, DeliveryError> {
    let mut builder: MessageBuilder = Message::builder()
        .from(mailbox(message.from_name.as_deref(), &message.from_email)?)
        .subject(message.subject.clone())
        .header(if message.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        });

    for to in &message.to {
        builder = builder.to(mailbox(None, to)?);
    }
    for cc in &message.cc {
        builder = builder.cc(mailbox(None, cc)?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(mailbox(None, bcc)?);
    }

    builder
        .body(message.body.clone())
        .map_err(|err| DeliveryError::InvalidMessage(err.to_string()))
}

/// Splits a comma separated address list, dropping blanks.
pub fn parse_address_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{
        DeliveryError, MailTransport, OutgoingMessage, SmtpCredentials, build_message, deliver,
        parse_address_list,
    };

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            from_email: "sales@example.com".to_string(),
            from_name: Some("Sales".to_string()),
            to: vec!["a@example.net".to_string(), "b@example.net".to_string()],
            cc: vec![],
            bcc: vec!["audit@example.net".to_string()],
            subject: "Quote".to_string(),
            body: "<p>Hi</p>".to_string(),
            is_html: true,
        }
    }

    fn credentials() -> SmtpCredentials {
        SmtpCredentials {
            username: "mailbox@example.com".to_string(),
            password: "pw".to_string(),
        }
    }

    struct Stalled;

    #[async_trait]
    impl MailTransport for Stalled {
        async fn send(
            &self,
            _credentials: &SmtpCredentials,
            _message: &OutgoingMessage,
        ) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[test]
    fn address_lists_are_split_and_trimmed() {
        assert_eq!(
            parse_address_list(Some(" a@x.com, ,b@y.com ,")),
            vec!["a@x.com".to_string(), "b@y.com".to_string()]
        );
        assert!(parse_address_list(None).is_empty());
    }

    #[test]
    fn builds_message_with_display_name() {
        let built = build_message(&message()).expect("message should build");
        let raw = String::from_utf8(built.formatted()).expect("utf8");

        assert!(raw.contains("Sales"));
        assert!(raw.contains("<sales@example.com>"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(!raw.contains("audit@example.net"), "bcc must not leak into headers");
    }

    #[test]
    fn malformed_recipient_is_invalid_message() {
        let mut msg = message();
        msg.to = vec!["not an address".to_string()];

        let err = build_message(&msg).expect_err("build should fail");
        assert!(matches!(err, DeliveryError::InvalidMessage(_)));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("\"pw\""));
    }

    #[tokio::test]
    async fn deliver_times_out() {
        let err = deliver(&Stalled, &credentials(), &message(), Duration::from_millis(50))
            .await
            .expect_err("send should time out");
        assert!(matches!(err, DeliveryError::Timeout(_)));
    }
}
