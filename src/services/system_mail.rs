use std::{sync::Arc, time::Duration};

use askama::Template;

use crate::{
    auth::secrets::SINGLE_USE_TOKEN_TTL_MINUTES,
    error::AppError,
    mailer::{MailTransport, OutgoingMessage, deliver},
    services::sender_service::{ResolvedSender, SenderService},
};

#[derive(Template)]
#[template(path = "system_email.html")]
struct SystemEmailTemplate<'a> {
    heading: &'a str,
    intro: &'a str,
    action_url: &'a str,
    action_label: &'a str,
    expiry_minutes: i64,
    footer: &'a str,
}

/// Verification and reset mail, sent from the configured default sender.
#[derive(Clone)]
pub struct SystemMailer {
    senders: SenderService,
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
    app_base_url: String,
}

impl SystemMailer {
    pub fn new(
        senders: SenderService,
        transport: Arc<dyn MailTransport>,
        timeout: Duration,
        app_base_url: String,
    ) -> Self {
        Self {
            senders,
            transport,
            timeout,
            app_base_url,
        }
    }

    /// Fails with `SenderInactive` when no usable default sender exists.
    pub async fn sender(&self) -> Result<ResolvedSender, AppError> {
        self.senders.system_sender().await
    }

    pub async fn send_verification(
        &self,
        sender: &ResolvedSender,
        to: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/signup/verify?token={token}", self.app_base_url);
        let body = render(SystemEmailTemplate {
            heading: "Confirm your email",
            intro: "Someone signed up for a mail relay account with this address. Confirm it to activate the account.",
            action_url: &url,
            action_label: "Verify email",
            expiry_minutes: SINGLE_USE_TOKEN_TTL_MINUTES,
            footer: "If you did not sign up, you can ignore this message.",
        })?;
        self.send(sender, to, "Verify your email address", body)
            .await
    }

    pub async fn send_password_reset(
        &self,
        sender: &ResolvedSender,
        to: &str,
        token: &str,
    ) -> Result<(), AppError> {
        let url = format!("{}/reset-password?token={token}", self.app_base_url);
        let body = render(SystemEmailTemplate {
            heading: "Reset your password",
            intro: "A password reset was requested for your mail relay account.",
            action_url: &url,
            action_label: "Choose a new password",
            expiry_minutes: SINGLE_USE_TOKEN_TTL_MINUTES,
            footer: "If you did not request this, your password stays unchanged.",
        })?;
        self.send(sender, to, "Reset your password", body).await
    }

    async fn send(
        &self,
        sender: &ResolvedSender,
        to: &str,
        subject: &str,
        body: String,
    ) -> Result<(), AppError> {
        let message = OutgoingMessage {
            from_email: sender.from_email.clone(),
            from_name: sender.display_name.clone(),
            to: vec![to.to_string()],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.to_string(),
            body,
            is_html: true,
        };

        deliver(
            self.transport.as_ref(),
            &sender.credentials(),
            &message,
            self.timeout,
        )
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, subject, "system mail delivery failed");
            AppError::from(err)
        })
    }
}

fn render(template: SystemEmailTemplate<'_>) -> Result<String, AppError> {
    template
        .render()
        .map_err(|err| AppError::internal(format!("failed to render email: {err}")))
}
