use chrono::Utc;

use crate::{
    auth::{
        normalize_email,
        password::{ensure_password_strength, hash_password},
        secrets::{SINGLE_USE_TOKEN_TTL_MINUTES, digest, generate_single_use_token},
    },
    db::dao::{DaoLayerError, PasswordResetDao, UserDao},
    error::AppError,
    services::system_mail::SystemMailer,
};

#[derive(Clone)]
pub struct PasswordResetService {
    users: UserDao,
    resets: PasswordResetDao,
    mail: SystemMailer,
}

impl PasswordResetService {
    pub fn new(users: UserDao, resets: PasswordResetDao, mail: SystemMailer) -> Self {
        Self {
            users,
            resets,
            mail,
        }
    }

    /// Always succeeds from the caller's point of view. Whether the email
    /// exists, and whether mail went out, is only visible in the logs.
    pub async fn request_reset(&self, email: &str) {
        let email = normalize_email(email);
        if let Err(err) = self.issue(&email).await {
            tracing::warn!(error = %err, code = err.code(), "password reset request not fulfilled");
        }
    }

    async fn issue(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        let sender = self.mail.sender().await?;

        self.resets.delete_for_user(&user.id).await?;
        let token = generate_single_use_token();
        let expires_at =
            Utc::now().fixed_offset() + chrono::Duration::minutes(SINGLE_USE_TOKEN_TTL_MINUTES);
        self.resets
            .create_token(&user.id, &digest(&token), expires_at)
            .await?;

        self.mail
            .send_password_reset(&sender, &user.email, &token)
            .await?;
        tracing::info!(user_id = %user.id, "password reset mail sent");
        Ok(())
    }

    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        ensure_password_strength(new_password)?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::validation("Token is required"));
        }

        let reset = self
            .resets
            .find_by_token_hash(&digest(token))
            .await?
            .ok_or_else(AppError::token_expired)?;

        if !self.resets.claim(&reset.id).await? {
            tracing::info!(reset_id = %reset.id, "reset token already consumed");
            return Err(AppError::token_expired());
        }
        if reset.expires_at < Utc::now().fixed_offset() {
            tracing::info!(reset_id = %reset.id, "reset token expired");
            return Err(AppError::token_expired());
        }

        let password_hash = hash_password(new_password)?;
        match self.users.set_password(&reset.user_id, &password_hash).await {
            Ok(_) => {}
            // The user was deleted after the token was issued.
            Err(DaoLayerError::NotFound { .. }) => return Err(AppError::token_expired()),
            Err(err) => return Err(err.into()),
        }
        self.resets.delete_for_user(&reset.user_id).await?;

        tracing::info!(user_id = %reset.user_id, "password reset completed");
        Ok(())
    }
}
