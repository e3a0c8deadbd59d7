use serde::Deserialize;

use crate::error::AppError;

const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

#[derive(Deserialize)]
struct SiteverifyResponse {
    success: bool,
}

/// Human verification for the unauthenticated auth endpoints. Disabled when no
/// secret is configured.
#[derive(Clone)]
pub struct TurnstileVerifier {
    secret: Option<String>,
    endpoint: String,
    client: reqwest::Client,
}

impl TurnstileVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.trim().is_empty()),
            endpoint: SITEVERIFY_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub async fn verify(&self, token: Option<&str>) -> Result<(), AppError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };

        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::validation("Missing verification token"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "secret": secret, "response": token }))
            .send()
            .await
            .map_err(|err| AppError::internal(format!("Verification service unreachable: {err}")))?;

        let body: SiteverifyResponse = response
            .json()
            .await
            .map_err(|err| AppError::internal(format!("Verification service replied badly: {err}")))?;

        if !body.success {
            tracing::info!("turnstile verification rejected");
            return Err(AppError::validation("Verification failed"));
        }
        Ok(())
    }
}
