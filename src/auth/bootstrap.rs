use crate::{
    config::AuthConfig,
    services::ServiceContext,
};

use super::{jwt::JwtKeys, turnstile::TurnstileVerifier};

pub fn jwt_keys(cfg: &AuthConfig) -> JwtKeys {
    JwtKeys::from_secret(cfg.jwt_secret.as_bytes())
}

pub fn turnstile(cfg: &AuthConfig) -> TurnstileVerifier {
    let verifier = TurnstileVerifier::new(cfg.turnstile_secret.clone());
    if verifier.is_enabled() {
        tracing::info!("turnstile verification enabled for public auth endpoints");
    }
    verifier
}

pub async fn init_auth(cfg: &AuthConfig, services: &ServiceContext) -> anyhow::Result<()> {
    services.auth().seed_admin(cfg).await
}
