use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    auth::{jwt::JwtKeys, turnstile::TurnstileVerifier},
    config::AppConfig,
    mailer::MailTransport,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
    pub mailer: Arc<dyn MailTransport>,
    pub turnstile: TurnstileVerifier,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        jwt: JwtKeys,
        mailer: Arc<dyn MailTransport>,
        turnstile: TurnstileVerifier,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            jwt,
            mailer,
            turnstile,
        })
    }
}
