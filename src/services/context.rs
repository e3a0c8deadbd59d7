use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{
    auth::jwt::JwtKeys,
    config::{AppConfig, defaults},
    db::dao::DaoContext,
    mailer::MailTransport,
    services::{
        account_service::AccountService, alias_service::AliasService,
        api_token_service::ApiTokenService, auth_service::AuthService,
        dispatch_service::DispatchService, password_reset_service::PasswordResetService,
        sender_service::SenderService, signup_service::SignupService, system_mail::SystemMailer,
        user_service::UserService,
    },
    state::AppState,
};

/// Knobs the services read from configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub session_ttl_secs: usize,
    pub send_timeout: Duration,
    pub app_base_url: String,
}

impl ServiceSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let session_ttl_hours = cfg
            .auth
            .as_ref()
            .map(|auth| auth.session_ttl_hours)
            .unwrap_or(defaults::DEFAULT_SESSION_TTL_HOURS as u64);
        Self {
            session_ttl_secs: (session_ttl_hours * 3600) as usize,
            send_timeout: Duration::from_secs(cfg.mail.send_timeout_secs),
            app_base_url: cfg.general.app_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    jwt: JwtKeys,
    mailer: Arc<dyn MailTransport>,
    settings: ServiceSettings,
}

impl ServiceContext {
    pub fn new(
        db: &DatabaseConnection,
        jwt: JwtKeys,
        mailer: Arc<dyn MailTransport>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            daos: DaoContext::new(db),
            jwt,
            mailer,
            settings,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            &state.db,
            state.jwt.clone(),
            state.mailer.clone(),
            ServiceSettings::from_config(&state.config),
        )
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(
            self.daos.user(),
            self.daos.api_token(),
            self.jwt.clone(),
            self.settings.session_ttl_secs,
        )
    }

    pub fn api_tokens(&self) -> ApiTokenService {
        ApiTokenService::new(self.daos.api_token())
    }

    pub fn users(&self) -> UserService {
        UserService::new(&self.daos)
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(&self.daos)
    }

    pub fn aliases(&self) -> AliasService {
        AliasService::new(&self.daos)
    }

    pub fn senders(&self) -> SenderService {
        SenderService::new(
            self.daos.account(),
            self.daos.alias(),
            self.daos.default_sender(),
        )
    }

    pub fn system_mail(&self) -> SystemMailer {
        SystemMailer::new(
            self.senders(),
            self.mailer.clone(),
            self.settings.send_timeout,
            self.settings.app_base_url.clone(),
        )
    }

    pub fn signup(&self) -> SignupService {
        SignupService::new(self.daos.user(), self.daos.pending_user(), self.system_mail())
    }

    pub fn password_reset(&self) -> PasswordResetService {
        PasswordResetService::new(
            self.daos.user(),
            self.daos.password_reset(),
            self.system_mail(),
        )
    }

    pub fn dispatch(&self) -> DispatchService {
        DispatchService::new(
            self.senders(),
            self.mailer.clone(),
            self.settings.send_timeout,
        )
    }
}
