//! Builders shared by unit tests and the router/flow tests under `tests/`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, middleware::from_fn};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseBackend, DatabaseConnection, MockDatabase};
use uuid::Uuid;

use crate::{
    auth::{
        CredentialKind, Principal, Role,
        jwt::{JwtKeys, encode_token, make_session_claims},
        turnstile::TurnstileVerifier,
    },
    config::{AppConfig, AuthConfig},
    db::{entities::user, sync_schema},
    mailer::{DeliveryError, MailTransport, OutgoingMessage, SmtpCredentials},
    middleware::json_error_middleware,
    routes::router,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// One delivered message together with the SMTP login that carried it.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub username: String,
    pub message: OutgoingMessage,
}

/// Records every message instead of talking SMTP. `failing()` rejects all sends.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SentMail>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::default(),
            fail: true,
        })
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(
        &self,
        credentials: &SmtpCredentials,
        message: &OutgoingMessage,
    ) -> Result<(), DeliveryError> {
        if self.fail {
            return Err(DeliveryError::Transport("535 authentication failed".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMail {
                username: credentials.username.clone(),
                message: message.clone(),
            });
        }
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth = Some(AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: "adminpassword".to_string(),
        session_ttl_hours: 12,
        turnstile_secret: None,
    });
    cfg.general.app_base_url = "https://relay.example.com".to_string();
    cfg
}

pub fn test_jwt() -> JwtKeys {
    JwtKeys::from_secret(TEST_JWT_SECRET.as_bytes())
}

pub fn test_state(db: DatabaseConnection, mailer: Arc<dyn MailTransport>) -> Arc<AppState> {
    AppState::new(
        test_config(),
        db,
        test_jwt(),
        mailer,
        TurnstileVerifier::disabled(),
    )
}

pub fn test_router_with_state(state: Arc<AppState>) -> Router {
    router(state).layer(from_fn(json_error_middleware))
}

/// Router over an empty mock store, for requests that never reach the database.
pub fn test_router() -> Router {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    test_router_with_state(test_state(db, RecordingTransport::new()))
}

/// Fresh in-memory SQLite store with the schema applied. One connection so
/// every task sees the same database.
pub async fn sqlite_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt)
        .await
        .expect("sqlite in-memory database should open");
    sync_schema(&db).await.expect("schema should sync");
    db
}

pub fn session_bearer(user_id: &Uuid, role: Role) -> String {
    let claims = make_session_claims(user_id, role, 3600);
    let token = encode_token(&test_jwt(), &claims).expect("token should encode");
    format!("Bearer {token}")
}

pub fn fixed_ts() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .and_then(|offset| offset.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single())
        .unwrap_or_else(|| Utc::now().fixed_offset())
}

pub fn user_model(email: &str, role: Role, password_hash: &str, must_change: bool) -> user::Model {
    user::Model {
        id: Uuid::new_v4(),
        created_at: fixed_ts(),
        updated_at: fixed_ts(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role: role.as_str().to_string(),
        must_change_password: must_change,
        last_login_at: None,
    }
}

pub fn principal(role: Role) -> Principal {
    Principal {
        user_id: Uuid::new_v4(),
        email: format!("{}@example.com", role.as_str()),
        role,
        must_change_password: false,
        credential: CredentialKind::Session,
    }
}
