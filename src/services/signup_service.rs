use chrono::Utc;

use crate::{
    auth::{
        Role, normalize_email,
        password::{ensure_password_strength, hash_password},
        secrets::{SINGLE_USE_TOKEN_TTL_MINUTES, digest, generate_single_use_token},
    },
    db::dao::{DaoLayerError, PendingUserDao, UserDao},
    db::entities::user,
    error::AppError,
    services::system_mail::SystemMailer,
};

#[derive(Clone)]
pub struct SignupService {
    users: UserDao,
    pending: PendingUserDao,
    mail: SystemMailer,
}

impl SignupService {
    pub fn new(users: UserDao, pending: PendingUserDao, mail: SystemMailer) -> Self {
        Self {
            users,
            pending,
            mail,
        }
    }

    /// Stores a pending signup and mails its verification link. An email
    /// that already belongs to a user is reported as a conflict.
    pub async fn signup(&self, email: &str, password: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        ensure_valid_email(&email)?;
        ensure_password_strength(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        // Without a sender the link could never arrive, so store nothing.
        let sender = self.mail.sender().await?;

        let password_hash = hash_password(password)?;
        let token = generate_single_use_token();
        let expires_at =
            Utc::now().fixed_offset() + chrono::Duration::minutes(SINGLE_USE_TOKEN_TTL_MINUTES);
        self.pending
            .replace_for_email(&email, &password_hash, &digest(&token), expires_at)
            .await?;

        self.mail.send_verification(&sender, &email, &token).await?;
        tracing::info!(email = %email, "signup pending verification");
        Ok(())
    }

    /// Consumes the token exactly once and creates the user.
    pub async fn verify(&self, token: &str) -> Result<user::Model, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::validation("Token is required"));
        }

        let pending = self
            .pending
            .find_by_token_hash(&digest(token))
            .await?
            .ok_or_else(AppError::token_expired)?;

        if !self.pending.claim(&pending.id).await? {
            tracing::info!(pending_id = %pending.id, "signup token already consumed");
            return Err(AppError::token_expired());
        }
        if pending.expires_at < Utc::now().fixed_offset() {
            tracing::info!(pending_id = %pending.id, "signup token expired");
            return Err(AppError::token_expired());
        }

        let created = self
            .users
            .create_user(&pending.email, &pending.password_hash, Role::User.as_str(), false)
            .await;
        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "signup verified");
                Ok(user)
            }
            Err(err @ DaoLayerError::Db(_)) if err.is_unique_violation() => {
                Err(AppError::conflict("Email already registered"))
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub(crate) fn ensure_valid_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(AppError::validation("A valid email address is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::SignupService;
    use crate::{
        auth::Role,
        db::entities::{default_sender, pending_user, user},
        services::{ServiceContext, ServiceSettings},
        test_helpers::{RecordingTransport, fixed_ts, test_jwt, user_model},
    };

    fn service(db: &DatabaseConnection) -> SignupService {
        ServiceContext::new(
            db,
            test_jwt(),
            RecordingTransport::new(),
            ServiceSettings::default(),
        )
        .signup()
    }

    fn pending(expires_in_minutes: i64) -> pending_user::Model {
        pending_user::Model {
            id: Uuid::new_v4(),
            created_at: fixed_ts(),
            updated_at: fixed_ts(),
            email: "new@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            token_hash: "digest".to_string(),
            expires_at: Utc::now().fixed_offset() + chrono::Duration::minutes(expires_in_minutes),
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn weak_password_is_rejected_before_any_lookup() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(&db)
            .signup("new@example.com", "short")
            .await
            .expect_err("weak password should fail");
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn existing_user_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model("taken@example.com", Role::User, "hash", false)]])
            .into_connection();

        let err = service(&db)
            .signup("Taken@Example.com", "password123")
            .await
            .expect_err("duplicate should conflict");
        assert_eq!(err.code(), "conflict");
    }

    #[tokio::test]
    async fn missing_default_sender_stores_nothing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<default_sender::Model>::new()])
            .into_connection();

        let err = service(&db)
            .signup("new@example.com", "password123")
            .await
            .expect_err("no sender should fail");
        assert_eq!(err.code(), "sender_inactive");
    }

    #[tokio::test]
    async fn unknown_token_is_expired() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<pending_user::Model>::new()])
            .into_connection();

        let err = service(&db)
            .verify("nope")
            .await
            .expect_err("unknown token should fail");
        assert_eq!(err.code(), "token_expired");
    }

    #[tokio::test]
    async fn losing_the_claim_race_is_expired() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending(30)]])
            .append_exec_results([exec(0)])
            .into_connection();

        let err = service(&db)
            .verify("token")
            .await
            .expect_err("consumed token should fail");
        assert_eq!(err.code(), "token_expired");
    }

    #[tokio::test]
    async fn expired_token_is_consumed_and_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending(-1)]])
            .append_exec_results([exec(1)])
            .into_connection();

        let err = service(&db)
            .verify("token")
            .await
            .expect_err("expired token should fail");
        assert_eq!(err.code(), "token_expired");
    }

    #[tokio::test]
    async fn verify_creates_plain_user() {
        let created = user_model("new@example.com", Role::User, "$argon2id$stub", false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending(30)]])
            .append_exec_results([exec(1)])
            .append_query_results([[created]])
            .into_connection();

        let user = service(&db).verify("token").await.expect("verify should succeed");

        assert_eq!(user.role, "user");
        assert!(!user.must_change_password);
    }
}
