use uuid::Uuid;

use crate::{
    auth::{
        Credential, CredentialKind, Principal, Role, SessionToken,
        jwt::{JwtKeys, decode_session, encode_token, make_session_claims},
        normalize_email,
        password::{ensure_password_strength, hash_password, verify_against_dummy, verify_password},
        secrets::{digest, looks_like_api_token},
    },
    config::AuthConfig,
    db::dao::{ApiTokenDao, DaoBase, DaoLayerError, UserDao},
    db::entities::user,
    error::AppError,
};

#[derive(Clone)]
pub struct AuthService {
    users: UserDao,
    api_tokens: ApiTokenDao,
    jwt: JwtKeys,
    session_ttl_secs: usize,
}

pub(crate) fn role_of(user: &user::Model) -> Result<Role, AppError> {
    Role::try_from(user.role.as_str())
        .map_err(|_| AppError::internal(format!("Unknown role stored for user {}", user.id)))
}

impl AuthService {
    pub fn new(
        users: UserDao,
        api_tokens: ApiTokenDao,
        jwt: JwtKeys,
        session_ttl_secs: usize,
    ) -> Self {
        Self {
            users,
            api_tokens,
            jwt,
            session_ttl_secs,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AppError> {
        let email = normalize_email(email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_against_dummy(password);
            tracing::info!("login rejected: unknown email");
            return Err(AppError::invalid_credentials());
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "login rejected: wrong password");
            return Err(AppError::invalid_credentials());
        }

        let role = role_of(&user)?;
        let now = chrono::Utc::now().fixed_offset();
        self.users.set_last_login(&user.id, &now).await?;

        let claims = make_session_claims(&user.id, role, self.session_ttl_secs);
        let token = encode_token(&self.jwt, &claims)?;
        tracing::info!(user_id = %user.id, role = %role, "session issued");

        Ok(SessionToken {
            token,
            role,
            must_change_password: user.must_change_password,
            expires_in: self.session_ttl_secs,
        })
    }

    /// Resolves a bearer string (session JWT or API token) into the caller.
    /// The stored user row is authoritative for role and the password gate.
    pub async fn authenticate(&self, bearer: &str) -> Result<Principal, AppError> {
        let bearer = bearer.trim();
        if bearer.is_empty() {
            return Err(AppError::unauthenticated("Missing bearer token"));
        }

        let (credential, user) = if looks_like_api_token(bearer) {
            self.resolve_api_token(bearer).await?
        } else {
            self.resolve_session(bearer).await?
        };

        if let Credential::ApiToken { token_id, .. } = &credential {
            if let Err(err) = self.api_tokens.touch_last_used(token_id).await {
                tracing::warn!(token_id = %token_id, error = %err, "failed to record API token use");
            }
        }

        Ok(Principal {
            user_id: user.id,
            email: user.email.clone(),
            role: role_of(&user)?,
            must_change_password: user.must_change_password,
            credential: credential.kind(),
        })
    }

    async fn resolve_session(&self, token: &str) -> Result<(Credential, user::Model), AppError> {
        let claims = decode_session(&self.jwt, token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::unauthenticated("Invalid token subject"))?;
        let user = self.load_user(user_id).await?;

        Ok((
            Credential::Session {
                user_id,
                role: claims.role,
                exp: claims.exp,
            },
            user,
        ))
    }

    async fn resolve_api_token(&self, secret: &str) -> Result<(Credential, user::Model), AppError> {
        let token = self
            .api_tokens
            .find_by_hash(&digest(secret))
            .await?
            .ok_or_else(|| AppError::unauthenticated("Invalid API token"))?;
        let user = self.load_user(token.user_id).await?;
        let role = role_of(&user)?;

        Ok((
            Credential::ApiToken {
                token_id: token.id,
                user_id: token.user_id,
                role,
            },
            user,
        ))
    }

    async fn load_user(&self, user_id: Uuid) -> Result<user::Model, AppError> {
        match self.users.find_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(DaoLayerError::NotFound { .. }) => {
                Err(AppError::unauthenticated("User no longer exists"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The one operation allowed while a forced change is pending.
    pub async fn change_password(
        &self,
        principal: &Principal,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if principal.credential != CredentialKind::Session {
            return Err(AppError::forbidden("Password changes require a session"));
        }
        ensure_password_strength(new_password)?;

        let user = self.users.find_by_id(principal.user_id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "password change rejected: wrong current password");
            return Err(AppError::invalid_credentials());
        }

        let hash = hash_password(new_password)?;
        self.users.set_password(&user.id, &hash).await?;
        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    pub async fn me(&self, principal: &Principal) -> Result<user::Model, AppError> {
        Ok(self.users.find_by_id(principal.user_id).await?)
    }

    /// Ensures the bootstrap admin exists. It must pick a new password on first login.
    pub async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        let email = normalize_email(&cfg.admin_email);
        if let Some(existing) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?
        {
            tracing::info!("admin user already present: {}", existing.email);
            return Ok(());
        }

        let hash = hash_password(&cfg.admin_password)
            .map_err(|e| anyhow::anyhow!("admin seed hash error: {e}"))?;
        let user = self
            .users
            .create_user(&email, &hash, Role::Admin.as_str(), true)
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        tracing::info!("seeded admin user {}", user.email);
        Ok(())
    }
}
