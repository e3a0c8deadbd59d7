use sea_orm::Set;
use uuid::Uuid;

use crate::{
    auth::{
        Principal, Role, normalize_email,
        password::hash_password,
        policy::{Action, Resource, authorize},
    },
    db::dao::{
        AccountDao, AliasDao, ApiTokenDao, DaoBase, DaoContext, DaoLayerError, PaginatedResponse,
        PasswordResetDao, UserDao,
    },
    db::entities::user,
    error::AppError,
    services::signup_service::ensure_valid_email,
};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub role: Option<Role>,
    pub password: Option<String>,
    pub must_change_password: Option<bool>,
}

impl UserChanges {
    fn is_empty(&self) -> bool {
        self.role.is_none() && self.password.is_none() && self.must_change_password.is_none()
    }
}

/// Admin-side user management.
#[derive(Clone)]
pub struct UserService {
    users: UserDao,
    api_tokens: ApiTokenDao,
    resets: PasswordResetDao,
    accounts: AccountDao,
    aliases: AliasDao,
}

impl UserService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            users: daos.user(),
            api_tokens: daos.api_token(),
            resets: daos.password_reset(),
            accounts: daos.account(),
            aliases: daos.alias(),
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<user::Model>, AppError> {
        authorize(principal, Action::Read, Resource::User(None))?;
        Ok(self.users.find(page, page_size, None, |query| query).await?)
    }

    pub async fn create(&self, principal: &Principal, data: NewUser) -> Result<user::Model, AppError> {
        authorize(principal, Action::Create, Resource::User(None))?;

        let email = normalize_email(&data.email);
        ensure_valid_email(&email)?;
        let password_hash = hash_password(&data.password)?;

        let created = self
            .users
            .create_user(&email, &password_hash, data.role.as_str(), data.must_change_password)
            .await;
        match created {
            Ok(user) => {
                tracing::info!(actor = %principal.user_id, user_id = %user.id, role = %data.role, "user created");
                Ok(user)
            }
            Err(err @ DaoLayerError::Db(_)) if err.is_unique_violation() => {
                Err(AppError::conflict("Email already registered"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// A role change counts as privileged, so an admin cannot change its own.
    /// A new password lifts the forced change unless the same request sets it again.
    pub async fn update(
        &self,
        principal: &Principal,
        id: &Uuid,
        changes: UserChanges,
    ) -> Result<user::Model, AppError> {
        let action = if changes.role.is_some() {
            Action::UpdatePrivilegedFields
        } else {
            Action::UpdateOwnFields
        };
        authorize(principal, action, Resource::User(Some(*id)))?;
        if changes.is_empty() {
            return Err(AppError::validation("No changes requested"));
        }

        let password_hash = changes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let updated = self
            .users
            .update(*id, move |active| {
                if let Some(role) = changes.role {
                    active.role = Set(role.as_str().to_string());
                }
                if let Some(hash) = password_hash {
                    active.password_hash = Set(hash);
                    active.must_change_password = Set(false);
                }
                if let Some(must_change) = changes.must_change_password {
                    active.must_change_password = Set(must_change);
                }
            })
            .await?;

        tracing::info!(actor = %principal.user_id, user_id = %id, "user updated");
        Ok(updated)
    }

    /// Removes the user's tokens and hands their accounts and aliases back
    /// to the unowned pool before deleting the row.
    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), AppError> {
        authorize(principal, Action::Delete, Resource::User(Some(*id)))?;
        let user = self.users.find_by_id(*id).await?;

        self.api_tokens.delete_for_user(&user.id).await?;
        self.resets.delete_for_user(&user.id).await?;
        let accounts = self.accounts.release_owner(&user.id).await?;
        let aliases = self.aliases.release_owner(&user.id).await?;
        self.users.delete(user.id).await?;

        tracing::info!(
            actor = %principal.user_id,
            user_id = %user.id,
            released_accounts = accounts,
            released_aliases = aliases,
            "user deleted"
        );
        Ok(())
    }
}
