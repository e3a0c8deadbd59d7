use sea_orm::Set;
use uuid::Uuid;

use crate::{
    auth::{
        Principal, normalize_email,
        policy::{Action, Ownership, Resource, authorize},
    },
    db::dao::{
        AccountDao, AliasDao, DaoBase, DaoContext, DaoLayerError, NewAccount, PaginatedResponse,
        UserDao, Visibility,
    },
    db::entities::account,
    error::AppError,
    services::signup_service::ensure_valid_email,
};

#[derive(Debug, Clone, Default)]
pub struct AccountInput {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_id: Option<Uuid>,
}

/// `None` leaves a field alone. `owner_id: Some(None)` returns the account to
/// the unowned pool.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub password: Option<String>,
    pub owner_id: Option<Option<Uuid>>,
}

impl AccountChanges {
    fn touches_privileged(&self) -> bool {
        self.password.is_some() || self.owner_id.is_some()
    }

    fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.is_active.is_none()
            && self.is_public.is_none()
            && !self.touches_privileged()
    }
}

pub(crate) fn account_ownership(model: &account::Model) -> Ownership {
    Ownership {
        owner_id: model.owner_id,
        is_public: model.is_public,
    }
}

pub(crate) fn visibility_for(principal: &Principal) -> Visibility {
    if principal.is_admin() {
        Visibility::All
    } else {
        Visibility::PublicOrOwnedBy(principal.user_id)
    }
}

pub(crate) fn clean_display_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// Who owns a newly created account or alias. Devs always own what they
/// create; naming anyone else is an owner assignment and admin-only.
pub(crate) async fn resolve_owner(
    users: &UserDao,
    principal: &Principal,
    resource: Resource,
    requested: Option<Uuid>,
) -> Result<Option<Uuid>, AppError> {
    if !principal.is_admin() {
        if requested.is_some_and(|owner| owner != principal.user_id) {
            authorize(principal, Action::UpdatePrivilegedFields, resource)?;
        }
        return Ok(Some(principal.user_id));
    }
    match requested {
        Some(owner) => {
            ensure_user_exists(users, owner).await?;
            Ok(Some(owner))
        }
        None => Ok(None),
    }
}

pub(crate) async fn ensure_user_exists(users: &UserDao, id: Uuid) -> Result<(), AppError> {
    if users.find_optional(id).await?.is_none() {
        return Err(AppError::validation("Owner does not exist"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    accounts: AccountDao,
    aliases: AliasDao,
    users: UserDao,
}

impl AccountService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            accounts: daos.account(),
            aliases: daos.alias(),
            users: daos.user(),
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<account::Model>, AppError> {
        authorize(principal, Action::Read, Resource::Account(None))?;
        Ok(self
            .accounts
            .list_visible(page, page_size, visibility_for(principal))
            .await?)
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<account::Model, AppError> {
        let account = self.accounts.find_by_id(*id).await?;
        authorize(
            principal,
            Action::Read,
            Resource::Account(Some(account_ownership(&account))),
        )?;
        Ok(account)
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: AccountInput,
    ) -> Result<account::Model, AppError> {
        authorize(principal, Action::Create, Resource::Account(None))?;

        let email = normalize_email(&input.email);
        ensure_valid_email(&email)?;
        if input.password.is_empty() {
            return Err(AppError::validation("Mailbox password is required"));
        }
        let owner_id = resolve_owner(
            &self.users,
            principal,
            Resource::Account(None),
            input.owner_id,
        )
        .await?;
        if self.aliases.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Address is already used by an alias"));
        }

        let created = self
            .accounts
            .create_account(NewAccount {
                email,
                display_name: clean_display_name(input.display_name),
                password: input.password,
                is_active: input.is_active.unwrap_or(true),
                owner_id,
                is_public: input.is_public.unwrap_or(false),
            })
            .await;
        match created {
            Ok(account) => {
                tracing::info!(actor = %principal.user_id, account_id = %account.id, "account created");
                Ok(account)
            }
            Err(err @ DaoLayerError::Db(_)) if err.is_unique_violation() => {
                Err(AppError::conflict("Account email already exists"))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &Uuid,
        changes: AccountChanges,
    ) -> Result<account::Model, AppError> {
        let current = self.accounts.find_by_id(*id).await?;
        let target = Resource::Account(Some(account_ownership(&current)));
        authorize(principal, Action::UpdateOwnFields, target)?;
        if changes.touches_privileged() {
            authorize(principal, Action::UpdatePrivilegedFields, target)?;
        }
        if changes.is_empty() {
            return Err(AppError::validation("No changes requested"));
        }
        if changes.password.as_deref().is_some_and(str::is_empty) {
            return Err(AppError::validation("Mailbox password cannot be empty"));
        }
        if let Some(Some(owner)) = changes.owner_id {
            ensure_user_exists(&self.users, owner).await?;
        }

        let rotated = changes.password.is_some();
        let updated = self
            .accounts
            .update(*id, move |active| {
                if let Some(name) = changes.display_name {
                    active.display_name = Set(clean_display_name(Some(name)));
                }
                if let Some(is_active) = changes.is_active {
                    active.is_active = Set(is_active);
                }
                if let Some(is_public) = changes.is_public {
                    active.is_public = Set(is_public);
                }
                if let Some(password) = changes.password {
                    active.password = Set(password);
                }
                if let Some(owner) = changes.owner_id {
                    active.owner_id = Set(owner);
                }
            })
            .await?;

        tracing::info!(
            actor = %principal.user_id,
            account_id = %id,
            is_active = updated.is_active,
            credential_rotated = rotated,
            "account updated"
        );
        Ok(updated)
    }

    /// Deletes the account and its aliases. A default-sender setting that
    /// pointed at any of them is cleared.
    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), AppError> {
        let account = self.accounts.find_by_id(*id).await?;
        authorize(
            principal,
            Action::Delete,
            Resource::Account(Some(account_ownership(&account))),
        )?;

        let removal = self.accounts.delete_cascade(&account.id).await?;
        if removal.default_sender_cleared {
            tracing::warn!(account_id = %account.id, "default sender cleared because its identity was deleted");
        }

        tracing::info!(
            actor = %principal.user_id,
            account_id = %account.id,
            aliases_removed = removal.aliases_removed,
            "account deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{AccountChanges, AccountInput, AccountService};
    use crate::{
        auth::Role,
        db::dao::DaoContext,
        db::entities::{account, alias},
        test_helpers::{fixed_ts, principal},
    };

    fn service(db: &DatabaseConnection) -> AccountService {
        AccountService::new(&DaoContext::new(db))
    }

    fn account_model(owner_id: Option<Uuid>) -> account::Model {
        account::Model {
            id: Uuid::new_v4(),
            created_at: fixed_ts(),
            updated_at: fixed_ts(),
            email: "box@example.com".to_string(),
            display_name: None,
            password: "mailbox-secret".to_string(),
            is_active: true,
            owner_id,
            is_public: false,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn dev_creates_account_owned_by_itself() {
        let dev = principal(Role::Dev);
        let stored = account_model(Some(dev.user_id));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<alias::Model>::new()])
            .append_query_results([[stored]])
            .into_connection();

        let input = AccountInput {
            email: "Box@Example.com".to_string(),
            password: "mailbox-secret".to_string(),
            ..Default::default()
        };
        let created = service(&db)
            .create(&dev, input)
            .await
            .expect("create should succeed");
        assert_eq!(created.owner_id, Some(dev.user_id));
    }

    #[tokio::test]
    async fn dev_cannot_assign_another_owner() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let input = AccountInput {
            email: "box@example.com".to_string(),
            password: "mailbox-secret".to_string(),
            owner_id: Some(Uuid::new_v4()),
            ..Default::default()
        };

        let err = service(&db)
            .create(&principal(Role::Dev), input)
            .await
            .expect_err("owner assignment should be admin-only");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn user_cannot_create_accounts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = service(&db)
            .create(&principal(Role::User), AccountInput::default())
            .await
            .expect_err("user should be denied");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn dev_can_deactivate_own_account() {
        let dev = principal(Role::Dev);
        let current = account_model(Some(dev.user_id));
        let mut updated = current.clone();
        updated.is_active = false;
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current.clone()]])
            .append_query_results([[current]])
            .append_query_results([[updated]])
            .into_connection();

        let changes = AccountChanges {
            is_active: Some(false),
            ..Default::default()
        };
        let account = service(&db)
            .update(&dev, &id, changes)
            .await
            .expect("owner should update");
        assert!(!account.is_active);
    }

    #[tokio::test]
    async fn dev_cannot_touch_foreign_or_unowned_accounts() {
        for owner in [Some(Uuid::new_v4()), None] {
            let current = account_model(owner);
            let id = current.id;
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current]])
                .into_connection();

            let err = service(&db)
                .delete(&principal(Role::Dev), &id)
                .await
                .expect_err("foreign account should be refused");
            assert_eq!(err.code(), "forbidden");
        }
    }

    #[tokio::test]
    async fn dev_cannot_rotate_password_on_own_account() {
        let dev = principal(Role::Dev);
        let current = account_model(Some(dev.user_id));
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .into_connection();

        let changes = AccountChanges {
            password: Some("new-secret".to_string()),
            ..Default::default()
        };
        let err = service(&db)
            .update(&dev, &id, changes)
            .await
            .expect_err("rotation should be admin-only");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn dev_deletes_own_account() {
        let dev = principal(Role::Dev);
        let current = account_model(Some(dev.user_id));
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_query_results([Vec::<alias::Model>::new()])
            .append_exec_results([exec(0), exec(0), exec(1)])
            .into_connection();

        service(&db)
            .delete(&dev, &id)
            .await
            .expect("owner should delete");
    }

    #[tokio::test]
    async fn admin_delete_cascades_to_aliases() {
        let current = account_model(None);
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_query_results([Vec::<alias::Model>::new()])
            .append_exec_results([exec(0), exec(0), exec(1)])
            .into_connection();

        service(&db)
            .delete(&principal(Role::Admin), &id)
            .await
            .expect("delete should succeed");
    }
}
