use sea_orm::Set;
use uuid::Uuid;

use crate::{
    auth::{
        Principal, normalize_email,
        policy::{Action, Ownership, Resource, authorize},
    },
    db::dao::{
        AccountDao, AliasDao, DaoBase, DaoContext, DaoLayerError, NewAlias, PaginatedResponse,
        UserDao,
    },
    db::entities::{account, alias},
    error::AppError,
    services::{
        account_service::{
            clean_display_name, ensure_user_exists, resolve_owner, visibility_for,
        },
        sender_service::{SenderKind, SenderService},
        signup_service::ensure_valid_email,
    },
};

#[derive(Debug, Clone, Default)]
pub struct AliasInput {
    pub alias_email: String,
    pub display_name: Option<String>,
    pub account_id: Uuid,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct AliasChanges {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub account_id: Option<Uuid>,
    pub owner_id: Option<Option<Uuid>>,
}

impl AliasChanges {
    fn touches_privileged(&self) -> bool {
        self.account_id.is_some() || self.owner_id.is_some()
    }

    fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.is_active.is_none()
            && self.is_public.is_none()
            && !self.touches_privileged()
    }
}

fn alias_ownership(model: &alias::Model) -> Ownership {
    Ownership {
        owner_id: model.owner_id,
        is_public: model.is_public,
    }
}

#[derive(Clone)]
pub struct AliasService {
    aliases: AliasDao,
    accounts: AccountDao,
    users: UserDao,
    senders: SenderService,
}

impl AliasService {
    pub fn new(daos: &DaoContext) -> Self {
        Self {
            aliases: daos.alias(),
            accounts: daos.account(),
            users: daos.user(),
            senders: SenderService::new(daos.account(), daos.alias(), daos.default_sender()),
        }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<alias::Model>, AppError> {
        authorize(principal, Action::Read, Resource::Alias(None))?;
        Ok(self
            .aliases
            .list_visible(page, page_size, visibility_for(principal))
            .await?)
    }

    async fn parent(&self, account_id: Uuid) -> Result<account::Model, AppError> {
        self.accounts
            .find_optional(account_id)
            .await?
            .ok_or_else(|| AppError::validation("Parent account does not exist"))
    }

    /// Devs may only hang aliases off accounts they own.
    fn ensure_parent_usable(
        &self,
        principal: &Principal,
        parent: &account::Model,
    ) -> Result<(), AppError> {
        if principal.is_admin() || parent.owner_id == Some(principal.user_id) {
            return Ok(());
        }
        tracing::info!(user_id = %principal.user_id, account_id = %parent.id, "alias parent not owned");
        Err(AppError::forbidden(
            "Aliases can only be attached to accounts you own",
        ))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: AliasInput,
    ) -> Result<alias::Model, AppError> {
        authorize(principal, Action::Create, Resource::Alias(None))?;

        let alias_email = normalize_email(&input.alias_email);
        ensure_valid_email(&alias_email)?;
        let parent = self.parent(input.account_id).await?;
        self.ensure_parent_usable(principal, &parent)?;
        let owner_id =
            resolve_owner(&self.users, principal, Resource::Alias(None), input.owner_id).await?;
        if self.accounts.find_by_email(&alias_email).await?.is_some() {
            return Err(AppError::conflict("Address is already used by an account"));
        }

        let created = self
            .aliases
            .create_alias(NewAlias {
                alias_email,
                display_name: clean_display_name(input.display_name),
                is_active: input.is_active.unwrap_or(true),
                account_id: parent.id,
                owner_id,
                is_public: input.is_public.unwrap_or(false),
            })
            .await;
        match created {
            Ok(alias) => {
                tracing::info!(actor = %principal.user_id, alias_id = %alias.id, account_id = %parent.id, "alias created");
                Ok(alias)
            }
            Err(err @ DaoLayerError::Db(_)) if err.is_unique_violation() => {
                Err(AppError::conflict("Alias email already exists"))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: &Uuid,
        changes: AliasChanges,
    ) -> Result<alias::Model, AppError> {
        let current = self.aliases.find_by_id(*id).await?;
        let target = Resource::Alias(Some(alias_ownership(&current)));
        authorize(principal, Action::UpdateOwnFields, target)?;
        if changes.touches_privileged() {
            authorize(principal, Action::UpdatePrivilegedFields, target)?;
        }
        if changes.is_empty() {
            return Err(AppError::validation("No changes requested"));
        }
        if let Some(account_id) = changes.account_id {
            self.parent(account_id).await?;
        }
        if let Some(Some(owner)) = changes.owner_id {
            ensure_user_exists(&self.users, owner).await?;
        }

        let updated = self
            .aliases
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
                if let Some(account_id) = changes.account_id {
                    active.account_id = Set(account_id);
                }
                if let Some(owner) = changes.owner_id {
                    active.owner_id = Set(owner);
                }
            })
            .await?;

        tracing::info!(actor = %principal.user_id, alias_id = %id, is_active = updated.is_active, "alias updated");
        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), AppError> {
        let alias = self.aliases.find_by_id(*id).await?;
        authorize(
            principal,
            Action::Delete,
            Resource::Alias(Some(alias_ownership(&alias))),
        )?;

        self.senders.forget(SenderKind::Alias, &[alias.id]).await?;
        self.aliases.delete(alias.id).await?;
        tracing::info!(actor = %principal.user_id, alias_id = %alias.id, "alias deleted");
        Ok(())
    }

    pub async fn get(&self, principal: &Principal, id: &Uuid) -> Result<alias::Model, AppError> {
        let alias = self.aliases.find_by_id(*id).await?;
        authorize(
            principal,
            Action::Read,
            Resource::Alias(Some(alias_ownership(&alias))),
        )?;
        Ok(alias)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{AliasChanges, AliasInput, AliasService};
    use crate::{
        auth::Role,
        db::dao::DaoContext,
        db::entities::{account, alias},
        test_helpers::{fixed_ts, principal},
    };

    fn service(db: &DatabaseConnection) -> AliasService {
        AliasService::new(&DaoContext::new(db))
    }

    fn parent(owner_id: Option<Uuid>) -> account::Model {
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

    fn alias_model(account_id: Uuid, owner_id: Option<Uuid>) -> alias::Model {
        alias::Model {
            id: Uuid::new_v4(),
            created_at: fixed_ts(),
            updated_at: fixed_ts(),
            alias_email: "sales@example.com".to_string(),
            display_name: None,
            is_active: true,
            account_id,
            owner_id,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn missing_parent_is_a_validation_error() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<account::Model>::new()])
            .into_connection();
        let input = AliasInput {
            alias_email: "sales@example.com".to_string(),
            account_id: Uuid::new_v4(),
            ..Default::default()
        };

        let err = service(&db)
            .create(&principal(Role::Admin), input)
            .await
            .expect_err("missing parent should fail");
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn dev_cannot_attach_alias_to_foreign_account() {
        let foreign = parent(Some(Uuid::new_v4()));
        let input = AliasInput {
            alias_email: "sales@example.com".to_string(),
            account_id: foreign.id,
            ..Default::default()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[foreign]])
            .into_connection();

        let err = service(&db)
            .create(&principal(Role::Dev), input)
            .await
            .expect_err("foreign parent should be refused");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn alias_cannot_shadow_an_account_address() {
        let mailbox = parent(None);
        let input = AliasInput {
            alias_email: "box@example.com".to_string(),
            account_id: mailbox.id,
            ..Default::default()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[mailbox.clone()]])
            .append_query_results([[mailbox]])
            .into_connection();

        let err = service(&db)
            .create(&principal(Role::Admin), input)
            .await
            .expect_err("collision should conflict");
        assert_eq!(err.code(), "conflict");
    }

    #[tokio::test]
    async fn dev_cannot_reparent_even_own_alias() {
        let dev = principal(Role::Dev);
        let current = alias_model(Uuid::new_v4(), Some(dev.user_id));
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .into_connection();

        let changes = AliasChanges {
            account_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let err = service(&db)
            .update(&dev, &id, changes)
            .await
            .expect_err("reparenting should be admin-only");
        assert_eq!(err.code(), "forbidden");
    }

    #[tokio::test]
    async fn owner_deletes_alias_and_clears_default_reference() {
        let dev = principal(Role::Dev);
        let current = alias_model(Uuid::new_v4(), Some(dev.user_id));
        let id = current.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[current]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        service(&db)
            .delete(&dev, &id)
            .await
            .expect("owner should delete");
    }
}
