use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult, DefaultSenderDao, PaginatedResponse, Visibility};
use crate::db::entities::{
    account, alias, default_sender,
    prelude::{Account, Alias},
};

#[derive(Clone)]
pub struct AccountDao {
    db: DatabaseConnection,
}

impl DaoBase for AccountDao {
    type Entity = Account;
    const ENTITY_NAME: &'static str = "Account";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// What a cascading account delete took with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountRemoval {
    pub aliases_removed: u64,
    pub default_sender_cleared: bool,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub is_active: bool,
    pub owner_id: Option<Uuid>,
    pub is_public: bool,
}

impl AccountDao {
    /// Removes the account, its aliases and any default-sender reference to
    /// them in one transaction. Nothing is removed when the account is gone.
    pub async fn delete_cascade(&self, account_id: &Uuid) -> DaoResult<AccountRemoval> {
        let txn = self.db.begin().await?;

        let alias_ids: Vec<Uuid> = Alias::find()
            .select_only()
            .column(alias::Column::Id)
            .filter(alias::Column::AccountId.eq(*account_id))
            .into_tuple()
            .all(&txn)
            .await?;

        let mut default_sender_cleared =
            DefaultSenderDao::clear_references_on(&txn, default_sender::ACCOUNT, &[*account_id])
                .await?;
        default_sender_cleared |=
            DefaultSenderDao::clear_references_on(&txn, default_sender::ALIAS, &alias_ids).await?;

        let aliases_removed = Alias::delete_many()
            .filter(alias::Column::AccountId.eq(*account_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let deleted = Account::delete_by_id(*account_id).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Err(Self::not_found(*account_id));
        }

        txn.commit().await?;
        Ok(AccountRemoval {
            aliases_removed,
            default_sender_cleared,
        })
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<account::Model>> {
        Ok(Account::find()
            .filter(account::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    pub async fn create_account(&self, data: NewAccount) -> DaoResult<account::Model> {
        let model = account::ActiveModel {
            email: Set(data.email),
            display_name: Set(data.display_name),
            password: Set(data.password),
            is_active: Set(data.is_active),
            owner_id: Set(data.owner_id),
            is_public: Set(data.is_public),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn list_visible(
        &self,
        page: u64,
        page_size: u64,
        visibility: Visibility,
    ) -> DaoResult<PaginatedResponse<account::Model>> {
        self.find(page, page_size, None, move |query| match visibility {
            Visibility::All => query,
            Visibility::PublicOrOwnedBy(user_id) => query.filter(
                Condition::any()
                    .add(account::Column::IsPublic.eq(true))
                    .add(account::Column::OwnerId.eq(user_id)),
            ),
        })
        .await
    }

    /// Returns the user's accounts to the admin-managed pool.
    pub async fn release_owner(&self, owner_id: &Uuid) -> DaoResult<u64> {
        let result = Account::update_many()
            .col_expr(account::Column::OwnerId, Expr::value(Option::<Uuid>::None))
            .filter(account::Column::OwnerId.eq(*owner_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{AccountDao, NewAccount};
    use crate::db::dao::{DaoBase, DaoLayerError, Visibility};
    use crate::db::entities::{account, alias};

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn account_model(email: &str, owner_id: Option<Uuid>) -> account::Model {
        account::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            email: email.to_string(),
            display_name: Some("Support".to_string()),
            password: "mailbox-secret".to_string(),
            is_active: true,
            owner_id,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn create_account_returns_inserted_row() {
        let owner = Uuid::new_v4();
        let row = account_model("support@example.com", Some(owner));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row.clone()]])
            .into_connection();
        let dao = AccountDao::new(&db);

        let created = dao
            .create_account(NewAccount {
                email: "support@example.com".to_string(),
                display_name: Some("Support".to_string()),
                password: "mailbox-secret".to_string(),
                is_active: true,
                owner_id: Some(owner),
                is_public: false,
            })
            .await
            .expect("insert should succeed");
        assert_eq!(created.owner_id, Some(owner));
        assert_eq!(created.email, row.email);
    }

    #[tokio::test]
    async fn list_visible_reports_next_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                account_model("a@example.com", None),
                account_model("b@example.com", None),
                account_model("c@example.com", None),
            ]])
            .into_connection();
        let dao = AccountDao::new(&db);

        let page = dao
            .list_visible(1, 2, Visibility::PublicOrOwnedBy(Uuid::new_v4()))
            .await
            .expect("list should succeed");
        assert_eq!(page.data.len(), 2);
        assert!(page.has_next);
    }

    #[tokio::test]
    async fn list_rejects_oversized_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = AccountDao::new(&db);

        let err = dao
            .list_visible(1, 500, Visibility::All)
            .await
            .expect_err("page size should be rejected");
        assert!(matches!(err, DaoLayerError::InvalidPagination { .. }));
    }

    #[tokio::test]
    async fn release_owner_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();
        let dao = AccountDao::new(&db);

        let released = dao
            .release_owner(&Uuid::new_v4())
            .await
            .expect("update should succeed");
        assert_eq!(released, 3);
    }

    #[tokio::test]
    async fn delete_cascade_reports_what_it_removed() {
        // alias ids, default-sender clear, alias delete, account delete
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<alias::Model>::new()])
            .append_exec_results([exec(1), exec(0), exec(1)])
            .into_connection();
        let dao = AccountDao::new(&db);

        let removal = dao
            .delete_cascade(&Uuid::new_v4())
            .await
            .expect("cascade should commit");
        assert!(removal.default_sender_cleared);
        assert_eq!(removal.aliases_removed, 0);
    }

    #[tokio::test]
    async fn delete_cascade_of_missing_account_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<alias::Model>::new()])
            .append_exec_results([exec(0), exec(0), exec(0)])
            .into_connection();
        let dao = AccountDao::new(&db);

        let err = dao
            .delete_cascade(&Uuid::new_v4())
            .await
            .expect_err("missing account should roll back");
        assert!(matches!(err, DaoLayerError::NotFound { .. }));
    }
}
