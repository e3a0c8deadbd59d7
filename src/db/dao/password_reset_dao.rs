use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{password_reset_token, prelude::PasswordResetToken};

#[derive(Clone)]
pub struct PasswordResetDao {
    db: DatabaseConnection,
}

impl DaoBase for PasswordResetDao {
    type Entity = PasswordResetToken;
    const ENTITY_NAME: &'static str = "Reset token";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PasswordResetDao {
    pub async fn create_token(
        &self,
        user_id: &Uuid,
        token_hash: &str,
        expires_at: chrono::DateTime<chrono::FixedOffset>,
    ) -> DaoResult<password_reset_token::Model> {
        let model = password_reset_token::ActiveModel {
            user_id: Set(*user_id),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> DaoResult<Option<password_reset_token::Model>> {
        Ok(PasswordResetToken::find()
            .filter(password_reset_token::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await?)
    }

    pub async fn claim(&self, id: &Uuid) -> DaoResult<bool> {
        let result = PasswordResetToken::delete_by_id(*id)
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn delete_for_user(&self, user_id: &Uuid) -> DaoResult<u64> {
        let result = PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::UserId.eq(*user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use super::PasswordResetDao;
    use crate::db::dao::DaoBase;
    use crate::db::entities::password_reset_token;

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    #[tokio::test]
    async fn find_by_token_hash_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<password_reset_token::Model>::new()])
            .into_connection();
        let dao = PasswordResetDao::new(&db);

        let found = dao
            .find_by_token_hash("unknown")
            .await
            .expect("query should succeed");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn create_token_stores_digest_and_expiry() {
        let user_id = Uuid::new_v4();
        let row = password_reset_token::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            user_id,
            token_hash: "digest".to_string(),
            expires_at: ts(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[row]])
            .into_connection();
        let dao = PasswordResetDao::new(&db);

        let created = dao
            .create_token(&user_id, "digest", ts())
            .await
            .expect("insert should succeed");
        assert_eq!(created.token_hash, "digest");
        assert_eq!(created.user_id, user_id);
    }
}
