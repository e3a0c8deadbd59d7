use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{pending_user, prelude::PendingUser};

#[derive(Clone)]
pub struct PendingUserDao {
    db: DatabaseConnection,
}

impl DaoBase for PendingUserDao {
    type Entity = PendingUser;
    const ENTITY_NAME: &'static str = "Pending signup";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PendingUserDao {
    /// Drops earlier signups for `email`, then stores the new one.
    pub async fn replace_for_email(
        &self,
        email: &str,
        password_hash: &str,
        token_hash: &str,
        expires_at: chrono::DateTime<chrono::FixedOffset>,
    ) -> DaoResult<pending_user::Model> {
        PendingUser::delete_many()
            .filter(pending_user::Column::Email.eq(email))
            .exec(&self.db)
            .await?;

        let model = pending_user::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            token_hash: Set(token_hash.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> DaoResult<Option<pending_user::Model>> {
        Ok(PendingUser::find()
            .filter(pending_user::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await?)
    }

    /// Conditional delete; `true` only for the single caller that removed the row.
    pub async fn claim(&self, id: &Uuid) -> DaoResult<bool> {
        let result = PendingUser::delete_by_id(*id).exec(&self.db).await?;
        Ok(result.rows_affected == 1)
    }
}
