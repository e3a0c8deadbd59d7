use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::Expr};
use uuid::Uuid;

use super::{DaoBase, DaoResult, PaginatedResponse};
use crate::db::entities::{api_token, prelude::ApiToken};

#[derive(Clone)]
pub struct ApiTokenDao {
    db: DatabaseConnection,
}

impl DaoBase for ApiTokenDao {
    type Entity = ApiToken;
    const ENTITY_NAME: &'static str = "API token";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl ApiTokenDao {
    pub async fn create_token(
        &self,
        user_id: &Uuid,
        name: Option<String>,
        token_hash: &str,
    ) -> DaoResult<api_token::Model> {
        let model = api_token::ActiveModel {
            user_id: Set(*user_id),
            name: Set(name),
            token_hash: Set(token_hash.to_string()),
            last_used_at: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn find_by_hash(&self, token_hash: &str) -> DaoResult<Option<api_token::Model>> {
        Ok(ApiToken::find()
            .filter(api_token::Column::TokenHash.eq(token_hash))
            .one(&self.db)
            .await?)
    }

    pub async fn list_for_user(
        &self,
        user_id: &Uuid,
        page: u64,
        page_size: u64,
    ) -> DaoResult<PaginatedResponse<api_token::Model>> {
        let user_id = *user_id;
        self.find(page, page_size, None, move |query| {
            query.filter(api_token::Column::UserId.eq(user_id))
        })
        .await
    }

    /// Deletes only when `user_id` owns the token; returns whether a row went away.
    pub async fn delete_owned(&self, id: &Uuid, user_id: &Uuid) -> DaoResult<bool> {
        let result = ApiToken::delete_many()
            .filter(api_token::Column::Id.eq(*id))
            .filter(api_token::Column::UserId.eq(*user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    pub async fn delete_for_user(&self, user_id: &Uuid) -> DaoResult<u64> {
        let result = ApiToken::delete_many()
            .filter(api_token::Column::UserId.eq(*user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn touch_last_used(&self, id: &Uuid) -> DaoResult<()> {
        ApiToken::update_many()
            .col_expr(
                api_token::Column::LastUsedAt,
                Expr::value(Some(Utc::now().fixed_offset())),
            )
            .filter(api_token::Column::Id.eq(*id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
