use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use super::{DaoBase, DaoResult, PaginatedResponse, Visibility};
use crate::db::entities::{alias, prelude::Alias};

#[derive(Clone)]
pub struct AliasDao {
    db: DatabaseConnection,
}

impl DaoBase for AliasDao {
    type Entity = Alias;
    const ENTITY_NAME: &'static str = "Alias";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone)]
pub struct NewAlias {
    pub alias_email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub account_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub is_public: bool,
}

impl AliasDao {
    pub async fn find_by_email(&self, alias_email: &str) -> DaoResult<Option<alias::Model>> {
        Ok(Alias::find()
            .filter(alias::Column::AliasEmail.eq(alias_email))
            .one(&self.db)
            .await?)
    }

    pub async fn create_alias(&self, data: NewAlias) -> DaoResult<alias::Model> {
        let model = alias::ActiveModel {
            alias_email: Set(data.alias_email),
            display_name: Set(data.display_name),
            is_active: Set(data.is_active),
            account_id: Set(data.account_id),
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
    ) -> DaoResult<PaginatedResponse<alias::Model>> {
        self.find(page, page_size, None, move |query| match visibility {
            Visibility::All => query,
            Visibility::PublicOrOwnedBy(user_id) => query.filter(
                Condition::any()
                    .add(alias::Column::IsPublic.eq(true))
                    .add(alias::Column::OwnerId.eq(user_id)),
            ),
        })
        .await
    }

    pub async fn release_owner(&self, owner_id: &Uuid) -> DaoResult<u64> {
        let result = Alias::update_many()
            .col_expr(alias::Column::OwnerId, Expr::value(Option::<Uuid>::None))
            .filter(alias::Column::OwnerId.eq(*owner_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
