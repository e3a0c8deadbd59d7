use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::base_entity;

/// A send-as address that travels over its parent account's credentials.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "aliases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub alias_email: String,
    pub display_name: Option<String>,
    #[sea_orm(default_value = true)]
    pub is_active: bool,
    #[sea_orm(indexed)]
    pub account_id: Uuid,
    #[sea_orm(indexed)]
    pub owner_id: Option<Uuid>,
    #[sea_orm(default_value = false)]
    pub is_public: bool,
}

impl ActiveModelBehavior for ActiveModel {}

base_entity!();
