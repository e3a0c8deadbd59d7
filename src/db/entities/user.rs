use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::base_entity;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    #[sea_orm(default_value = false)]
    pub must_change_password: bool,
    pub last_login_at: Option<DateTimeWithTimeZone>,
}

impl ActiveModelBehavior for ActiveModel {}

base_entity!();
