use sea_orm::entity::prelude::*;

use crate::db::dao::base_traits::base_entity;

pub const ACCOUNT: &str = "account";
pub const ALIAS: &str = "alias";

/// Singleton row naming the identity used for system mail. `version` is bumped
/// on every change, clearing included, so concurrent writers can detect each
/// other. A cleared setting keeps its row with both sender columns null.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "default_sender")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    pub sender_type: Option<String>,
    pub sender_id: Option<Uuid>,
    pub version: i64,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `None` once the setting has been cleared.
    pub fn target(&self) -> Option<(&str, Uuid)> {
        Some((self.sender_type.as_deref()?, self.sender_id?))
    }
}

base_entity!();
