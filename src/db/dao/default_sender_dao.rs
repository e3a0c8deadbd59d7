use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, UpdateMany,
    sea_query::{Expr, ExprTrait},
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{default_sender, prelude::DefaultSender};

/// The setting lives in exactly one row.
pub const SINGLETON_ID: Uuid = Uuid::nil();

#[derive(Clone)]
pub struct DefaultSenderDao {
    db: DatabaseConnection,
}

impl DaoBase for DefaultSenderDao {
    type Entity = DefaultSender;
    const ENTITY_NAME: &'static str = "Default sender";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl DefaultSenderDao {
    pub async fn get(&self) -> DaoResult<Option<default_sender::Model>> {
        self.find_optional(SINGLETON_ID).await
    }

    /// First write. Racing inserts collide on the primary key.
    pub async fn insert_initial(
        &self,
        sender_type: &str,
        sender_id: &Uuid,
    ) -> DaoResult<default_sender::Model> {
        let now = Utc::now().fixed_offset();
        default_sender::ActiveModel {
            id: Set(SINGLETON_ID),
            created_at: Set(now),
            updated_at: Set(now),
            sender_type: Set(Some(sender_type.to_string())),
            sender_id: Set(Some(*sender_id)),
            version: Set(1),
        }
        .insert(&self.db)
        .await
        .map_err(DaoLayerError::Db)
    }

    /// Compare-and-set on `version`; `false` means someone else changed the
    /// row since `expected_version` was read.
    pub async fn replace_if_version(
        &self,
        expected_version: i64,
        sender_type: &str,
        sender_id: &Uuid,
    ) -> DaoResult<bool> {
        let result = DefaultSender::update_many()
            .col_expr(default_sender::Column::SenderType, Expr::value(sender_type))
            .col_expr(default_sender::Column::SenderId, Expr::value(*sender_id))
            .col_expr(
                default_sender::Column::Version,
                Expr::value(expected_version + 1),
            )
            .col_expr(
                default_sender::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(default_sender::Column::Id.eq(SINGLETON_ID))
            .filter(default_sender::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Nulls the target but keeps the row, so `version` keeps counting and a
    /// writer holding a pre-clear version still loses its compare-and-set.
    pub async fn clear(&self) -> DaoResult<bool> {
        let result = Self::clearing_update()
            .filter(default_sender::Column::SenderType.is_not_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// Clears the setting when it points at one of `ids` of the given type.
    pub async fn clear_if_references(&self, sender_type: &str, ids: &[Uuid]) -> DaoResult<bool> {
        Self::clear_references_on(&self.db, sender_type, ids).await
    }

    /// Same as [`Self::clear_if_references`] on any connection, so a
    /// cascading delete can run it inside its transaction.
    pub(crate) async fn clear_references_on<C: ConnectionTrait>(
        conn: &C,
        sender_type: &str,
        ids: &[Uuid],
    ) -> DaoResult<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let result = Self::clearing_update()
            .filter(default_sender::Column::SenderType.eq(sender_type))
            .filter(default_sender::Column::SenderId.is_in(ids.iter().copied()))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    fn clearing_update() -> UpdateMany<DefaultSender> {
        DefaultSender::update_many()
            .col_expr(
                default_sender::Column::SenderType,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                default_sender::Column::SenderId,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                default_sender::Column::Version,
                Expr::col(default_sender::Column::Version).add(1),
            )
            .col_expr(
                default_sender::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(default_sender::Column::Id.eq(SINGLETON_ID))
    }
}
