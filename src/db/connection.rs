use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

use super::entities::{
    account, alias, api_token, default_sender, password_reset_token, pending_user, user,
};

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    sync_schema(&db).await?;
    Ok(db)
}

/// Creates or extends every table from the entity definitions.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("syncing database schema from entities");
    db.get_schema_builder()
        .register(user::Entity)
        .register(account::Entity)
        .register(alias::Entity)
        .register(api_token::Entity)
        .register(pending_user::Entity)
        .register(password_reset_token::Entity)
        .register(default_sender::Entity)
        .sync(db)
        .await
}
