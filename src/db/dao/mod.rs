pub mod account_dao;
pub mod alias_dao;
pub mod api_token_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod default_sender_dao;
pub mod error;
pub mod password_reset_dao;
pub mod pending_user_dao;
pub mod user_dao;

pub use account_dao::{AccountDao, AccountRemoval, NewAccount};
pub use alias_dao::{AliasDao, NewAlias};
pub use api_token_dao::ApiTokenDao;
pub use base::{DaoBase, PaginatedResponse, Visibility};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use default_sender_dao::DefaultSenderDao;
pub use error::{DaoLayerError, DaoResult};
pub use password_reset_dao::PasswordResetDao;
pub use pending_user_dao::PendingUserDao;
pub use user_dao::UserDao;
