pub mod account_service;
pub mod alias_service;
pub mod api_token_service;
pub mod auth_service;
pub mod context;
pub mod dispatch_service;
pub mod password_reset_service;
pub mod sender_service;
pub mod signup_service;
pub mod system_mail;
pub mod user_service;

pub use context::{ServiceContext, ServiceSettings};
