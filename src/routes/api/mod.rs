pub mod accounts;
pub mod aliases;
pub mod api_tokens;
pub mod auth;
mod common;
pub mod public;
mod router;
pub mod send;
pub mod settings;
pub mod users;

pub use common::{ListQuery, StatusResponse};
pub use router::router;
