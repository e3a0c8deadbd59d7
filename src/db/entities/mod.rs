#[allow(unused_imports)]
pub mod prelude {
    pub use super::account::Entity as Account;
    pub use super::alias::Entity as Alias;
    pub use super::api_token::Entity as ApiToken;
    pub use super::default_sender::Entity as DefaultSender;
    pub use super::password_reset_token::Entity as PasswordResetToken;
    pub use super::pending_user::Entity as PendingUser;
    pub use super::user::Entity as User;
}

pub mod account;
pub mod alias;
pub mod api_token;
pub mod default_sender;
pub mod password_reset_token;
pub mod pending_user;
pub mod user;
