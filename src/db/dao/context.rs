use sea_orm::DatabaseConnection;

use super::{
    AccountDao, AliasDao, ApiTokenDao, DaoBase, DefaultSenderDao, PasswordResetDao,
    PendingUserDao, UserDao,
};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn account(&self) -> AccountDao {
        DaoBase::new(&self.db)
    }

    pub fn alias(&self) -> AliasDao {
        DaoBase::new(&self.db)
    }

    pub fn api_token(&self) -> ApiTokenDao {
        DaoBase::new(&self.db)
    }

    pub fn pending_user(&self) -> PendingUserDao {
        DaoBase::new(&self.db)
    }

    pub fn password_reset(&self) -> PasswordResetDao {
        DaoBase::new(&self.db)
    }

    pub fn default_sender(&self) -> DefaultSenderDao {
        DaoBase::new(&self.db)
    }
}
