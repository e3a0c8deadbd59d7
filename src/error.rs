use sea_orm::SqlErr;

#[derive(Debug)]
pub enum AppError {
    InvalidCredentials(String),
    Unauthenticated(String),
    Forbidden(String),
    Validation(String),
    Conflict(String),
    NotFound(String),
    TokenExpired(String),
    SenderNotFound(String),
    SenderInactive(String),
    DeliveryFailed(String),
    Internal(String),
}

impl AppError {
    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials("Invalid credentials".to_string())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Expired and already-consumed tokens share one message on purpose.
    pub fn token_expired() -> Self {
        Self::TokenExpired("Invalid or expired token".to_string())
    }

    pub fn sender_not_found(message: impl Into<String>) -> Self {
        Self::SenderNotFound(message.into())
    }

    pub fn sender_inactive(message: impl Into<String>) -> Self {
        Self::SenderInactive(message.into())
    }

    pub fn delivery_failed(message: impl Into<String>) -> Self {
        Self::DeliveryFailed(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidCredentials(message)
            | Self::Unauthenticated(message)
            | Self::Forbidden(message)
            | Self::Validation(message)
            | Self::Conflict(message)
            | Self::NotFound(message)
            | Self::TokenExpired(message)
            | Self::SenderNotFound(message)
            | Self::SenderInactive(message)
            | Self::DeliveryFailed(message)
            | Self::Internal(message) => message.as_str(),
        }
    }

    /// Stable machine-readable code carried in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::TokenExpired(_) => "token_expired",
            Self::SenderNotFound(_) => "sender_not_found",
            Self::SenderInactive(_) => "sender_inactive",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::Internal(_) => "internal",
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

impl From<crate::db::dao::DaoLayerError> for AppError {
    fn from(err: crate::db::dao::DaoLayerError) -> Self {
        match err {
            crate::db::dao::DaoLayerError::NotFound { entity, .. } => {
                AppError::not_found(format!("{entity} not found"))
            }
            crate::db::dao::DaoLayerError::InvalidPagination { .. } => {
                AppError::validation(err.to_string())
            }
            crate::db::dao::DaoLayerError::Db(db_err) => {
                if let Some(SqlErr::UniqueConstraintViolation(_)) = db_err.sql_err() {
                    return AppError::conflict("Resource already exists");
                }
                tracing::error!(error = %db_err, "store error");
                AppError::internal("Storage failure")
            }
        }
    }
}
