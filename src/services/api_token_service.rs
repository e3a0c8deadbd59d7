use uuid::Uuid;

use crate::{
    auth::{
        Principal,
        policy::authorize_token_management,
        secrets::{digest, generate_api_token},
    },
    db::dao::{ApiTokenDao, PaginatedResponse},
    db::entities::api_token,
    error::AppError,
};

const MAX_TOKEN_NAME_LEN: usize = 100;

/// A freshly minted token. `secret` is never retrievable again.
#[derive(Debug)]
pub struct IssuedApiToken {
    pub token: api_token::Model,
    pub secret: String,
}

#[derive(Clone)]
pub struct ApiTokenService {
    api_tokens: ApiTokenDao,
}

impl ApiTokenService {
    pub fn new(api_tokens: ApiTokenDao) -> Self {
        Self { api_tokens }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        name: Option<&str>,
    ) -> Result<IssuedApiToken, AppError> {
        authorize_token_management(principal)?;

        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if name.is_some_and(|n| n.chars().count() > MAX_TOKEN_NAME_LEN) {
            return Err(AppError::validation(format!(
                "Token name must be at most {MAX_TOKEN_NAME_LEN} characters"
            )));
        }

        let secret = generate_api_token();
        let token = self
            .api_tokens
            .create_token(&principal.user_id, name.map(str::to_string), &digest(&secret))
            .await?;
        tracing::info!(user_id = %principal.user_id, token_id = %token.id, "API token created");

        Ok(IssuedApiToken { token, secret })
    }

    pub async fn list(
        &self,
        principal: &Principal,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<api_token::Model>, AppError> {
        authorize_token_management(principal)?;
        Ok(self
            .api_tokens
            .list_for_user(&principal.user_id, page, page_size)
            .await?)
    }

    /// Someone else's token is reported exactly like a missing one.
    pub async fn delete(&self, principal: &Principal, id: &Uuid) -> Result<(), AppError> {
        authorize_token_management(principal)?;
        if !self.api_tokens.delete_owned(id, &principal.user_id).await? {
            return Err(AppError::not_found("API token not found"));
        }
        tracing::info!(user_id = %principal.user_id, token_id = %id, "API token revoked");
        Ok(())
    }
}
