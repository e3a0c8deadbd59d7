use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::dao::PaginatedResponse,
    db::entities::api_token,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, api_token_service::IssuedApiToken},
    state::AppState,
};

use super::{ListQuery, common::DeletedResponse};

#[derive(Debug, Default, Deserialize)]
pub struct CreateTokenRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub last_used_at: Option<DateTimeWithTimeZone>,
}

impl From<api_token::Model> for ApiTokenResponse {
    fn from(model: api_token::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            last_used_at: model.last_used_at,
        }
    }
}

/// Carries the secret; this is the only response that ever does.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTokenResponse {
    #[serde(flatten)]
    pub meta: ApiTokenResponse,
    pub token: String,
}

impl From<IssuedApiToken> for CreatedTokenResponse {
    fn from(issued: IssuedApiToken) -> Self {
        Self {
            meta: issued.token.into(),
            token: issued.secret,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api-tokens", get(list).post(create))
        .route("/api-tokens/{id}", delete(remove))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<ApiTokenResponse>> {
    let page = ServiceContext::from_state(state.as_ref())
        .api_tokens()
        .list(&principal, query.page(), query.page_size())
        .await?;
    JsonApiResponse::ok(page.map(ApiTokenResponse::from))
}

async fn create(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<CreateTokenRequest>,
) -> ApiResult<CreatedTokenResponse> {
    let issued = ServiceContext::from_state(state.as_ref())
        .api_tokens()
        .create(&principal, body.name.as_deref())
        .await?;
    JsonApiResponse::created(issued.into())
}

async fn remove(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedResponse> {
    ServiceContext::from_state(state.as_ref())
        .api_tokens()
        .delete(&principal, &id)
        .await?;
    JsonApiResponse::ok(DeletedResponse::new(id))
}
