use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::dao::PaginatedResponse,
    db::entities::alias,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        alias_service::{AliasChanges, AliasInput},
    },
    state::AppState,
};

use super::{
    ListQuery,
    common::{DeletedResponse, double_option},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAliasRequest {
    pub alias_email: String,
    pub display_name: Option<String>,
    pub account_id: Uuid,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAliasRequest {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub account_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasResponse {
    pub id: Uuid,
    pub alias_email: String,
    pub display_name: Option<String>,
    pub account_id: Uuid,
    pub is_active: bool,
    pub is_public: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<alias::Model> for AliasResponse {
    fn from(model: alias::Model) -> Self {
        Self {
            id: model.id,
            alias_email: model.alias_email,
            display_name: model.display_name,
            account_id: model.account_id,
            is_active: model.is_active,
            is_public: model.is_public,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/aliases", get(list).post(create))
        .route("/aliases/{id}", get(show).patch(update).delete(remove))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<AliasResponse>> {
    let page = ServiceContext::from_state(state.as_ref())
        .aliases()
        .list(&principal, query.page(), query.page_size())
        .await?;
    JsonApiResponse::ok(page.map(AliasResponse::from))
}

async fn create(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<CreateAliasRequest>,
) -> ApiResult<AliasResponse> {
    let input = AliasInput {
        alias_email: body.alias_email,
        display_name: body.display_name,
        account_id: body.account_id,
        is_active: body.is_active,
        is_public: body.is_public,
        owner_id: body.owner_id,
    };
    let alias = ServiceContext::from_state(state.as_ref())
        .aliases()
        .create(&principal, input)
        .await?;
    JsonApiResponse::created(alias.into())
}

async fn show(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AliasResponse> {
    let alias = ServiceContext::from_state(state.as_ref())
        .aliases()
        .get(&principal, &id)
        .await?;
    JsonApiResponse::ok(alias.into())
}

async fn update(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAliasRequest>,
) -> ApiResult<AliasResponse> {
    let changes = AliasChanges {
        display_name: body.display_name,
        is_active: body.is_active,
        is_public: body.is_public,
        account_id: body.account_id,
        owner_id: body.owner_id,
    };
    let alias = ServiceContext::from_state(state.as_ref())
        .aliases()
        .update(&principal, &id, changes)
        .await?;
    JsonApiResponse::ok(alias.into())
}

async fn remove(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedResponse> {
    ServiceContext::from_state(state.as_ref())
        .aliases()
        .delete(&principal, &id)
        .await?;
    JsonApiResponse::ok(DeletedResponse::new(id))
}
