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
    db::entities::account,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        account_service::{AccountChanges, AccountInput},
    },
    state::AppState,
};

use super::{
    ListQuery,
    common::{DeletedResponse, double_option},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub display_name: Option<String>,
    pub is_active: Option<bool>,
    pub is_public: Option<bool>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner_id: Option<Option<Uuid>>,
}

/// The mailbox password never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub is_public: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
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
        .route("/accounts", get(list).post(create))
        .route("/accounts/{id}", get(show).patch(update).delete(remove))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<AccountResponse>> {
    let page = ServiceContext::from_state(state.as_ref())
        .accounts()
        .list(&principal, query.page(), query.page_size())
        .await?;
    JsonApiResponse::ok(page.map(AccountResponse::from))
}

async fn create(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<CreateAccountRequest>,
) -> ApiResult<AccountResponse> {
    let input = AccountInput {
        email: body.email,
        display_name: body.display_name,
        password: body.password,
        is_active: body.is_active,
        is_public: body.is_public,
        owner_id: body.owner_id,
    };
    let account = ServiceContext::from_state(state.as_ref())
        .accounts()
        .create(&principal, input)
        .await?;
    JsonApiResponse::created(account.into())
}

async fn show(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<AccountResponse> {
    let account = ServiceContext::from_state(state.as_ref())
        .accounts()
        .get(&principal, &id)
        .await?;
    JsonApiResponse::ok(account.into())
}

async fn update(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAccountRequest>,
) -> ApiResult<AccountResponse> {
    let changes = AccountChanges {
        display_name: body.display_name,
        is_active: body.is_active,
        is_public: body.is_public,
        password: body.password,
        owner_id: body.owner_id,
    };
    let account = ServiceContext::from_state(state.as_ref())
        .accounts()
        .update(&principal, &id, changes)
        .await?;
    JsonApiResponse::ok(account.into())
}

async fn remove(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedResponse> {
    ServiceContext::from_state(state.as_ref())
        .accounts()
        .delete(&principal, &id)
        .await?;
    JsonApiResponse::ok(DeletedResponse::new(id))
}
