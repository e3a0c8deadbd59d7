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
    db::entities::user,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        user_service::{NewUser, UserChanges},
    },
    auth::Role,
    state::AppState,
};

use super::{ListQuery, common::DeletedResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub must_change_password: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<Role>,
    pub password: Option<String>,
    pub must_change_password: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub must_change_password: bool,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            must_change_password: model.must_change_password,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/{id}", axum::routing::patch(update).delete(remove))
        .with_state(state)
}

async fn list(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<UserResponse>> {
    let page = ServiceContext::from_state(state.as_ref())
        .users()
        .list(&principal, query.page(), query.page_size())
        .await?;
    JsonApiResponse::ok(page.map(UserResponse::from))
}

async fn create(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<UserResponse> {
    let data = NewUser {
        email: body.email,
        password: body.password,
        role: body.role,
        must_change_password: body.must_change_password,
    };
    let user = ServiceContext::from_state(state.as_ref())
        .users()
        .create(&principal, data)
        .await?;
    JsonApiResponse::created(user.into())
}

async fn update(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    let changes = UserChanges {
        role: body.role,
        password: body.password,
        must_change_password: body.must_change_password,
    };
    let user = ServiceContext::from_state(state.as_ref())
        .users()
        .update(&principal, &id, changes)
        .await?;
    JsonApiResponse::ok(user.into())
}

async fn remove(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Path(id): Path<Uuid>,
) -> ApiResult<DeletedResponse> {
    ServiceContext::from_state(state.as_ref())
        .users()
        .delete(&principal, &id)
        .await?;
    JsonApiResponse::ok(DeletedResponse::new(id))
}
