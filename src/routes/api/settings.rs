use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        sender_service::{DefaultSenderView, SenderKind},
    },
    state::AppState,
};

use super::StatusResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDefaultSenderRequest {
    pub sender_type: SenderKind,
    pub sender_id: Uuid,
    pub expected_version: Option<i64>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/settings/default-sender",
            get(show).put(replace).delete(clear),
        )
        .with_state(state)
}

/// `data` is null while no default sender is configured.
async fn show(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
) -> ApiResult<Option<DefaultSenderView>> {
    let view = ServiceContext::from_state(state.as_ref())
        .senders()
        .get_default(&principal)
        .await?;
    JsonApiResponse::ok(view)
}

async fn replace(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<SetDefaultSenderRequest>,
) -> ApiResult<DefaultSenderView> {
    let view = ServiceContext::from_state(state.as_ref())
        .senders()
        .set_default(
            &principal,
            body.sender_type,
            body.sender_id,
            body.expected_version,
        )
        .await?;
    JsonApiResponse::ok(view)
}

async fn clear(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
) -> ApiResult<StatusResponse> {
    ServiceContext::from_state(state.as_ref())
        .senders()
        .clear_default(&principal)
        .await?;
    JsonApiResponse::ok(StatusResponse::new("cleared"))
}
