use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        dispatch_service::{SendReceipt, SendRequest},
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMailRequest {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    #[serde(default)]
    pub is_html: bool,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub receipt: SendReceipt,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/send", post(send)).with_state(state)
}

async fn send(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<SendMailRequest>,
) -> ApiResult<SendResponse> {
    let request = SendRequest {
        from: body.from,
        to: body.to,
        subject: body.subject,
        body: body.body,
        cc: body.cc,
        bcc: body.bcc,
        is_html: body.is_html,
    };
    let receipt = ServiceContext::from_state(state.as_ref())
        .dispatch()
        .send(&principal, request)
        .await?;
    JsonApiResponse::ok(SendResponse {
        status: "sent",
        receipt,
    })
}
