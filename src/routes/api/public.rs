use axum::{Router, routing::get};

use crate::response::{ApiResult, JsonApiResponse};

use super::StatusResponse;

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> ApiResult<StatusResponse> {
    JsonApiResponse::ok(StatusResponse::new("ok"))
}
