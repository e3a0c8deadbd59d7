use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{CredentialKind, Principal, Role, SessionToken},
    db::entities::user,
    middleware::AuthGuard,
    response::{ApiResult, JsonApiResponse},
    services::ServiceContext,
    state::AppState,
};

use super::StatusResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub role: Role,
    pub must_change_password: bool,
    pub expires_in: usize,
}

impl From<SessionToken> for LoginResponse {
    fn from(session: SessionToken) -> Self {
        Self {
            token: session.token,
            token_type: "Bearer",
            role: session.role,
            must_change_password: session.must_change_password,
            expires_in: session.expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub email: String,
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResetRequest {
    pub token: String,
    pub new_password: String,
    pub turnstile_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub must_change_password: bool,
    pub credential: CredentialKind,
}

impl MeResponse {
    fn new(user: user::Model, principal: &Principal) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: principal.role,
            must_change_password: user.must_change_password,
            credential: principal.credential,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/change-password", post(change_password))
        .route("/auth/signup", post(signup))
        .route("/auth/signup/verify", post(verify))
        .route("/auth/password-reset", post(request_reset))
        .route("/auth/password-reset/confirm", post(confirm_reset))
        .route("/auth/me", get(me))
        .with_state(state)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    state.turnstile.verify(body.turnstile_token.as_deref()).await?;
    let session = ServiceContext::from_state(state.as_ref())
        .auth()
        .login(&body.email, &body.password)
        .await?;
    JsonApiResponse::ok(session.into())
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    principal: AuthGuard,
    Json(body): Json<ChangePasswordRequest>,
) -> ApiResult<StatusResponse> {
    ServiceContext::from_state(state.as_ref())
        .auth()
        .change_password(&principal, &body.current_password, &body.new_password)
        .await?;
    JsonApiResponse::ok(StatusResponse::new("ok"))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> ApiResult<StatusResponse> {
    state.turnstile.verify(body.turnstile_token.as_deref()).await?;
    ServiceContext::from_state(state.as_ref())
        .signup()
        .signup(&body.email, &body.password)
        .await?;
    JsonApiResponse::ok(StatusResponse::new("pending"))
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyRequest>,
) -> ApiResult<StatusResponse> {
    ServiceContext::from_state(state.as_ref())
        .signup()
        .verify(&body.token)
        .await?;
    JsonApiResponse::ok(StatusResponse::new("verified"))
}

async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetRequest>,
) -> ApiResult<StatusResponse> {
    state.turnstile.verify(body.turnstile_token.as_deref()).await?;
    ServiceContext::from_state(state.as_ref())
        .password_reset()
        .request_reset(&body.email)
        .await;
    JsonApiResponse::ok(StatusResponse::new("ok"))
}

async fn confirm_reset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmResetRequest>,
) -> ApiResult<StatusResponse> {
    state.turnstile.verify(body.turnstile_token.as_deref()).await?;
    ServiceContext::from_state(state.as_ref())
        .password_reset()
        .confirm_reset(&body.token, &body.new_password)
        .await?;
    JsonApiResponse::ok(StatusResponse::new("success"))
}

async fn me(State(state): State<Arc<AppState>>, principal: AuthGuard) -> ApiResult<MeResponse> {
    let user = ServiceContext::from_state(state.as_ref())
        .auth()
        .me(&principal)
        .await?;
    JsonApiResponse::ok(MeResponse::new(user, &principal))
}
