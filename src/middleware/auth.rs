use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header};

use crate::{auth::Principal, error::AppError, services::ServiceContext, state::AppState};

// Bearer guard: a session JWT or an API token, resolved against the user row.
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(principal);
        }

        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let token = auth
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthenticated("Missing/invalid Authorization header"))?;

        let principal = ServiceContext::from_state(state.as_ref())
            .auth()
            .authenticate(token)
            .await?;

        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

pub type AuthGuard = Principal;
