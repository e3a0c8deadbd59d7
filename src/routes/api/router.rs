use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{accounts, aliases, api_tokens, auth, public, send, settings, users};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(auth::router(state.clone()))
        .merge(accounts::router(state.clone()))
        .merge(aliases::router(state.clone()))
        .merge(settings::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(api_tokens::router(state.clone()))
        .merge(send::router(state))
}
