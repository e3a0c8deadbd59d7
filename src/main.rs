use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{Router, middleware::from_fn};
use tower_http::trace::TraceLayer;

use mail_relay::{
    auth::bootstrap::{init_auth, jwt_keys, turnstile},
    config::AppConfig,
    db::connect,
    logging::init_tracing,
    mailer::{LettreTransport, MailTransport},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    services::{ServiceContext, ServiceSettings},
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging);

    let db_cfg = cfg
        .database
        .clone()
        .context("database section is required to run the relay")?;
    let auth_cfg = cfg
        .auth
        .clone()
        .context("auth section is required to run the relay")?;

    let db = connect(&db_cfg).await?;
    let jwt = jwt_keys(&auth_cfg);
    let mailer: Arc<dyn MailTransport> = Arc::new(LettreTransport::new(&cfg.mail));

    let services = ServiceContext::new(
        &db,
        jwt.clone(),
        mailer.clone(),
        ServiceSettings::from_config(&cfg),
    );
    init_auth(&auth_cfg, &services).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;

    let state = AppState::new(cfg, db, jwt, mailer, turnstile(&auth_cfg));

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
