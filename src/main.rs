use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use crm_backend::{
    app,
    config::{get_config, init_config},
    middleware::cors::cors_layer,
    platform::{identity::IdentityClient, store::RestStore},
    AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let identity = IdentityClient::new(
        http_client.clone(),
        &config.platform_url,
        &config.platform_anon_key,
        &config.platform_service_key,
    );
    let store = RestStore::new(
        http_client,
        &config.platform_url,
        &config.platform_service_key,
    );

    let state = AppState::new(Arc::new(identity), Arc::new(store));

    let router = app(state)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!(
        "Server listening on {} (production: {})",
        addr, config.production
    );
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
