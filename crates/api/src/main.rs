use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use vitrine_api::{
    app::{AppState, build_app},
    config::ApiConfig,
};
use vitrine_auth::IdentityStore;
use vitrine_infra::{InMemoryIdentityStore, PostgresIdentityStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    vitrine_observability::init(config.log_format);
    tracing::info!(?config, "starting");
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }

    let store: Arc<dyn IdentityStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresIdentityStore::connect(url, config.database_max_connections)
                .await
                .context("failed to connect to database")?;
            store.migrate().await.context("failed to run migrations")?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory identity store");
            Arc::new(InMemoryIdentityStore::new())
        }
    };

    let app = build_app(AppState::new(store, &config.jwt_secret, config.token_ttl));

    let addr = SocketAddr::new(config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")
}
