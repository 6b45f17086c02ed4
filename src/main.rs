use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_search::{api, config, state::AppState, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "catalog-search {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME")
    );

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Open catalog store, create schema, seed / 打开商品存储
    let store = storage::connect(&app_config.database, &app_config.search).await?;
    if store.probe_ranked_capability().await {
        tracing::info!("Ranked search available on {}", store.name());
    } else {
        tracing::warn!("Ranked search unavailable on {}, auto mode will use substring matching", store.name());
    }

    let state = Arc::new(AppState::new(store, app_config.search.clone()));
    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
