use std::sync::Arc;

mod app;
mod config;
mod db;
mod error;
mod metrics;
mod products;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "product_service=debug,axum=info,tower_http=info,sqlx=warn".to_string()
    });
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let db = db::connect(&config.db);

    // Schema failures are logged and the service starts anyway
    match db::ensure_schema(&db).await {
        Ok(()) => tracing::info!("database initialized"),
        Err(e) => tracing::error!(error = %format!("{:#}", e), "database initialization failed; continuing"),
    }

    let state = AppState::init(config, db)?;
    let addr = state.config.listen_addr()?;
    app::serve(app::build_app(state), addr).await
}
