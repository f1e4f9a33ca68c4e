use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::{error, warn};

use crate::config::DbConfig;

const CREATE_PRODUCTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL,
        price       NUMERIC NOT NULL,
        stock       BIGINT NOT NULL CHECK (stock >= 0),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Connection options from DATABASE_URL. A missing or malformed URL is
/// logged and replaced by libpq defaults (PG* env vars, localhost:5432),
/// so the failure shows up later as a schema or query error instead.
pub fn connect_options(cfg: &DbConfig) -> PgConnectOptions {
    match cfg.url.as_deref().map(PgConnectOptions::from_str) {
        Some(Ok(opts)) => opts,
        Some(Err(e)) => {
            error!(error = %e, "DATABASE_URL is malformed; using libpq defaults");
            PgConnectOptions::new()
        }
        None => {
            warn!("DATABASE_URL is not set; using libpq defaults");
            PgConnectOptions::new()
        }
    }
}

/// Builds the pool without touching the database, so a down server
/// does not keep the process from starting.
pub fn connect(cfg: &DbConfig) -> PgPool {
    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .connect_lazy_with(connect_options(cfg))
}

/// Creates the products table if it is missing. There is no migration history.
pub async fn ensure_schema(db: &PgPool) -> anyhow::Result<()> {
    sqlx::query(CREATE_PRODUCTS_TABLE)
        .execute(db)
        .await
        .context("create products table")?;
    Ok(())
}
