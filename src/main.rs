// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Checkin-Badges API Server
//!
//! Records conference check-ins and awards attendance badges.

use anyhow::Context;
use checkin_badges::{config::Config, db::Db, services::SeedData, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        port = config.port,
        backend = ?config.storage_backend,
        "Starting Checkin-Badges API"
    );

    let db = Db::connect(&config)
        .await
        .context("Failed to connect to storage")?;

    if let Some(path) = &config.seed_file {
        tracing::info!(path = %path.display(), "Loading seed data");
        let seed = SeedData::load_from_file(path)
            .with_context(|| format!("Failed to load seed file {}", path.display()))?;
        seed.apply(&db).await.context("Failed to apply seed data")?;
    }

    let state = Arc::new(AppState::new(config.clone(), db));
    let app = checkin_badges::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("checkin_badges=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
