use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use huntbook_api::{app, AppState};
use huntbook_core::BookingCoordinator;
use huntbook_store::{DbClient, PgBookingDatabase, PgGuideDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "huntbook_api=debug,huntbook_core=debug,huntbook_store=info,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = huntbook_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Huntbook API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let guides = PgGuideDirectory::new(db.pool.clone());
    if config.database.seed_guides {
        guides.seed_demo_guides().await.context("Failed to seed guides")?;
    }

    let coordinator = BookingCoordinator::new(Arc::new(PgBookingDatabase::new(db.pool.clone())))
        .with_timeout(config.booking.transaction_timeout());
    let app_state = AppState::new(coordinator, Arc::new(guides));

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
