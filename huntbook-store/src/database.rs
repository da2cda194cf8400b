use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::app_config::DatabaseConfig;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}
