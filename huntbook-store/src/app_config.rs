use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub run_migrations: bool,
    /// Insert the demo guides when the guides table is empty.
    pub seed_guides: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub transaction_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl BookingConfig {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `HUNTBOOK__DATABASE__URL=postgres://...` sets `database.url`
            .add_source(config::Environment::with_prefix("HUNTBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 5)?
            .set_default("database.acquire_timeout_seconds", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("database.seed_guides", false)?
            .set_default("booking.transaction_timeout_ms", 5000)
    }
}
