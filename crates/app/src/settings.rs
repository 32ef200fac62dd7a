//! Settings for the `till` binary.
//!
//! Read from an optional `till.toml` in the working directory, then from
//! `TILL__*` environment variables (`TILL__APP__LEVEL=debug`,
//! `TILL__DATABASE=memory`).
//!
//! ```toml
//! [app]
//! level = "info"
//!
//! [database]
//! sqlite = "./till.db"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("app.level", "info")?
            .set_default("database.sqlite", "./till.db")?
            .add_source(File::with_name("till").required(false))
            .add_source(
                Environment::with_prefix("TILL")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
