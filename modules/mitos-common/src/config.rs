use std::env;

use crate::error::MitosError;

/// Default on-disk location of the embedded database, relative to the
/// working directory of the server process.
pub const DEFAULT_SQLITE_PATH: &str = "data/mitos.db";

/// Application configuration loaded from environment variables.
///
/// The presence of `DATABASE_URL` selects the managed Postgres backend;
/// when absent the archive is served from a local SQLite file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string (production). `None` selects SQLite.
    pub database_url: Option<String>,

    /// Path of the embedded SQLite database file.
    pub sqlite_path: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables. Nothing is required:
    /// a bare environment yields a local SQLite-backed configuration.
    pub fn from_env() -> Result<Self, MitosError> {
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());

        let web_port = env::var("WEB_PORT").unwrap_or_else(|_| "3000".to_string());
        let web_port = web_port
            .parse()
            .map_err(|_| MitosError::Config(format!("WEB_PORT must be a number, got {web_port:?}")))?;

        Ok(Self {
            database_url,
            sqlite_path: env::var("MITOS_SQLITE_PATH")
                .unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port,
        })
    }

    /// Whether the remote (Postgres) backend is selected.
    pub fn is_remote_backend(&self) -> bool {
        self.database_url.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_config_selects_sqlite() {
        let config = AppConfig {
            database_url: None,
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            web_host: "0.0.0.0".to_string(),
            web_port: 3000,
        };
        assert!(!config.is_remote_backend());
    }

    #[test]
    fn database_url_selects_remote() {
        let config = AppConfig {
            database_url: Some("postgres://localhost/mitos".to_string()),
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            web_host: "0.0.0.0".to_string(),
            web_port: 3000,
        };
        assert!(config.is_remote_backend());
    }
}
