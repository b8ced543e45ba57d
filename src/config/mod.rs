//! Configuration loading and defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. The parent directory is created at startup.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for signing tokens. Left empty, a random one is
    /// generated at startup and issued tokens do not survive restarts.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/emporium.db")
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_ttl() -> i64 {
    crate::auth::DEFAULT_TTL_MINUTES
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: default_algorithm(),
            token_ttl_minutes: default_token_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Parse the configured algorithm name into the signing algorithm.
    pub fn signing_algorithm(&self) -> Result<Algorithm> {
        self.algorithm
            .parse()
            .ok()
            .with_context(|| format!("unknown signing algorithm: {}", self.algorithm))
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Config> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("failed to parse config file: {}", path.display()))?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, PathBuf::from("./data/emporium.db"));
        assert!(config.auth.secret.is_empty());
        assert_eq!(config.auth.algorithm, "HS256");
        assert_eq!(config.auth.token_ttl_minutes, 15);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_files_fill_missing_sections_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [auth]
            secret = "abc"
            token_ttl_minutes = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.secret, "abc");
        assert_eq!(config.auth.token_ttl_minutes, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn algorithm_names_parse_and_bad_ones_error() {
        let mut auth = AuthConfig::default();
        assert_eq!(auth.signing_algorithm().unwrap(), Algorithm::HS256);

        auth.algorithm = "HS512".to_string();
        assert_eq!(auth.signing_algorithm().unwrap(), Algorithm::HS512);

        auth.algorithm = "bogus".to_string();
        assert!(auth.signing_algorithm().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
