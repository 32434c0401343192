//! Process configuration, read once at startup.
//!
//! Values come from the environment, optionally seeded from a `.env` file in the
//! working directory. Every variable has a default so a bare `cargo run` imports
//! `data/*.csv` into `shopverse.sqlite` and serves on `127.0.0.1:8080`.

use crate::batch::job::ImportSources;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "shopverse.sqlite";
const DEFAULT_DATA_DIR: &str = "data";

pub const CATEGORIES_FILE: &str = "categories.csv";
pub const PRODUCTS_FILE: &str = "products.csv";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: invalid port '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var}: expected true/false, got '{value}'")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    /// Keep serving the job status API once the startup import has finished.
    pub serve: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is not an error.
        let _ = dotenv::dotenv();
        Self::from_vars(std::env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let port = match get("SHOPVERSE_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort {
                var: "SHOPVERSE_PORT",
                value: raw.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let serve = match get("SHOPVERSE_SERVE") {
            Some(raw) => parse_flag("SHOPVERSE_SERVE", raw)?,
            None => true,
        };

        Ok(Self {
            host: get("SHOPVERSE_HOST").unwrap_or(DEFAULT_HOST).to_string(),
            port,
            db_path: PathBuf::from(get("SHOPVERSE_DB_PATH").unwrap_or(DEFAULT_DB_PATH)),
            data_dir: PathBuf::from(get("SHOPVERSE_DATA_DIR").unwrap_or(DEFAULT_DATA_DIR)),
            serve,
        })
    }

    pub fn import_sources(&self) -> ImportSources {
        ImportSources {
            categories: self.data_dir.join(CATEGORIES_FILE),
            products: self.data_dir.join(PRODUCTS_FILE),
        }
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_vars(HashMap::new()).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.db_path, PathBuf::from("shopverse.sqlite"));
        assert!(config.serve);

        let sources = config.import_sources();
        assert_eq!(sources.categories, PathBuf::from("data/categories.csv"));
        assert_eq!(sources.products, PathBuf::from("data/products.csv"));
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_vars(vars(&[
            ("SHOPVERSE_HOST", "0.0.0.0"),
            ("SHOPVERSE_PORT", "9090"),
            ("SHOPVERSE_DB_PATH", "/tmp/catalog.sqlite"),
            ("SHOPVERSE_DATA_DIR", "/srv/import"),
            ("SHOPVERSE_SERVE", "off"),
        ]))
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.db_path, PathBuf::from("/tmp/catalog.sqlite"));
        assert_eq!(
            config.import_sources().products,
            PathBuf::from("/srv/import/products.csv")
        );
        assert!(!config.serve);
    }

    #[test]
    fn rejects_bad_port_and_flag() {
        assert_eq!(
            AppConfig::from_vars(vars(&[("SHOPVERSE_PORT", "http")])),
            Err(ConfigError::InvalidPort {
                var: "SHOPVERSE_PORT",
                value: "http".into()
            })
        );
        assert!(matches!(
            AppConfig::from_vars(vars(&[("SHOPVERSE_SERVE", "maybe")])),
            Err(ConfigError::InvalidFlag { .. })
        ));
    }
}
