use serde::Deserialize;
use std::env;

/// Runtime configuration, loaded from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Database settings
    pub database_url: Option<String>,

    // Asset store settings
    pub asset_store: AssetStoreConfig,

    // Authoring settings
    pub commit_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetStoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok(),

            asset_store: AssetStoreConfig {
                base_url: env::var("ASSET_STORE_URL")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                api_key: env::var("ASSET_STORE_API_KEY").ok(),
                timeout_secs: env::var("ASSET_STORE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },

            commit_attempts: env::var("AUTHORING_COMMIT_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            asset_store: AssetStoreConfig {
                base_url: "http://localhost:9000".to_string(),
                api_key: None,
                timeout_secs: 30,
            },
            commit_attempts: 3,
        }
    }
}
