use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::scanner::ScanConfig;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// SQLite catalog file. `~` is expanded on load.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub scan: ScanConfig,

    /// Provider configuration seeded into the catalog on startup.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("~/.local/share/showkeeper/catalog.sqlite")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            scan: ScanConfig::default(),
            providers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub name: String,

    /// Higher values are queried first.
    #[serde(default)]
    pub priority: i64,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Flat settings handed to the provider factory (API keys, language...).
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}
