mod types;

pub use types::*;

use anyhow::{Context, Result};
use rusqlite::Connection;
use showkeeper_common::MediaKind;
use showkeeper_db::queries::scrapers;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Upper bound on `scan.max_concurrent_scans`; the store pool holds 8
/// connections and each running show holds at most one.
pub const MAX_CONCURRENT_SCANS: usize = 8;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./showkeeper.toml",
        "~/.config/showkeeper/config.toml",
        "/etc/showkeeper/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    expand_paths(&mut config);
    Ok(config)
}

fn expand_paths(config: &mut Config) {
    let raw = config.database_path.to_string_lossy();
    let expanded = shellexpand::tilde(raw.as_ref()).into_owned();
    config.database_path = PathBuf::from(expanded);
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.database_path.as_os_str().is_empty() {
        anyhow::bail!("database_path cannot be empty");
    }

    check_concurrency(config.scan.max_concurrent_scans)
        .context("Invalid scan.max_concurrent_scans")?;

    let mut seen = HashSet::new();
    for provider in &config.providers {
        if provider.name.trim().is_empty() {
            anyhow::bail!("Provider entry has an empty name");
        }
        if !seen.insert(provider.name.as_str()) {
            anyhow::bail!("Provider '{}' is configured twice", provider.name);
        }
    }

    Ok(())
}

/// Reject a concurrent scan count above [`MAX_CONCURRENT_SCANS`].
pub fn check_concurrency(max_concurrent_scans: usize) -> Result<()> {
    if max_concurrent_scans > MAX_CONCURRENT_SCANS {
        anyhow::bail!(
            "{} concurrent scans requested but the limit is {}",
            max_concurrent_scans,
            MAX_CONCURRENT_SCANS
        );
    }
    Ok(())
}

/// Write the configured providers into the catalog's TV provider table.
///
/// Rows for providers not mentioned in the config are left as they are.
pub fn seed_providers(conn: &Connection, providers: &[ProviderConfig]) -> Result<()> {
    for provider in providers {
        scrapers::upsert_scraper(
            conn,
            MediaKind::TvShow,
            &provider.name,
            provider.priority,
            provider.enabled,
            &provider.settings,
        )
        .with_context(|| format!("Failed to store provider '{}'", provider.name))?;
    }
    Ok(())
}
