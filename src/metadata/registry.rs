//! Provider catalog and per-scan provider registry.
//!
//! The [`ProviderCatalog`] is long-lived: embedders register a factory for
//! every provider they ship. A [`ProviderRegistry`] is built from the catalog
//! at the start of each scan, using the enabled provider configurations stored
//! for the media kind, and is dropped when the scan ends.

use std::collections::HashMap;
use std::sync::Arc;

use rusqlite::Connection;
use showkeeper_common::{MediaKind, Result};
use showkeeper_db::models::ScraperConfig;
use showkeeper_db::queries::scrapers;
use tracing::{debug, info, warn};

use super::provider::{ProviderSettings, SearchCandidate, TvShowProvider};

/// Constructor for a provider instance from its stored settings.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> anyhow::Result<Arc<dyn TvShowProvider>> + Send + Sync>;

/// Name to factory mapping of every provider the process knows how to build.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for provider `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderSettings) -> anyhow::Result<Arc<dyn TvShowProvider>>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Names of all registered providers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn get(&self, name: &str) -> Option<&ProviderFactory> {
        self.factories.get(name)
    }
}

/// Providers instantiated for one scan session, in priority order.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = ProviderRegistry::load(&catalog, &conn, MediaKind::TvShow)?;
/// let candidates = registry.search_show("The Expanse").await;
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<(String, Arc<dyn TvShowProvider>)>,
}

impl ProviderRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already built provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn TvShowProvider>) {
        self.providers.push((provider.name().to_string(), provider));
    }

    /// Build a registry from stored configurations.
    ///
    /// Enabled configurations are instantiated once each, in the given order.
    /// Providers missing from the catalog or whose factory fails are logged
    /// and skipped.
    pub fn from_configs(catalog: &ProviderCatalog, configs: &[ScraperConfig]) -> Self {
        let mut registry = Self::new();

        for config in configs.iter().filter(|c| c.enabled) {
            let Some(factory) = catalog.get(&config.provider) else {
                warn!(provider = %config.provider, "Provider is configured but not registered");
                continue;
            };

            match factory(&config.settings) {
                Ok(provider) => registry
                    .providers
                    .push((config.provider.clone(), provider)),
                Err(e) => {
                    warn!(provider = %config.provider, error = %e, "Failed to initialise provider");
                }
            }
        }

        if registry.is_empty() {
            warn!("No metadata provider loaded");
        } else {
            info!(providers = %registry.names().join(","), "Loaded metadata providers");
        }

        registry
    }

    /// Load the provider configurations for `media_kind` and build a registry.
    pub fn load(
        catalog: &ProviderCatalog,
        conn: &Connection,
        media_kind: MediaKind,
    ) -> Result<Self> {
        let configs = scrapers::list_scrapers(conn, media_kind)?;
        Ok(Self::from_configs(catalog, &configs))
    }

    /// Look up a provider by its registered name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn TvShowProvider>> {
        self.providers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| Arc::clone(p))
    }

    /// Registered names, in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of loaded providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider was loaded.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Search every provider for `title` and concatenate the results in
    /// priority order.
    ///
    /// A failing provider contributes nothing; the failure is logged and the
    /// remaining providers are still queried.
    pub async fn search_show(&self, title: &str) -> Vec<SearchCandidate> {
        let mut all_results = Vec::new();

        for (name, provider) in &self.providers {
            match provider.search_show(title).await {
                Ok(results) => {
                    debug!(provider = %name, title, count = results.len(), "Search results");
                    all_results.extend(results);
                }
                Err(e) => {
                    warn!(provider = %name, title, error = %e, "Provider search failed");
                }
            }
        }

        all_results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::provider::BoundShow;
    use async_trait::async_trait;

    /// A minimal stub provider used for testing.
    struct StubProvider {
        provider_name: String,
        fail: bool,
        titles: Vec<&'static str>,
    }

    #[async_trait]
    impl TvShowProvider for StubProvider {
        fn name(&self) -> &str {
            &self.provider_name
        }

        async fn search_show(&self, _title: &str) -> anyhow::Result<Vec<SearchCandidate>> {
            if self.fail {
                anyhow::bail!("provider offline");
            }
            Ok(self
                .titles
                .iter()
                .enumerate()
                .map(|(i, t)| SearchCandidate {
                    title: t.to_string(),
                    provider_name: self.provider_name.clone(),
                    provider_id: i.to_string(),
                    provider_data: String::new(),
                    premiered: None,
                })
                .collect())
        }

        fn configure(&self, _id: &str, _data: &str) -> anyhow::Result<Box<dyn BoundShow>> {
            anyhow::bail!("not implemented")
        }
    }

    fn stub_catalog() -> ProviderCatalog {
        let mut catalog = ProviderCatalog::new();
        catalog.register("alpha", |_settings: &ProviderSettings| {
            Ok(Arc::new(StubProvider {
                provider_name: "alpha".into(),
                fail: false,
                titles: vec!["Alpha One", "Alpha Two"],
            }) as Arc<dyn TvShowProvider>)
        });
        catalog.register("beta", |settings: &ProviderSettings| {
            Ok(Arc::new(StubProvider {
                provider_name: "beta".into(),
                fail: settings.get("offline").is_some(),
                titles: vec!["Beta"],
            }) as Arc<dyn TvShowProvider>)
        });
        catalog.register("broken", |_settings: &ProviderSettings| {
            anyhow::bail!("missing api key")
        });
        catalog
    }

    fn config(provider: &str, enabled: bool, settings: &[(&str, &str)]) -> ScraperConfig {
        ScraperConfig {
            media_kind: MediaKind::TvShow,
            provider: provider.to_string(),
            priority: 0,
            enabled,
            settings: settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_from_configs_keeps_order_and_skips_unusable() {
        let configs = vec![
            config("beta", true, &[]),
            config("unknown", true, &[]),
            config("broken", true, &[]),
            config("alpha", false, &[]),
            config("alpha", true, &[]),
        ];

        let registry = ProviderRegistry::from_configs(&stub_catalog(), &configs);
        assert_eq!(registry.names(), vec!["beta", "alpha"]);
        assert!(registry.get("alpha").is_some());
        assert!(registry.get("broken").is_none());
    }

    #[tokio::test]
    async fn test_search_concatenates_in_priority_order() {
        let configs = vec![config("beta", true, &[]), config("alpha", true, &[])];
        let registry = ProviderRegistry::from_configs(&stub_catalog(), &configs);

        let titles: Vec<_> = registry
            .search_show("anything")
            .await
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Beta", "Alpha One", "Alpha Two"]);
    }

    #[tokio::test]
    async fn test_failing_provider_contributes_nothing() {
        let configs = vec![
            config("beta", true, &[("offline", "1")]),
            config("alpha", true, &[]),
        ];
        let registry = ProviderRegistry::from_configs(&stub_catalog(), &configs);

        let results = registry.search_show("anything").await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.provider_name == "alpha"));
    }

    #[test]
    fn test_load_reads_stored_configuration() {
        let pool = showkeeper_db::pool::init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        scrapers::upsert_scraper(&conn, MediaKind::TvShow, "alpha", 1, true, &HashMap::new())
            .unwrap();
        scrapers::upsert_scraper(&conn, MediaKind::TvShow, "beta", 2, true, &HashMap::new())
            .unwrap();

        let registry = ProviderRegistry::load(&stub_catalog(), &conn, MediaKind::TvShow).unwrap();
        assert_eq!(registry.names(), vec!["beta", "alpha"]);
        assert_eq!(stub_catalog().names(), vec!["alpha", "beta", "broken"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProviderRegistry::from_configs(&stub_catalog(), &[]);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
