//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which creates a temporary library directory and a
//! file-backed catalog (so concurrent scan tasks can hold several
//! connections), and [`StubProvider`], a scriptable in-memory provider.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use showkeeper::metadata::provider::{
    BoundShow, EpisodeDetail, PersonDetail, ProviderRecord, ProviderSettings, SearchCandidate,
    SeasonDetail, ShowDetail, TagDetail, TvShowProvider,
};
use showkeeper::metadata::ProviderCatalog;
use showkeeper::scanner::{ScanConfig, ScanContext};
use showkeeper_common::MediaKind;
use showkeeper_db::models::Library;
use showkeeper_db::pool::{get_conn, init_pool, DbPool, PooledConnection};
use showkeeper_db::queries::{libraries, scrapers};

/// Temporary library plus catalog.
pub struct TestHarness {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub root: PathBuf,
    pub db: DbPool,
    pub library: Library,
}

impl TestHarness {
    /// Create an empty library backed by a fresh catalog file.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = dir.path().join("tv");
        std::fs::create_dir_all(&root).expect("failed to create library root");

        let db_path = dir.path().join("catalog.sqlite");
        let db = init_pool(db_path.to_str().expect("temp path is UTF-8"))
            .expect("failed to create pool");

        let library = {
            let conn = get_conn(&db).expect("failed to get db connection");
            libraries::create_library(&conn, "TV", root.to_str().expect("temp path is UTF-8"))
                .expect("failed to create library")
        };

        Self {
            _dir: dir,
            db_path,
            root,
            db,
            library,
        }
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create a show folder containing empty files at the given relative paths.
    pub fn add_folder(&self, folder: &str, files: &[&str]) -> PathBuf {
        let dir = self.root.join(folder);
        std::fs::create_dir_all(&dir).expect("failed to create show folder");
        for file in files {
            let path = dir.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("failed to create sub folder");
            }
            std::fs::write(&path, b"video").expect("failed to write file");
        }
        dir
    }

    /// Enable `provider` for TV shows with the given priority.
    pub fn enable_provider(&self, provider: &str, priority: i64) {
        scrapers::upsert_scraper(
            &self.conn(),
            MediaKind::TvShow,
            provider,
            priority,
            true,
            &HashMap::new(),
        )
        .expect("failed to store provider config");
    }

    /// Scan context over this harness's catalog.
    pub fn context(&self, catalog: ProviderCatalog) -> ScanContext {
        ScanContext {
            pool: self.db.clone(),
            catalog,
        }
    }

    /// Register `provider` in a catalog, enable it, and return the scan context.
    pub fn context_with(&self, provider: StubProvider) -> ScanContext {
        self.enable_provider(&provider.name, 0);
        self.context(catalog_with(provider))
    }
}

/// Scan configuration with explicit switches.
pub fn scan_config(auto_add: bool, add_unknown: bool, concurrency: usize) -> ScanConfig {
    ScanConfig {
        auto_add,
        add_unknown,
        enable_3d_scan: false,
        max_concurrent_scans: concurrency,
    }
}

/// Catalog whose only factory hands out `provider`.
pub fn catalog_with(provider: StubProvider) -> ProviderCatalog {
    let name = provider.name.clone();
    let provider: Arc<dyn TvShowProvider> = Arc::new(provider);
    let mut catalog = ProviderCatalog::new();
    catalog.register(name, move |_settings: &ProviderSettings| Ok(Arc::clone(&provider)));
    catalog
}

/// A show known to the stub provider.
#[derive(Debug, Clone)]
pub struct StubShow {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub seasons: HashSet<u32>,
    pub episodes: HashSet<(u32, u32)>,
    pub tags: Vec<(String, String)>,
    pub people: Vec<(String, String)>,
}

impl StubShow {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            year: None,
            seasons: HashSet::new(),
            episodes: HashSet::new(),
            tags: Vec::new(),
            people: Vec::new(),
        }
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Add season `season` with episodes `1..=count`.
    pub fn season(mut self, season: u32, count: u32) -> Self {
        self.seasons.insert(season);
        self.episodes.extend((1..=count).map(|e| (season, e)));
        self
    }

    pub fn tag(mut self, name: &str, value: &str) -> Self {
        self.tags.push((name.to_string(), value.to_string()));
        self
    }

    pub fn person(mut self, name: &str, role: &str) -> Self {
        self.people.push((name.to_string(), role.to_string()));
        self
    }
}

/// Call counters shared between a stub provider and the test.
#[derive(Debug, Default)]
pub struct StubStats {
    pub searches: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

/// Scriptable in-memory provider.
///
/// Searching returns every show whose title contains the query or is
/// contained by it, ignoring case.
pub struct StubProvider {
    pub name: String,
    pub shows: Vec<StubShow>,
    pub search_delay: Option<Duration>,
    pub fail_search: bool,
    pub panic_on: Option<String>,
    pub stats: Arc<StubStats>,
}

impl StubProvider {
    pub fn new(name: &str, shows: Vec<StubShow>) -> Self {
        Self {
            name: name.to_string(),
            shows,
            search_delay: None,
            fail_search: false,
            panic_on: None,
            stats: Arc::new(StubStats::default()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Panic when searching for exactly `title`.
    pub fn panicking_on(mut self, title: &str) -> Self {
        self.panic_on = Some(title.to_string());
        self
    }

    fn record(&self) -> ProviderRecord {
        ProviderRecord {
            name: self.name.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TvShowProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search_show(&self, title: &str) -> anyhow::Result<Vec<SearchCandidate>> {
        self.stats.searches.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.as_deref() == Some(title) {
            panic!("stub provider crashed searching {}", title);
        }
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_search {
            anyhow::bail!("search unavailable");
        }

        let query = title.to_lowercase();
        Ok(self
            .shows
            .iter()
            .filter(|s| {
                let t = s.title.to_lowercase();
                t.contains(&query) || query.contains(&t)
            })
            .map(|s| SearchCandidate {
                title: s.title.clone(),
                provider_name: self.name.clone(),
                provider_id: s.id.clone(),
                provider_data: format!("search:{}", s.id),
                premiered: s
                    .year
                    .map(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap()),
            })
            .collect())
    }

    fn configure(&self, provider_id: &str, _data: &str) -> anyhow::Result<Box<dyn BoundShow>> {
        let show = self
            .shows
            .iter()
            .find(|s| s.id == provider_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown show id {}", provider_id))?;
        Ok(Box::new(StubBound {
            record: self.record(),
            show,
        }))
    }
}

struct StubBound {
    record: ProviderRecord,
    show: StubShow,
}

#[async_trait]
impl BoundShow for StubBound {
    async fn fetch_show(&self) -> anyhow::Result<ShowDetail> {
        Ok(ShowDetail {
            title: self.show.title.clone(),
            overview: Some(format!("Overview of {}", self.show.title)),
            premiered: self
                .show
                .year
                .map(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).unwrap()),
            record: ProviderRecord {
                id: self.show.id.clone(),
                data: format!("show:{}", self.show.id),
                link: Some(format!("https://stub.invalid/{}", self.show.id)),
                ..self.record.clone()
            },
            ..Default::default()
        })
    }

    async fn fetch_season(&self, season: u32) -> anyhow::Result<SeasonDetail> {
        if !self.show.seasons.contains(&season) {
            anyhow::bail!("season {} not found", season);
        }
        Ok(SeasonDetail {
            title: format!("{} - Book {}", self.show.title, season),
            record: ProviderRecord {
                id: format!("{}-s{}", self.show.id, season),
                ..self.record.clone()
            },
            ..Default::default()
        })
    }

    async fn fetch_episode(&self, season: u32, episode: u32) -> anyhow::Result<EpisodeDetail> {
        if !self.show.episodes.contains(&(season, episode)) {
            anyhow::bail!("episode s{}e{} not found", season, episode);
        }
        Ok(EpisodeDetail {
            title: format!("Chapter {}.{}", season, episode),
            record: ProviderRecord {
                id: format!("{}-s{}e{}", self.show.id, season, episode),
                ..self.record.clone()
            },
            ..Default::default()
        })
    }

    async fn list_show_tags(&self) -> anyhow::Result<Vec<TagDetail>> {
        Ok(self
            .show
            .tags
            .iter()
            .map(|(name, value)| TagDetail {
                name: name.clone(),
                value: value.clone(),
                icon: None,
            })
            .collect())
    }

    async fn list_show_people(&self) -> anyhow::Result<Vec<PersonDetail>> {
        Ok(self
            .show
            .people
            .iter()
            .map(|(name, role)| PersonDetail {
                name: name.clone(),
                role: Some(role.clone()),
            })
            .collect())
    }
}

/// Count rows of `table`.
pub fn count_rows(conn: &rusqlite::Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .expect("failed to count rows")
}

/// Read `PRAGMA data_version` as seen by `conn`.
pub fn data_version(conn: &rusqlite::Connection) -> i64 {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
        .expect("failed to read data_version")
}

/// Open a plain connection to the catalog file, outside the pool.
pub fn observer(path: &Path) -> rusqlite::Connection {
    rusqlite::Connection::open(path).expect("failed to open observer connection")
}
