//! TV library scanner.
//!
//! This module walks a library root, treats every top-level folder as a show,
//! and reconciles each one against the catalog. Folders are processed one at a
//! time or, when `max_concurrent_scans` is above one, as independent tasks
//! behind a counting semaphore.

pub mod identifier;
pub mod reconcile;
pub mod selection;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showkeeper_common::{Error, LibraryId, MediaKind};
use showkeeper_db::models::Show;
use showkeeper_db::pool::{get_conn, DbPool};
use showkeeper_db::queries::{libraries, shows};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::metadata::registry::{ProviderCatalog, ProviderRegistry};

pub use identifier::extract_episode_numbers;
pub use reconcile::{EntryOutcome, EpisodeCounters, ReconcileError, ShowAction, ShowReconciler};
pub use selection::{apply_selection, select_candidate, SelectionError};

/// Options for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Bind new shows to the best confident search result automatically.
    pub auto_add: bool,
    /// Keep shows and episodes no provider knows about.
    pub add_unknown: bool,
    /// Accepted for compatibility; TV scans ignore it.
    pub enable_3d_scan: bool,
    /// Folders reconciled at once; 0 or 1 means sequential.
    pub max_concurrent_scans: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            auto_add: false,
            add_unknown: true,
            enable_3d_scan: false,
            max_concurrent_scans: 1,
        }
    }
}

/// Errors that abort a scan before or instead of processing folders.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scanning {0} libraries is not supported")]
    UnsupportedMediaKind(MediaKind),

    #[error("a library id is required to scan {0}")]
    MissingLibraryId(MediaKind),

    #[error("library not found: {0}")]
    LibraryNotFound(LibraryId),

    #[error(transparent)]
    Store(#[from] Error),

    #[error("failed to list library root {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result for one library folder.
#[derive(Debug)]
pub struct EntryReport {
    pub folder: String,
    pub result: Result<EntryOutcome, ReconcileError>,
}

/// Summary of a finished scan, with one entry per folder in listing order.
#[derive(Debug)]
pub struct ScanReport {
    pub library_id: LibraryId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entries: Vec<EntryReport>,
}

impl ScanReport {
    /// Outcomes of the folders that reconciled successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.entries.iter().filter_map(|e| e.result.as_ref().ok())
    }

    /// Folders that failed, with their error.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &ReconcileError)> {
        self.entries
            .iter()
            .filter_map(|e| e.result.as_ref().err().map(|err| (e.folder.as_str(), err)))
    }

    /// Entry for `folder`, if it was part of the scan.
    pub fn entry(&self, folder: &str) -> Option<&EntryReport> {
        self.entries.iter().find(|e| e.folder == folder)
    }

    /// Successful outcome for `folder`.
    pub fn outcome(&self, folder: &str) -> Option<&EntryOutcome> {
        self.entry(folder).and_then(|e| e.result.as_ref().ok())
    }
}

/// Scan orchestrator for TV libraries.
pub struct TvScanner {
    pool: DbPool,
    registry: Arc<ProviderRegistry>,
}

impl TvScanner {
    /// Create a scanner over `pool` using the providers in `registry`.
    pub fn new(pool: DbPool, registry: Arc<ProviderRegistry>) -> Self {
        Self { pool, registry }
    }

    /// Reconcile every top-level folder of library `library_id`.
    ///
    /// Loading the library, its known shows or the root listing aborts the
    /// scan. Failures inside one folder are logged and recorded in the report
    /// without affecting the others.
    pub async fn scan(
        &self,
        library_id: LibraryId,
        config: &ScanConfig,
    ) -> Result<ScanReport, ScanError> {
        let started_at = Utc::now();

        let (library, known) = {
            let conn = get_conn(&self.pool)?;
            let library = libraries::get_library(&conn, library_id)?
                .ok_or(ScanError::LibraryNotFound(library_id))?;
            let known: HashMap<String, Show> = shows::list_shows(&conn, library_id)?
                .into_iter()
                .map(|show| (show.path.clone(), show))
                .collect();
            (library, known)
        };

        let root = PathBuf::from(&library.path);
        let folders = list_show_folders(&root).map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;

        if config.enable_3d_scan {
            debug!(library_id = %library_id, "3D scan flag has no effect on TV libraries");
        }
        info!(
            library_id = %library_id,
            root = %root.display(),
            folders = folders.len(),
            known = known.len(),
            concurrency = config.max_concurrent_scans,
            "Scanning library"
        );

        let reconciler = Arc::new(ShowReconciler::new(
            self.pool.clone(),
            Arc::clone(&self.registry),
            library_id,
            root,
            config.auto_add,
            config.add_unknown,
        ));
        let known = Arc::new(known);

        let entries = if config.max_concurrent_scans <= 1 {
            let mut entries = Vec::with_capacity(folders.len());
            for folder in folders {
                let existing = known.get(&folder).cloned();
                entries.push(reconcile_entry(Arc::clone(&reconciler), folder, existing).await);
            }
            entries
        } else {
            scan_concurrently(reconciler, known, folders, config.max_concurrent_scans).await?
        };

        let report = ScanReport {
            library_id,
            started_at,
            finished_at: Utc::now(),
            entries,
        };
        info!(
            library_id = %library_id,
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            "Scan complete"
        );
        Ok(report)
    }
}

async fn scan_concurrently(
    reconciler: Arc<ShowReconciler>,
    known: Arc<HashMap<String, Show>>,
    folders: Vec<String>,
    limit: usize,
) -> Result<Vec<EntryReport>, ScanError> {
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for (index, folder) in folders.into_iter().enumerate() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|e| Error::internal(format!("scan semaphore closed: {}", e)))?;
        let reconciler = Arc::clone(&reconciler);
        let known = Arc::clone(&known);

        tasks.spawn(async move {
            let existing = known.get(&folder).cloned();
            let entry = reconcile_entry(reconciler, folder, existing).await;
            drop(permit);
            (index, entry)
        });
    }

    let mut entries = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(entry) => entries.push(entry),
            Err(e) => return Err(Error::internal(format!("scan task failed: {}", e)).into()),
        }
    }
    entries.sort_by_key(|(index, _)| *index);
    Ok(entries.into_iter().map(|(_, entry)| entry).collect())
}

/// Reconcile one folder in its own task so a panic is reported against the
/// folder instead of tearing down the scan.
async fn reconcile_entry(
    reconciler: Arc<ShowReconciler>,
    folder: String,
    existing: Option<Show>,
) -> EntryReport {
    let task_folder = folder.clone();
    let result = tokio::spawn(async move { reconciler.reconcile(&task_folder, existing).await })
        .await
        .unwrap_or_else(|e| Err(ReconcileError::TaskFailed(e.to_string())));

    if let Err(e) = &result {
        error!(show = %folder, error = %e, "Failed to reconcile show");
    }
    EntryReport { folder, result }
}

/// Names of the directories directly under `root`, sorted.
fn list_show_folders(root: &Path) -> std::io::Result<Vec<String>> {
    let mut folders = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => folders.push(name),
            Err(name) => warn!(name = ?name, "Skipping folder with a non UTF-8 name"),
        }
    }
    folders.sort();
    Ok(folders)
}

/// Everything a scan needs beyond its arguments.
#[derive(Clone)]
pub struct ScanContext {
    pub pool: DbPool,
    pub catalog: ProviderCatalog,
}

/// Start a scan of `library_id` for `media_kind`.
///
/// Only TV libraries can be scanned. The provider registry is built from the
/// catalog and the stored provider configuration, lives for this scan only,
/// and is dropped when it returns.
pub async fn start_scan(
    ctx: &ScanContext,
    media_kind: MediaKind,
    library_id: Option<LibraryId>,
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    if media_kind != MediaKind::TvShow {
        return Err(ScanError::UnsupportedMediaKind(media_kind));
    }
    let library_id = library_id.ok_or(ScanError::MissingLibraryId(media_kind))?;

    let registry = {
        let conn = get_conn(&ctx.pool)?;
        ProviderRegistry::load(&ctx.catalog, &conn, media_kind)?
    };

    TvScanner::new(ctx.pool.clone(), Arc::new(registry))
        .scan(library_id, config)
        .await
}
