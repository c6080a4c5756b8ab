//! Per-show reconciliation.
//!
//! A [`ShowReconciler`] brings one top-level library folder in line with the
//! catalog. Each show moves through `Unknown -> Added -> Bound -> Refreshed`:
//!
//! - **Unknown**: no show row for the folder yet. Providers are searched and
//!   the row is created when there are results or unknown shows are accepted.
//! - **Added**: a row exists without a provider binding. With auto-add on and
//!   a confident match the show is bound; otherwise the candidates are stored
//!   for manual selection.
//! - **Bound**: the show has a binding and is eligible for refresh.
//! - **Refreshed**: metadata was pulled; the show is left alone until its
//!   update mode is raised again.
//!
//! Every bound show then has its seasons refreshed and its video files
//! matched to episodes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use showkeeper_common::{
    paths::is_video_file, EpisodeId, Error, LibraryId, MediaKind, ShowId, UpdateMode,
};
use showkeeper_db::models::{
    EpisodeMetadata, ProviderBinding, SeasonMetadata, Show, ShowMetadata, VideoFile,
};
use showkeeper_db::pool::{get_conn, DbPool, PooledConnection};
use showkeeper_db::queries::{episodes, people, seasons, shows, tags, video_files};
use tracing::{debug, error, trace, warn};
use walkdir::WalkDir;

use super::identifier::identify_path;
use super::selection::{apply_selection, store_candidates, SelectionError};
use crate::metadata::provider::{
    BoundShow, EpisodeDetail, SearchCandidate, SeasonDetail, ShowDetail,
};
use crate::metadata::registry::ProviderRegistry;
use crate::metadata::selector::select_best;

/// Why a single show could not be reconciled.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] Error),

    #[error("no data available for show {0}")]
    NoSearchResults(String),

    #[error("provider {0} is not loaded")]
    ProviderNotLoaded(String),

    #[error("provider error: {0}")]
    Provider(anyhow::Error),

    #[error("reconciliation task failed: {0}")]
    TaskFailed(String),
}

impl From<SelectionError> for ReconcileError {
    fn from(e: SelectionError) -> Self {
        match e {
            SelectionError::Store(e) => Self::Store(e),
            other => Self::Store(Error::internal(other.to_string())),
        }
    }
}

/// What happened to the show row itself during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowAction {
    /// Update mode does not allow refresh; show metadata left untouched.
    Skipped,
    /// No binding was chosen; candidates were stored for manual selection.
    AwaitingSelection { candidates: usize },
    /// A candidate was matched automatically, applied and refreshed.
    AutoSelected {
        provider: String,
        provider_id: String,
        score: u8,
    },
    /// Metadata was refreshed through the existing binding.
    Refreshed,
}

/// Counters for season and episode discovery under one show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeCounters {
    /// Video files seen under the show folder.
    pub files: usize,
    /// New episodes created from provider data.
    pub added: usize,
    /// New episodes created without provider data.
    pub added_unknown: usize,
    /// Known episodes whose metadata was refreshed.
    pub refreshed: usize,
    /// Known files left alone.
    pub unchanged: usize,
    /// Files whose name carries no season/episode numbers.
    pub unidentified: usize,
    /// Files skipped for lack of provider data or a duplicate episode.
    pub skipped: usize,
    /// Seasons created, including placeholders.
    pub seasons_added: usize,
    /// Existing seasons refreshed from the provider.
    pub seasons_refreshed: usize,
}

/// Result of reconciling one library folder.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOutcome {
    /// Folder name relative to the library root.
    pub folder: String,
    pub show_id: ShowId,
    /// Whether the show row was created by this scan.
    pub created: bool,
    pub action: ShowAction,
    /// Set when the show is bound and discovery ran.
    pub episodes: Option<EpisodeCounters>,
}

/// Reconciles library folders against the catalog for one scan.
pub struct ShowReconciler {
    pool: DbPool,
    registry: Arc<ProviderRegistry>,
    library_id: LibraryId,
    root: PathBuf,
    auto_add: bool,
    add_unknown: bool,
}

impl ShowReconciler {
    /// Create a reconciler for a library rooted at `root`.
    pub fn new(
        pool: DbPool,
        registry: Arc<ProviderRegistry>,
        library_id: LibraryId,
        root: impl Into<PathBuf>,
        auto_add: bool,
        add_unknown: bool,
    ) -> Self {
        Self {
            pool,
            registry,
            library_id,
            root: root.into(),
            auto_add,
            add_unknown,
        }
    }

    fn conn(&self) -> Result<PooledConnection, ReconcileError> {
        Ok(get_conn(&self.pool)?)
    }

    /// Reconcile `folder`, given the catalog row already known for it.
    pub async fn reconcile(
        &self,
        folder: &str,
        existing: Option<Show>,
    ) -> Result<EntryOutcome, ReconcileError> {
        let (show, created, action, bound) = match existing {
            None => {
                trace!(show = folder, "New show");
                let candidates = self.registry.search_show(folder).await;
                if candidates.is_empty() && !self.add_unknown {
                    return Err(ReconcileError::NoSearchResults(folder.to_string()));
                }

                let show = {
                    let conn = self.conn()?;
                    shows::create_show(&conn, self.library_id, folder)?
                };
                debug!(show = folder, show_id = %show.id, "Added show");

                let (action, bound) = self.match_candidates(&show, candidates).await?;
                (show, true, action, bound)
            }
            Some(show) if !show.update_mode.allows_refresh() => {
                trace!(show = folder, mode = %show.update_mode, "No update needed");
                (show, false, ShowAction::Skipped, None)
            }
            Some(show) => match show.provider.clone() {
                None => {
                    trace!(show = folder, "Show has no binding, searching again");
                    let candidates = self.registry.search_show(&show.title).await;
                    let (action, bound) = self.match_candidates(&show, candidates).await?;
                    (show, false, action, bound)
                }
                Some(binding) => {
                    trace!(show = folder, provider = %binding.name, "Refreshing show");
                    let bound = self.refresh_show(show.id, &binding).await?;
                    (show, false, ShowAction::Refreshed, Some(bound))
                }
            },
        };

        let bound = match (bound, &show.provider, &action) {
            (Some(bound), _, _) => Some(bound),
            (None, Some(binding), ShowAction::Skipped) => Some(self.bind(binding)?),
            _ => None,
        };

        let episodes = match bound {
            Some(bound) => Some(self.reconcile_episodes(&show, bound.as_ref()).await?),
            None => None,
        };

        Ok(EntryOutcome {
            folder: folder.to_string(),
            show_id: show.id,
            created,
            action,
            episodes,
        })
    }

    /// Auto-select a candidate or store the batch for manual selection.
    async fn match_candidates(
        &self,
        show: &Show,
        candidates: Vec<SearchCandidate>,
    ) -> Result<(ShowAction, Option<Box<dyn BoundShow>>), ReconcileError> {
        if self.auto_add {
            match select_best(&candidates, &show.title, None) {
                Ok((selected, score)) => {
                    debug!(
                        show = %show.path,
                        provider = %selected.provider_name,
                        provider_id = %selected.provider_id,
                        score,
                        "Auto-selected search result"
                    );
                    let binding = selected.binding();
                    {
                        let conn = self.conn()?;
                        apply_selection(&conn, show.id, &binding)?;
                    }
                    let bound = self.refresh_show(show.id, &binding).await?;
                    let action = ShowAction::AutoSelected {
                        provider: binding.name,
                        provider_id: binding.id,
                        score,
                    };
                    return Ok((action, Some(bound)));
                }
                Err(e) => trace!(show = %show.path, reason = %e, "Auto-select failed"),
            }
        }

        {
            let conn = self.conn()?;
            store_candidates(
                &conn,
                MediaKind::TvShow,
                &show.id.to_string(),
                &show.title,
                &candidates,
            )?;
        }
        debug!(show = %show.path, count = candidates.len(), "Stored search results");
        Ok((
            ShowAction::AwaitingSelection {
                candidates: candidates.len(),
            },
            None,
        ))
    }

    fn bind(&self, binding: &ProviderBinding) -> Result<Box<dyn BoundShow>, ReconcileError> {
        let provider = self
            .registry
            .get(&binding.name)
            .ok_or_else(|| ReconcileError::ProviderNotLoaded(binding.name.clone()))?;
        provider
            .configure(&binding.id, &binding.data)
            .map_err(ReconcileError::Provider)
    }

    /// Pull show metadata, tags and people through `binding`.
    ///
    /// Returns the bound provider handle for the season and episode cascade.
    async fn refresh_show(
        &self,
        show_id: ShowId,
        binding: &ProviderBinding,
    ) -> Result<Box<dyn BoundShow>, ReconcileError> {
        let bound = self.bind(binding)?;
        let detail = bound.fetch_show().await.map_err(ReconcileError::Provider)?;
        {
            let conn = self.conn()?;
            shows::update_show_metadata(
                &conn,
                show_id,
                &show_metadata(detail),
                UpdateMode::REFRESHED,
            )?;
        }

        let media_id = show_id.to_string();

        match bound.list_show_tags().await {
            Ok(found) => {
                let conn = self.conn()?;
                for tag in found {
                    tags::link_tag(
                        &conn,
                        &tag.name,
                        &tag.value,
                        tag.icon.as_deref(),
                        MediaKind::TvShow,
                        &media_id,
                    )?;
                }
            }
            Err(e) => warn!(show = %show_id, error = %e, "Failed to list tags"),
        }

        match bound.list_show_people().await {
            Ok(found) => {
                let conn = self.conn()?;
                for person in found {
                    people::link_person(
                        &conn,
                        &person.name,
                        person.role.as_deref(),
                        MediaKind::TvShow,
                        &media_id,
                    )?;
                }
            }
            Err(e) => warn!(show = %show_id, error = %e, "Failed to list people"),
        }

        Ok(bound)
    }

    /// Refresh eligible seasons, then match every video file under the show
    /// folder to an episode.
    async fn reconcile_episodes(
        &self,
        show: &Show,
        bound: &dyn BoundShow,
    ) -> Result<EpisodeCounters, ReconcileError> {
        let mut counters = EpisodeCounters::default();

        let existing = {
            let conn = self.conn()?;
            seasons::list_seasons(&conn, show.id)?
        };

        let mut known_seasons = HashSet::with_capacity(existing.len());
        for season in existing {
            if season.update_mode.allows_refresh() {
                match bound.fetch_season(season.season).await {
                    Ok(detail) => {
                        let conn = self.conn()?;
                        seasons::update_season_metadata(
                            &conn,
                            show.id,
                            season.season,
                            &season_metadata(detail),
                            UpdateMode::REFRESHED,
                        )?;
                        counters.seasons_refreshed += 1;
                    }
                    Err(e) => {
                        warn!(show = %show.path, season = season.season, error = %e, "Failed to refresh season");
                    }
                }
            }
            known_seasons.insert(season.season);
        }

        let show_dir = self.root.join(&show.path);
        trace!(show = %show.path, dir = %show_dir.display(), "Processing episodes");

        for relative in list_video_files(&show_dir) {
            counters.files += 1;
            let library_path = Path::new(&show.path).join(&relative);
            let library_path = library_path.to_string_lossy();
            self.reconcile_file(
                show,
                bound,
                &mut known_seasons,
                &library_path,
                &show_dir.join(&relative),
                &mut counters,
            )
            .await?;
        }

        debug!(
            show = %show.path,
            files = counters.files,
            added = counters.added + counters.added_unknown,
            refreshed = counters.refreshed,
            "Episodes reconciled"
        );
        Ok(counters)
    }

    async fn reconcile_file(
        &self,
        show: &Show,
        bound: &dyn BoundShow,
        known_seasons: &mut HashSet<u32>,
        path: &str,
        absolute: &Path,
        counters: &mut EpisodeCounters,
    ) -> Result<(), ReconcileError> {
        let existing = {
            let conn = self.conn()?;
            video_files::get_video_file_by_path(&conn, self.library_id, path)?
        };
        if let Some(file) = existing {
            return self.refresh_file(bound, &file, absolute, counters).await;
        }

        let filename = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let Some((season, episode)) = identify_path(absolute) else {
            warn!(file = %path, "Unable to extract season/episode numbers");
            counters.unidentified += 1;
            return Ok(());
        };

        if !known_seasons.contains(&season) {
            self.add_season(show, bound, season).await?;
            known_seasons.insert(season);
            counters.seasons_added += 1;
        }

        let (metadata, mode) = match bound.fetch_episode(season, episode).await {
            Ok(detail) => {
                trace!(file = %path, season, episode, "Adding episode");
                (episode_metadata(detail), UpdateMode::REFRESHED)
            }
            Err(e) if self.add_unknown => {
                warn!(file = %path, season, episode, error = %e, "No data found, adding empty episode");
                let metadata = EpisodeMetadata {
                    title: filename,
                    ..Default::default()
                };
                (metadata, UpdateMode::ENABLED)
            }
            Err(e) => {
                warn!(file = %path, season, episode, error = %e, "No data found, skipping file");
                counters.skipped += 1;
                return Ok(());
            }
        };

        let (size, modified) = file_stats(absolute);

        // The episode and its file are written together or not at all.
        let conn = self.conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;
        let created = match episodes::create_episode(&tx, show.id, season, episode, &metadata, mode)
        {
            Ok(created) => created,
            Err(e) if e.is_conflict() => {
                warn!(file = %path, season, episode, "Episode already exists for another file");
                counters.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        video_files::create_video_file(
            &tx,
            self.library_id,
            path,
            MediaKind::TvEpisode,
            &created.id.to_string(),
            size,
            modified,
        )?;
        tx.commit().map_err(|e| Error::database(e.to_string()))?;

        if mode == UpdateMode::REFRESHED {
            counters.added += 1;
        } else {
            counters.added_unknown += 1;
        }
        Ok(())
    }

    /// Refresh a file that is already registered, if its episode allows it.
    async fn refresh_file(
        &self,
        bound: &dyn BoundShow,
        file: &VideoFile,
        absolute: &Path,
        counters: &mut EpisodeCounters,
    ) -> Result<(), ReconcileError> {
        let episode = {
            let conn = self.conn()?;
            match file.media_id.parse::<EpisodeId>() {
                Ok(id) => episodes::get_episode(&conn, id)?,
                Err(_) => None,
            }
        };

        let Some(episode) = episode.filter(|e| e.update_mode.allows_refresh()) else {
            trace!(file = %file.path, "No update requested");
            counters.unchanged += 1;
            return Ok(());
        };

        let (size, modified) = file_stats(absolute);
        if size != file.size_bytes || modified != file.modified_at {
            let conn = self.conn()?;
            video_files::touch_video_file(&conn, file.id, size, modified)?;
        }

        match bound.fetch_episode(episode.season, episode.episode).await {
            Ok(detail) => {
                let conn = self.conn()?;
                episodes::update_episode_metadata(
                    &conn,
                    episode.id,
                    &episode_metadata(detail),
                    UpdateMode::REFRESHED,
                )?;
                counters.refreshed += 1;
            }
            Err(e) => {
                warn!(file = %file.path, season = episode.season, episode = episode.episode, error = %e, "Failed to refresh episode");
                counters.unchanged += 1;
            }
        }
        Ok(())
    }

    /// Create season `season`, falling back to a placeholder when the
    /// provider has nothing for it.
    async fn add_season(
        &self,
        show: &Show,
        bound: &dyn BoundShow,
        season: u32,
    ) -> Result<(), ReconcileError> {
        let (metadata, mode) = match bound.fetch_season(season).await {
            Ok(detail) => (season_metadata(detail), UpdateMode::REFRESHED),
            Err(e) => {
                error!(show = %show.path, season, error = %e, "Failed to fetch season, adding placeholder");
                let metadata = SeasonMetadata {
                    title: format!("Season {}", season),
                    ..Default::default()
                };
                (metadata, UpdateMode::ENABLED)
            }
        };

        let conn = self.conn()?;
        match seasons::create_season(&conn, show.id, season, &metadata, mode) {
            Ok(_) => {
                trace!(show = %show.path, season, "Added season");
                Ok(())
            }
            Err(e) if e.is_conflict() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Video files under `dir`, relative to it, sorted.
///
/// Unreadable entries are logged and skipped.
fn list_video_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to read directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_video_file(entry.path()))
        .filter_map(|entry| entry.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

/// Size and modification time (second precision) of a file.
fn file_stats(path: &Path) -> (i64, Option<DateTime<Utc>>) {
    match std::fs::metadata(path) {
        Ok(meta) => {
            let modified = meta
                .modified()
                .ok()
                .map(DateTime::<Utc>::from)
                .and_then(|t| DateTime::from_timestamp(t.timestamp(), 0));
            (meta.len() as i64, modified)
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to stat file");
            (0, None)
        }
    }
}

fn show_metadata(detail: ShowDetail) -> ShowMetadata {
    let data = detail.record.data;
    ShowMetadata {
        title: detail.title,
        overview: detail.overview,
        icon: detail.icon,
        fanart: detail.fanart,
        website: detail.website,
        trailer: detail.trailer,
        premiered: detail.premiered,
        rating: detail.rating,
        provider_link: detail.record.link,
        provider_data: (!data.is_empty()).then_some(data),
    }
}

fn season_metadata(detail: SeasonDetail) -> SeasonMetadata {
    SeasonMetadata {
        title: detail.title,
        overview: detail.overview,
        icon: detail.icon,
        fanart: detail.fanart,
        trailer: detail.trailer,
        premiered: detail.premiered,
        rating: detail.rating,
        provider: bound_record(detail.record),
    }
}

fn episode_metadata(detail: EpisodeDetail) -> EpisodeMetadata {
    EpisodeMetadata {
        title: detail.title,
        overview: detail.overview,
        icon: detail.icon,
        premiered: detail.premiered,
        rating: detail.rating,
        provider: bound_record(detail.record),
    }
}

fn bound_record(record: crate::metadata::provider::ProviderRecord) -> Option<ProviderBinding> {
    (!record.name.trim().is_empty()).then(|| record.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_list_video_files_sorted_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Season 2")).unwrap();
        fs::write(dir.path().join("Season 2/Show.S02E01.mkv"), b"x").unwrap();
        fs::write(dir.path().join("Show.S01E02.mkv"), b"x").unwrap();
        fs::write(dir.path().join("Show.S01E01.mp4"), b"x").unwrap();
        fs::write(dir.path().join("Show.S01E01.srt"), b"x").unwrap();

        let files = list_video_files(dir.path());
        assert_eq!(
            files,
            vec![
                PathBuf::from("Season 2/Show.S02E01.mkv"),
                PathBuf::from("Show.S01E01.mp4"),
                PathBuf::from("Show.S01E02.mkv"),
            ]
        );
    }

    #[test]
    fn test_list_video_files_missing_dir() {
        assert!(list_video_files(Path::new("/nonexistent/showkeeper/dir")).is_empty());
    }

    #[test]
    fn test_file_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mkv");
        fs::write(&path, b"12345").unwrap();

        let (size, modified) = file_stats(&path);
        assert_eq!(size, 5);
        assert_eq!(modified.unwrap().timestamp_subsec_nanos(), 0);
        assert_eq!(file_stats(&dir.path().join("missing.mkv")), (0, None));
    }

    #[test]
    fn test_unnamed_record_is_unbound() {
        let record = crate::metadata::provider::ProviderRecord::default();
        assert!(bound_record(record).is_none());
    }
}
