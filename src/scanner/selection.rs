//! Provider selection for shows.
//!
//! [`apply_selection`] binds a show to a provider record and invalidates
//! everything derived from the previous binding. It is shared by automatic
//! matching during a scan and by [`select_candidate`], the manual entry point
//! that picks one of the candidates a scan stored for later review.

use rusqlite::Connection;
use showkeeper_common::{Error, MediaKind, ShowId, UpdateMode};
use showkeeper_db::models::ProviderBinding;
use showkeeper_db::pool::{get_conn, DbPool};
use showkeeper_db::queries::{episodes, people, search_results, seasons, shows, tags};
use tracing::{debug, info};

use crate::metadata::provider::SearchCandidate;

/// Errors from storing, listing or applying search candidates.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("no search results stored for {media_kind} {media_id}")]
    NoResults {
        media_kind: MediaKind,
        media_id: String,
    },

    #[error("invalid candidate index {index} ({available} available)")]
    InvalidIndex { index: usize, available: usize },

    #[error("selection is not supported for media kind {0}")]
    UnsupportedMediaKind(MediaKind),

    #[error(transparent)]
    Store(#[from] Error),

    #[error("malformed candidate batch: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Bind `show_id` to `binding` and invalidate its derived data.
///
/// Steps run in a fixed order and the first failure aborts: the binding is
/// written with [`UpdateMode::FORCE`], every season and episode is reset to
/// `FORCE` with its binding cleared, then the show's tag and person links are
/// deleted. Re-running the whole sequence repairs a partial application.
pub fn apply_selection(
    conn: &Connection,
    show_id: ShowId,
    binding: &ProviderBinding,
) -> Result<(), Error> {
    let media_id = show_id.to_string();

    shows::set_binding(conn, show_id, binding, UpdateMode::FORCE)?;
    let seasons = seasons::invalidate_seasons(conn, show_id, UpdateMode::FORCE)?;
    let episodes = episodes::invalidate_episodes(conn, show_id, UpdateMode::FORCE)?;
    let tags = tags::delete_all_tag_links(conn, MediaKind::TvShow, &media_id)?;
    let people = people::delete_all_person_links(conn, MediaKind::TvShow, &media_id)?;

    debug!(
        show = %show_id,
        provider = %binding.name,
        provider_id = %binding.id,
        seasons,
        episodes,
        tags,
        people,
        "Applied provider selection"
    );
    Ok(())
}

/// Replace the candidate batch stored for a media entity.
pub fn store_candidates(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
    name: &str,
    candidates: &[SearchCandidate],
) -> Result<(), SelectionError> {
    let data = serde_json::to_string(candidates)?;
    search_results::replace_results(conn, media_kind, media_id, name, &data)?;
    Ok(())
}

/// Load the candidate batch stored for a media entity.
pub fn load_candidates(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Vec<SearchCandidate>, SelectionError> {
    let batch = search_results::get_results(conn, media_kind, media_id)?.ok_or_else(|| {
        SelectionError::NoResults {
            media_kind,
            media_id: media_id.to_string(),
        }
    })?;
    Ok(serde_json::from_str(&batch.data)?)
}

/// Manually select candidate `index` from the stored batch.
///
/// The index is validated before anything is written. On success the
/// selection is applied, the batch is deleted and the chosen candidate is
/// returned.
pub fn select_candidate(
    pool: &DbPool,
    media_kind: MediaKind,
    media_id: &str,
    index: usize,
) -> Result<SearchCandidate, SelectionError> {
    if media_kind != MediaKind::TvShow {
        return Err(SelectionError::UnsupportedMediaKind(media_kind));
    }
    let show_id: ShowId = media_id
        .parse()
        .map_err(|_| Error::invalid_input(format!("invalid show id: {}", media_id)))?;

    let conn = get_conn(pool)?;
    let candidates = load_candidates(&conn, media_kind, media_id)?;
    let candidate = candidates
        .get(index)
        .cloned()
        .ok_or(SelectionError::InvalidIndex {
            index,
            available: candidates.len(),
        })?;

    apply_selection(&conn, show_id, &candidate.binding())?;
    search_results::delete_results(&conn, media_kind, media_id)?;

    info!(
        show = %show_id,
        provider = %candidate.provider_name,
        provider_id = %candidate.provider_id,
        "Selected search result"
    );
    Ok(candidate)
}
