//! Episode database queries.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use showkeeper_common::{EpisodeId, Error, Result, ShowId, UpdateMode};

use super::{binding_columns, format_time, id_column, opt_time_column, time_column};
use crate::models::{Episode, EpisodeMetadata};

const EPISODE_COLUMNS: &str = "id, show_id, season, episode, title, overview, icon, premiered,
    rating, provider_name, provider_id, provider_data, provider_link, update_mode, added_at,
    updated_at";

fn map_episode(row: &Row<'_>) -> rusqlite::Result<Episode> {
    Ok(Episode {
        id: id_column(row, 0)?,
        show_id: id_column(row, 1)?,
        season: row.get(2)?,
        episode: row.get(3)?,
        title: row.get(4)?,
        overview: row.get(5)?,
        icon: row.get(6)?,
        premiered: opt_time_column(row, 7)?,
        rating: row.get(8)?,
        provider: binding_columns(row, 9)?,
        update_mode: UpdateMode::from(row.get::<_, i64>(13)?),
        added_at: time_column(row, 14)?,
        updated_at: opt_time_column(row, 15)?,
    })
}

/// Create an episode. Fails with a conflict if the (season, episode) pair
/// already exists for the show.
pub fn create_episode(
    conn: &Connection,
    show_id: ShowId,
    season: u32,
    episode: u32,
    metadata: &EpisodeMetadata,
    update_mode: UpdateMode,
) -> Result<Episode> {
    let id = EpisodeId::new();
    let added_at = Utc::now();
    let provider = metadata.provider.as_ref();

    conn.execute(
        "INSERT INTO episodes (id, show_id, season, episode, title, overview, icon, premiered,
             rating, provider_name, provider_id, provider_data, provider_link, update_mode,
             added_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            show_id.to_string(),
            season,
            episode,
            metadata.title,
            metadata.overview,
            metadata.icon,
            format_time(metadata.premiered),
            metadata.rating,
            provider.map(|p| &p.name),
            provider.map(|p| &p.id),
            provider.map(|p| &p.data),
            provider.and_then(|p| p.link.as_ref()),
            update_mode.as_i64(),
            added_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Episode {
        id,
        show_id,
        season,
        episode,
        title: metadata.title.clone(),
        overview: metadata.overview.clone(),
        icon: metadata.icon.clone(),
        premiered: metadata.premiered,
        rating: metadata.rating,
        provider: metadata.provider.clone(),
        update_mode,
        added_at,
        updated_at: None,
    })
}

/// Get an episode by ID.
pub fn get_episode(conn: &Connection, id: EpisodeId) -> Result<Option<Episode>> {
    let result = conn.query_row(
        &format!("SELECT {EPISODE_COLUMNS} FROM episodes WHERE id = ?"),
        [id.to_string()],
        map_episode,
    );

    match result {
        Ok(episode) => Ok(Some(episode)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List the episodes of a show ordered by season then episode number.
pub fn list_episodes(conn: &Connection, show_id: ShowId) -> Result<Vec<Episode>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {EPISODE_COLUMNS} FROM episodes WHERE show_id = ? ORDER BY season, episode"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let episodes = stmt
        .query_map([show_id.to_string()], map_episode)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(episodes)
}

/// Write refreshed metadata onto an episode and set its update mode.
pub fn update_episode_metadata(
    conn: &Connection,
    id: EpisodeId,
    metadata: &EpisodeMetadata,
    update_mode: UpdateMode,
) -> Result<()> {
    let provider = metadata.provider.as_ref();
    conn.execute(
        "UPDATE episodes SET title = ?, overview = ?, icon = ?, premiered = ?, rating = ?,
             provider_name = ?, provider_id = ?, provider_data = ?, provider_link = ?,
             update_mode = ?, updated_at = ?
         WHERE id = ?",
        params![
            metadata.title,
            metadata.overview,
            metadata.icon,
            format_time(metadata.premiered),
            metadata.rating,
            provider.map(|p| &p.name),
            provider.map(|p| &p.id),
            provider.map(|p| &p.data),
            provider.and_then(|p| p.link.as_ref()),
            update_mode.as_i64(),
            Utc::now().to_rfc3339(),
            id.to_string(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Set every episode of a show to `update_mode` and drop their provider
/// bindings. Returns the number of episodes touched.
pub fn invalidate_episodes(
    conn: &Connection,
    show_id: ShowId,
    update_mode: UpdateMode,
) -> Result<usize> {
    conn.execute(
        "UPDATE episodes SET provider_name = NULL, provider_id = NULL, provider_data = NULL,
             provider_link = NULL, update_mode = ?
         WHERE show_id = ?",
        params![update_mode.as_i64(), show_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))
}
