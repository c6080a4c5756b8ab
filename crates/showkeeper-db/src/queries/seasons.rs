//! Season database queries.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use showkeeper_common::{Error, Result, SeasonId, ShowId, UpdateMode};

use super::{binding_columns, format_time, id_column, opt_time_column, time_column};
use crate::models::{Season, SeasonMetadata};

const SEASON_COLUMNS: &str = "id, show_id, season, title, overview, icon, fanart, trailer,
    premiered, rating, provider_name, provider_id, provider_data, provider_link, update_mode,
    added_at, updated_at";

fn map_season(row: &Row<'_>) -> rusqlite::Result<Season> {
    Ok(Season {
        id: id_column(row, 0)?,
        show_id: id_column(row, 1)?,
        season: row.get(2)?,
        title: row.get(3)?,
        overview: row.get(4)?,
        icon: row.get(5)?,
        fanart: row.get(6)?,
        trailer: row.get(7)?,
        premiered: opt_time_column(row, 8)?,
        rating: row.get(9)?,
        provider: binding_columns(row, 10)?,
        update_mode: UpdateMode::from(row.get::<_, i64>(14)?),
        added_at: time_column(row, 15)?,
        updated_at: opt_time_column(row, 16)?,
    })
}

/// Create a season. Fails with a conflict if the number already exists.
pub fn create_season(
    conn: &Connection,
    show_id: ShowId,
    season: u32,
    metadata: &SeasonMetadata,
    update_mode: UpdateMode,
) -> Result<Season> {
    let id = SeasonId::new();
    let added_at = Utc::now();
    let provider = metadata.provider.as_ref();

    conn.execute(
        "INSERT INTO seasons (id, show_id, season, title, overview, icon, fanart, trailer,
             premiered, rating, provider_name, provider_id, provider_data, provider_link,
             update_mode, added_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            show_id.to_string(),
            season,
            metadata.title,
            metadata.overview,
            metadata.icon,
            metadata.fanart,
            metadata.trailer,
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

    Ok(Season {
        id,
        show_id,
        season,
        title: metadata.title.clone(),
        overview: metadata.overview.clone(),
        icon: metadata.icon.clone(),
        fanart: metadata.fanart.clone(),
        trailer: metadata.trailer.clone(),
        premiered: metadata.premiered,
        rating: metadata.rating,
        provider: metadata.provider.clone(),
        update_mode,
        added_at,
        updated_at: None,
    })
}

/// List the seasons of a show in season order.
pub fn list_seasons(conn: &Connection, show_id: ShowId) -> Result<Vec<Season>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE show_id = ? ORDER BY season"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let seasons = stmt
        .query_map([show_id.to_string()], map_season)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(seasons)
}

/// Write refreshed metadata onto a season and set its update mode.
pub fn update_season_metadata(
    conn: &Connection,
    show_id: ShowId,
    season: u32,
    metadata: &SeasonMetadata,
    update_mode: UpdateMode,
) -> Result<()> {
    let provider = metadata.provider.as_ref();
    conn.execute(
        "UPDATE seasons SET title = ?, overview = ?, icon = ?, fanart = ?, trailer = ?,
             premiered = ?, rating = ?, provider_name = ?, provider_id = ?, provider_data = ?,
             provider_link = ?, update_mode = ?, updated_at = ?
         WHERE show_id = ? AND season = ?",
        params![
            metadata.title,
            metadata.overview,
            metadata.icon,
            metadata.fanart,
            metadata.trailer,
            format_time(metadata.premiered),
            metadata.rating,
            provider.map(|p| &p.name),
            provider.map(|p| &p.id),
            provider.map(|p| &p.data),
            provider.and_then(|p| p.link.as_ref()),
            update_mode.as_i64(),
            Utc::now().to_rfc3339(),
            show_id.to_string(),
            season,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Set every season of a show to `update_mode` and drop their provider
/// bindings. Returns the number of seasons touched.
pub fn invalidate_seasons(
    conn: &Connection,
    show_id: ShowId,
    update_mode: UpdateMode,
) -> Result<usize> {
    conn.execute(
        "UPDATE seasons SET provider_name = NULL, provider_id = NULL, provider_data = NULL,
             provider_link = NULL, update_mode = ?
         WHERE show_id = ?",
        params![update_mode.as_i64(), show_id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))
}
