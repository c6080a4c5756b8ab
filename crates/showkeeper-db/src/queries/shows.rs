//! Show database queries.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use showkeeper_common::{Error, LibraryId, Result, ShowId, UpdateMode};

use super::{binding_columns, format_time, id_column, opt_time_column, time_column};
use crate::models::{ProviderBinding, Show, ShowMetadata};

const SHOW_COLUMNS: &str = "id, library_id, title, path, overview, icon, fanart, website, trailer,
    premiered, rating, provider_name, provider_id, provider_data, provider_link, update_mode,
    added_at, updated_at";

fn map_show(row: &Row<'_>) -> rusqlite::Result<Show> {
    Ok(Show {
        id: id_column(row, 0)?,
        library_id: id_column(row, 1)?,
        title: row.get(2)?,
        path: row.get(3)?,
        overview: row.get(4)?,
        icon: row.get(5)?,
        fanart: row.get(6)?,
        website: row.get(7)?,
        trailer: row.get(8)?,
        premiered: opt_time_column(row, 9)?,
        rating: row.get(10)?,
        provider: binding_columns(row, 11)?,
        update_mode: UpdateMode::from(row.get::<_, i64>(15)?),
        added_at: time_column(row, 16)?,
        updated_at: opt_time_column(row, 17)?,
    })
}

/// Create a show for a library folder.
///
/// The folder name doubles as the initial title. New shows start with
/// [`UpdateMode::ENABLED`] and no provider binding.
pub fn create_show(conn: &Connection, library_id: LibraryId, folder: &str) -> Result<Show> {
    let id = ShowId::new();
    let added_at = Utc::now();
    let update_mode = UpdateMode::ENABLED;

    conn.execute(
        "INSERT INTO shows (id, library_id, title, path, update_mode, added_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            library_id.to_string(),
            folder,
            folder,
            update_mode.as_i64(),
            added_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Show {
        id,
        library_id,
        title: folder.to_string(),
        path: folder.to_string(),
        overview: None,
        icon: None,
        fanart: None,
        website: None,
        trailer: None,
        premiered: None,
        rating: None,
        provider: None,
        update_mode,
        added_at,
        updated_at: None,
    })
}

/// Get a show by ID.
pub fn get_show(conn: &Connection, id: ShowId) -> Result<Option<Show>> {
    let result = conn.query_row(
        &format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = ?"),
        [id.to_string()],
        map_show,
    );

    match result {
        Ok(show) => Ok(Some(show)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List every show of a library, ordered by path.
pub fn list_shows(conn: &Connection, library_id: LibraryId) -> Result<Vec<Show>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SHOW_COLUMNS} FROM shows WHERE library_id = ? ORDER BY path"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let shows = stmt
        .query_map([library_id.to_string()], map_show)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(shows)
}

/// Write refreshed metadata onto a show and set its update mode.
///
/// The provider name and id are left untouched; a refresh never rebinds.
pub fn update_show_metadata(
    conn: &Connection,
    id: ShowId,
    metadata: &ShowMetadata,
    update_mode: UpdateMode,
) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE shows SET title = ?, overview = ?, icon = ?, fanart = ?, website = ?,
                 trailer = ?, premiered = ?, rating = ?, provider_link = ?,
                 provider_data = COALESCE(?, provider_data), update_mode = ?, updated_at = ?
             WHERE id = ?",
            params![
                metadata.title,
                metadata.overview,
                metadata.icon,
                metadata.fanart,
                metadata.website,
                metadata.trailer,
                format_time(metadata.premiered),
                metadata.rating,
                metadata.provider_link,
                metadata.provider_data,
                update_mode.as_i64(),
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Err(Error::not_found(format!("show {}", id)));
    }
    Ok(())
}

/// Replace a show's provider binding and set its update mode.
pub fn set_binding(
    conn: &Connection,
    id: ShowId,
    binding: &ProviderBinding,
    update_mode: UpdateMode,
) -> Result<()> {
    let changed = conn
        .execute(
            "UPDATE shows SET provider_name = ?, provider_id = ?, provider_data = ?,
                 provider_link = ?, update_mode = ?, updated_at = ?
             WHERE id = ?",
            params![
                binding.name,
                binding.id,
                binding.data,
                binding.link,
                update_mode.as_i64(),
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Err(Error::not_found(format!("show {}", id)));
    }
    Ok(())
}

/// Set a show's update mode without touching anything else.
pub fn set_update_mode(conn: &Connection, id: ShowId, update_mode: UpdateMode) -> Result<()> {
    conn.execute(
        "UPDATE shows SET update_mode = ? WHERE id = ?",
        params![update_mode.as_i64(), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}
