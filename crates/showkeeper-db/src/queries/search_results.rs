//! Pending search result batches.
//!
//! A batch holds every candidate a scan found for one media entity when no
//! automatic choice was made. Batches are replaced wholesale, never merged.

use chrono::Utc;
use rusqlite::{params, Connection};
use showkeeper_common::{Error, MediaKind, Result};

use super::{parsed_column, time_column};
use crate::models::SearchResultBatch;

/// Replace the batch of a media entity: the previous batch (if any) is deleted
/// before the new one is inserted.
pub fn replace_results(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
    name: &str,
    data: &str,
) -> Result<()> {
    delete_results(conn, media_kind, media_id)?;

    conn.execute(
        "INSERT INTO search_results (media_kind, media_id, name, data, created_at)
         VALUES (?, ?, ?, ?, ?)",
        params![
            media_kind.to_string(),
            media_id,
            name,
            data,
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get the pending batch of a media entity.
pub fn get_results(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Option<SearchResultBatch>> {
    let result = conn.query_row(
        "SELECT media_kind, media_id, name, data, created_at FROM search_results
         WHERE media_kind = ? AND media_id = ?",
        params![media_kind.to_string(), media_id],
        |row| {
            Ok(SearchResultBatch {
                media_kind: parsed_column(row, 0)?,
                media_id: row.get(1)?,
                name: row.get(2)?,
                data: row.get(3)?,
                created_at: time_column(row, 4)?,
            })
        },
    );

    match result {
        Ok(batch) => Ok(Some(batch)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Delete the pending batch of a media entity.
pub fn delete_results(conn: &Connection, media_kind: MediaKind, media_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM search_results WHERE media_kind = ? AND media_id = ?",
        params![media_kind.to_string(), media_id],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}
