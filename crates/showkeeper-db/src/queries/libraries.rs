//! Library database queries.

use chrono::Utc;
use rusqlite::Connection;
use showkeeper_common::{Error, LibraryId, Result};

use super::{id_column, time_column};
use crate::models::Library;

/// Create a new library rooted at `path`.
pub fn create_library(conn: &Connection, name: &str, path: &str) -> Result<Library> {
    let id = LibraryId::new();
    let created_at = Utc::now();

    conn.execute(
        "INSERT INTO libraries (id, name, path, created_at)
         VALUES (:id, :name, :path, :created_at)",
        rusqlite::named_params! {
            ":id": id.to_string(),
            ":name": name,
            ":path": path,
            ":created_at": created_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Library {
        id,
        name: name.to_string(),
        path: path.to_string(),
        created_at,
    })
}

/// Get a library by ID.
///
/// # Returns
///
/// * `Ok(Some(Library))` - The library if found
/// * `Ok(None)` - If the library does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_library(conn: &Connection, id: LibraryId) -> Result<Option<Library>> {
    let result = conn.query_row(
        "SELECT id, name, path, created_at FROM libraries WHERE id = :id",
        rusqlite::named_params! { ":id": id.to_string() },
        |row| {
            Ok(Library {
                id: id_column(row, 0)?,
                name: row.get(1)?,
                path: row.get(2)?,
                created_at: time_column(row, 3)?,
            })
        },
    );

    match result {
        Ok(library) => Ok(Some(library)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
