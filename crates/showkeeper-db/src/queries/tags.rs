//! Tag queries.
//!
//! Tags are shared between media entities and deduplicated by (name, value).
//! Linking is get-or-create: concurrent scans linking the same tag converge on
//! one row because both inserts are conflict-tolerant.

use rusqlite::{params, Connection};
use showkeeper_common::{Error, MediaKind, Result, TagId};

use super::id_column;
use crate::models::Tag;

/// Get a tag by its (name, value) pair.
pub fn get_tag_by_value(conn: &Connection, name: &str, value: &str) -> Result<Option<Tag>> {
    let result = conn.query_row(
        "SELECT id, name, value, icon FROM tags WHERE name = ? AND value = ?",
        params![name, value],
        |row| {
            Ok(Tag {
                id: id_column(row, 0)?,
                name: row.get(1)?,
                value: row.get(2)?,
                icon: row.get(3)?,
            })
        },
    );

    match result {
        Ok(tag) => Ok(Some(tag)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Link a tag to a media entity, creating the tag on first encounter.
pub fn link_tag(
    conn: &Connection,
    name: &str,
    value: &str,
    icon: Option<&str>,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Tag> {
    conn.execute(
        "INSERT OR IGNORE INTO tags (id, name, value, icon) VALUES (?, ?, ?, ?)",
        params![TagId::new().to_string(), name, value, icon],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let tag = get_tag_by_value(conn, name, value)?
        .ok_or_else(|| Error::internal(format!("tag {}={} vanished after insert", name, value)))?;

    conn.execute(
        "INSERT OR IGNORE INTO tag_links (tag_id, media_kind, media_id) VALUES (?, ?, ?)",
        params![tag.id.to_string(), media_kind.to_string(), media_id],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(tag)
}

/// List the tags linked to a media entity.
pub fn list_tags_for_media(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<Vec<Tag>> {
    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.name, t.value, t.icon FROM tags t
             JOIN tag_links l ON l.tag_id = t.id
             WHERE l.media_kind = ? AND l.media_id = ?
             ORDER BY t.name, t.value",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let tags = stmt
        .query_map(params![media_kind.to_string(), media_id], |row| {
            Ok(Tag {
                id: id_column(row, 0)?,
                name: row.get(1)?,
                value: row.get(2)?,
                icon: row.get(3)?,
            })
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(tags)
}

/// Remove every tag link of a media entity. Tags themselves are kept.
pub fn delete_all_tag_links(
    conn: &Connection,
    media_kind: MediaKind,
    media_id: &str,
) -> Result<usize> {
    conn.execute(
        "DELETE FROM tag_links WHERE media_kind = ? AND media_id = ?",
        params![media_kind.to_string(), media_id],
    )
    .map_err(|e| Error::database(e.to_string()))
}
