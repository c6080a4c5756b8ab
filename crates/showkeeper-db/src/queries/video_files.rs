//! Video file queries.
//!
//! A video file row associates a path (relative to the library root) with the
//! media entity it plays. Rows are created once per discovered file and keyed
//! by (library, path).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use showkeeper_common::{Error, LibraryId, MediaKind, Result, VideoFileId};

use super::{format_time, id_column, opt_time_column, parsed_column, time_column};
use crate::models::VideoFile;

fn map_video_file(row: &Row<'_>) -> rusqlite::Result<VideoFile> {
    Ok(VideoFile {
        id: id_column(row, 0)?,
        library_id: id_column(row, 1)?,
        path: row.get(2)?,
        media_kind: parsed_column(row, 3)?,
        media_id: row.get(4)?,
        size_bytes: row.get(5)?,
        modified_at: opt_time_column(row, 6)?,
        added_at: time_column(row, 7)?,
    })
}

/// Register a file against a media entity.
pub fn create_video_file(
    conn: &Connection,
    library_id: LibraryId,
    path: &str,
    media_kind: MediaKind,
    media_id: &str,
    size_bytes: i64,
    modified_at: Option<DateTime<Utc>>,
) -> Result<VideoFile> {
    let id = VideoFileId::new();
    let added_at = Utc::now();

    conn.execute(
        "INSERT INTO video_files (id, library_id, path, media_kind, media_id, size_bytes,
             modified_at, added_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            library_id.to_string(),
            path,
            media_kind.to_string(),
            media_id,
            size_bytes,
            format_time(modified_at),
            added_at.to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(VideoFile {
        id,
        library_id,
        path: path.to_string(),
        media_kind,
        media_id: media_id.to_string(),
        size_bytes,
        modified_at,
        added_at,
    })
}

/// Look up a file by its library-relative path.
pub fn get_video_file_by_path(
    conn: &Connection,
    library_id: LibraryId,
    path: &str,
) -> Result<Option<VideoFile>> {
    let result = conn.query_row(
        "SELECT id, library_id, path, media_kind, media_id, size_bytes, modified_at, added_at
         FROM video_files WHERE library_id = ? AND path = ?",
        params![library_id.to_string(), path],
        map_video_file,
    );

    match result {
        Ok(file) => Ok(Some(file)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List the files of a library, ordered by path.
pub fn list_video_files(conn: &Connection, library_id: LibraryId) -> Result<Vec<VideoFile>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, library_id, path, media_kind, media_id, size_bytes, modified_at, added_at
             FROM video_files WHERE library_id = ? ORDER BY path",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let files = stmt
        .query_map([library_id.to_string()], map_video_file)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(files)
}

/// Refresh the recorded size and modification time of a file.
pub fn touch_video_file(
    conn: &Connection,
    id: VideoFileId,
    size_bytes: i64,
    modified_at: Option<DateTime<Utc>>,
) -> Result<()> {
    conn.execute(
        "UPDATE video_files SET size_bytes = ?, modified_at = ? WHERE id = ?",
        params![size_bytes, format_time(modified_at), id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::{create_test_show, setup_test_db};

    #[test]
    fn test_create_and_lookup_by_path() {
        let conn = setup_test_db();
        let (library, _) = create_test_show(&conn);

        let created = create_video_file(
            &conn,
            library.id,
            "The Expanse/The.Expanse.S01E01.mkv",
            MediaKind::TvEpisode,
            "episode-1",
            1024,
            None,
        )
        .unwrap();

        let fetched = get_video_file_by_path(&conn, library.id, "The Expanse/The.Expanse.S01E01.mkv")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.media_kind, MediaKind::TvEpisode);
        assert_eq!(fetched.media_id, "episode-1");

        assert!(get_video_file_by_path(&conn, library.id, "missing.mkv")
            .unwrap()
            .is_none());
        assert!(get_video_file_by_path(&conn, LibraryId::new(), &fetched.path)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_path_unique_per_library() {
        let conn = setup_test_db();
        let (library, _) = create_test_show(&conn);

        create_video_file(&conn, library.id, "a.mkv", MediaKind::TvEpisode, "e", 1, None).unwrap();
        let err = create_video_file(&conn, library.id, "a.mkv", MediaKind::TvEpisode, "e", 1, None)
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_touch_video_file() {
        let conn = setup_test_db();
        let (library, _) = create_test_show(&conn);
        let file =
            create_video_file(&conn, library.id, "a.mkv", MediaKind::TvEpisode, "e", 1, None)
                .unwrap();

        let now = Utc::now();
        touch_video_file(&conn, file.id, 4096, Some(now)).unwrap();

        let files = list_video_files(&conn, library.id).unwrap();
        assert_eq!(files[0].size_bytes, 4096);
        assert!(files[0].modified_at.is_some());
    }
}
