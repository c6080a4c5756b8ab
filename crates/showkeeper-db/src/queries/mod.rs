//! Database query modules.
//!
//! One module per table group:
//! - libraries: library lookup (creation is for embedders and tests)
//! - shows, seasons, episodes: catalog entities and their update modes
//! - video_files: file path to episode associations
//! - tags, people: deduplicated reference entities and their links
//! - search_results: pending candidate batches awaiting selection
//! - scrapers: per media kind provider configuration

pub mod episodes;
pub mod libraries;
pub mod people;
pub mod scrapers;
pub mod search_results;
pub mod seasons;
pub mod shows;
pub mod tags;
pub mod video_files;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use crate::models::ProviderBinding;

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a UUID-backed id column.
pub(crate) fn id_column<T: From<Uuid>>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map(T::from)
        .map_err(|e| conversion_error(idx, e))
}

/// Read a non-null RFC 3339 timestamp column.
pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_time(&raw).map_err(|e| conversion_error(idx, e))
}

/// Read a nullable RFC 3339 timestamp column.
pub(crate) fn opt_time_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse_time(&raw)
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

/// Read a string-encoded enum column.
pub(crate) fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
    })
}

/// Read the four provider columns starting at `idx`.
///
/// A binding only exists when both name and id are present and non-blank.
pub(crate) fn binding_columns(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<ProviderBinding>> {
    let name: Option<String> = row.get(idx)?;
    let id: Option<String> = row.get(idx + 1)?;
    let data: Option<String> = row.get(idx + 2)?;
    let link: Option<String> = row.get(idx + 3)?;

    match (name, id) {
        (Some(name), Some(id)) if !name.trim().is_empty() && !id.trim().is_empty() => {
            Ok(Some(ProviderBinding {
                name,
                id,
                data: data.unwrap_or_default(),
                link,
            }))
        }
        _ => Ok(None),
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

pub(crate) fn format_time(time: Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.to_rfc3339())
}
