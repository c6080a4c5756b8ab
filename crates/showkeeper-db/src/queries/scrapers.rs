//! Provider configuration queries.
//!
//! Each row enables (or disables) one provider for one media kind, with a
//! priority and a flat JSON object of settings.

use std::collections::HashMap;

use rusqlite::{params, Connection};
use showkeeper_common::{Error, MediaKind, Result};

use crate::models::ScraperConfig;

/// Insert or replace the configuration of a provider for a media kind.
pub fn upsert_scraper(
    conn: &Connection,
    media_kind: MediaKind,
    provider: &str,
    priority: i64,
    enabled: bool,
    settings: &HashMap<String, String>,
) -> Result<()> {
    let settings_json =
        serde_json::to_string(settings).map_err(|e| Error::internal(e.to_string()))?;

    conn.execute(
        "INSERT INTO scrapers (media_kind, provider, priority, enabled, settings)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (media_kind, provider) DO UPDATE SET
             priority = excluded.priority,
             enabled = excluded.enabled,
             settings = excluded.settings",
        params![media_kind.to_string(), provider, priority, enabled, settings_json],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// List provider configurations for a media kind, highest priority first.
///
/// Disabled rows are included; callers decide what to do with them. Settings
/// that are not a flat string map fail the whole listing.
pub fn list_scrapers(conn: &Connection, media_kind: MediaKind) -> Result<Vec<ScraperConfig>> {
    let mut stmt = conn
        .prepare(
            "SELECT provider, priority, enabled, settings FROM scrapers
             WHERE media_kind = ? ORDER BY priority DESC, provider",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([media_kind.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, String>(3)?,
            ))
        })
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    rows.into_iter()
        .map(|(provider, priority, enabled, settings)| {
            let settings: HashMap<String, String> = serde_json::from_str(&settings)
                .map_err(|e| {
                    Error::invalid_input(format!("settings of provider {}: {}", provider, e))
                })?;
            Ok(ScraperConfig {
                media_kind,
                provider,
                priority,
                enabled,
                settings,
            })
        })
        .collect()
}
