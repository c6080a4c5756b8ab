//! Internal Rust models matching the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showkeeper_common::{
    EpisodeId, LibraryId, MediaKind, PersonId, SeasonId, ShowId, TagId, UpdateMode, VideoFileId,
};

/// Media library model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub id: LibraryId,
    pub name: String,
    /// Root directory whose sub-folders are the library's shows.
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Link between a catalog entity and one provider's record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderBinding {
    pub name: String,
    pub id: String,
    /// Opaque provider-owned blob, handed back verbatim on configure.
    pub data: String,
    pub link: Option<String>,
}

/// TV show model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: ShowId,
    pub library_id: LibraryId,
    pub title: String,
    /// Folder name relative to the library root.
    pub path: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub website: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider: Option<ProviderBinding>,
    pub update_mode: UpdateMode,
    pub added_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Season model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Season {
    pub id: SeasonId,
    pub show_id: ShowId,
    pub season: u32,
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider: Option<ProviderBinding>,
    pub update_mode: UpdateMode,
    pub added_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Episode model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    pub id: EpisodeId,
    pub show_id: ShowId,
    pub season: u32,
    pub episode: u32,
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider: Option<ProviderBinding>,
    pub update_mode: UpdateMode,
    pub added_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Metadata fields written onto a show by a refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowMetadata {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub website: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider_link: Option<String>,
    pub provider_data: Option<String>,
}

/// Metadata fields written onto a season.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonMetadata {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider: Option<ProviderBinding>,
}

/// Metadata fields written onto an episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeMetadata {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub provider: Option<ProviderBinding>,
}

/// A video file registered against a media entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoFile {
    pub id: VideoFileId,
    pub library_id: LibraryId,
    /// Path relative to the library root.
    pub path: String,
    pub media_kind: MediaKind,
    /// Id of the entity the file plays (an episode id for TV).
    pub media_id: String,
    pub size_bytes: i64,
    pub modified_at: Option<DateTime<Utc>>,
    pub added_at: DateTime<Utc>,
}

/// Tag model, deduplicated by (name, value).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub value: String,
    pub icon: Option<String>,
}

/// Person model, deduplicated by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

/// Persisted batch of search candidates awaiting a manual choice.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultBatch {
    pub media_kind: MediaKind,
    pub media_id: String,
    /// Title that was searched for.
    pub name: String,
    /// JSON array of candidates, decoded by the scanner.
    pub data: String,
    pub created_at: DateTime<Utc>,
}

/// Provider configuration row for one media kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperConfig {
    pub media_kind: MediaKind,
    pub provider: String,
    pub priority: i64,
    pub enabled: bool,
    /// Flat string settings handed to the provider factory.
    pub settings: std::collections::HashMap<String, String>,
}
