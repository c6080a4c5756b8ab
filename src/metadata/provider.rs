//! Trait definitions and types for TV metadata providers.
//!
//! A provider is split in two halves. [`TvShowProvider`] is the unbound
//! service: it knows its name and can search by title. Calling
//! [`TvShowProvider::configure`] with a stored binding yields a [`BoundShow`],
//! a handle scoped to one show that fetches the show, its seasons, episodes,
//! tags and people. Binding per show keeps concurrent scan workers from
//! sharing any mutable provider state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use showkeeper_db::models::ProviderBinding;

/// Flat settings handed to a provider factory.
pub type ProviderSettings = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Search candidates
// ---------------------------------------------------------------------------

/// A provider's proposed match for a title, pending confirmation.
///
/// Candidates are persisted as a JSON batch when no automatic selection is
/// made, so the field names are part of the stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Display title of the candidate.
    pub title: String,
    /// Name of the provider that returned it.
    pub provider_name: String,
    /// Provider-specific identifier.
    pub provider_id: String,
    /// Opaque provider data, handed back verbatim on configure.
    #[serde(default)]
    pub provider_data: String,
    /// Premiere date, if the provider knows it.
    #[serde(default)]
    pub premiered: Option<DateTime<Utc>>,
}

impl SearchCandidate {
    /// The binding a show receives when this candidate is selected.
    pub fn binding(&self) -> ProviderBinding {
        ProviderBinding {
            name: self.provider_name.clone(),
            id: self.provider_id.clone(),
            data: self.provider_data.clone(),
            link: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// Provider-side identity of a fetched record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRecord {
    pub name: String,
    pub id: String,
    pub data: String,
    pub link: Option<String>,
}

impl From<ProviderRecord> for ProviderBinding {
    fn from(record: ProviderRecord) -> Self {
        ProviderBinding {
            name: record.name,
            id: record.id,
            data: record.data,
            link: record.link,
        }
    }
}

/// Full metadata for a show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowDetail {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub website: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub record: ProviderRecord,
}

/// Full metadata for one season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonDetail {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub fanart: Option<String>,
    pub trailer: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub record: ProviderRecord,
}

/// Full metadata for one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeDetail {
    pub title: String,
    pub overview: Option<String>,
    pub icon: Option<String>,
    pub premiered: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub record: ProviderRecord,
}

/// A tag attached to a show (genre, network, keyword...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDetail {
    pub name: String,
    pub value: String,
    pub icon: Option<String>,
}

/// A person credited on a show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetail {
    pub name: String,
    pub role: Option<String>,
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

/// Async trait that every TV metadata provider implements.
///
/// Instances are created once per scan by the registry and shared between
/// workers behind an `Arc`, so implementations must not mutate shared state
/// per show; per-show state lives in the [`BoundShow`] returned by
/// [`configure`](Self::configure).
#[async_trait]
pub trait TvShowProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tvdb"`).
    fn name(&self) -> &str;

    /// Search for shows matching `title`.
    async fn search_show(&self, title: &str) -> anyhow::Result<Vec<SearchCandidate>>;

    /// Bind to one show using a stored provider id and opaque data.
    fn configure(&self, provider_id: &str, data: &str) -> anyhow::Result<Box<dyn BoundShow>>;
}

/// A provider handle bound to a single show.
#[async_trait]
pub trait BoundShow: Send + Sync {
    /// Fetch the show's own metadata.
    async fn fetch_show(&self) -> anyhow::Result<ShowDetail>;

    /// Fetch metadata for season `season`.
    async fn fetch_season(&self, season: u32) -> anyhow::Result<SeasonDetail>;

    /// Fetch metadata for episode `episode` of season `season`.
    async fn fetch_episode(&self, season: u32, episode: u32) -> anyhow::Result<EpisodeDetail>;

    /// List the show's tags.
    async fn list_show_tags(&self) -> anyhow::Result<Vec<TagDetail>>;

    /// List the people credited on the show.
    async fn list_show_people(&self) -> anyhow::Result<Vec<PersonDetail>>;
}
