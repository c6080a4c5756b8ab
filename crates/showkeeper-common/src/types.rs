//! Core type definitions shared by the store and the scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media entity a row, link, or candidate batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A TV show (series).
    TvShow,
    /// A season within a show.
    TvSeason,
    /// A single episode within a show.
    TvEpisode,
    /// A movie.
    Movie,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TvShow => write!(f, "tvshow"),
            Self::TvSeason => write!(f, "tvseason"),
            Self::TvEpisode => write!(f, "tvepisode"),
            Self::Movie => write!(f, "movie"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tvshow" => Ok(Self::TvShow),
            "tvseason" => Ok(Self::TvSeason),
            "tvepisode" => Ok(Self::TvEpisode),
            "movie" => Ok(Self::Movie),
            _ => Err(format!("Invalid media kind: {}", s)),
        }
    }
}

/// Per-entity switch controlling automatic metadata refresh.
///
/// Only strictly positive modes are eligible for a refresh. [`UpdateMode::FORCE`]
/// is written when a new provider binding invalidates an entity and
/// [`UpdateMode::REFRESHED`] once a refresh has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateMode(i64);

impl UpdateMode {
    /// No automatic changes.
    pub const FROZEN: Self = Self(0);
    /// Eligible for the next refresh.
    pub const ENABLED: Self = Self(1);
    /// Must be re-derived on the next refresh, even if already bound.
    pub const FORCE: Self = Self(2);
    /// Metadata was pulled by a scan.
    pub const REFRESHED: Self = Self(-1);

    /// Whether a scan may refresh this entity's metadata.
    pub fn allows_refresh(self) -> bool {
        self.0 > 0
    }

    /// Raw integer as stored in the database.
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for UpdateMode {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Default for UpdateMode {
    fn default() -> Self {
        Self::ENABLED
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::FROZEN => write!(f, "frozen"),
            Self::FORCE => write!(f, "force"),
            Self::REFRESHED => write!(f, "refreshed"),
            Self(n) => write!(f, "enabled({})", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind_serialization() {
        let json = serde_json::to_string(&MediaKind::TvShow).unwrap();
        assert_eq!(json, r#""tvshow""#);

        let kind: MediaKind = serde_json::from_str(r#""tvepisode""#).unwrap();
        assert_eq!(kind, MediaKind::TvEpisode);
    }

    #[test]
    fn test_media_kind_parse_matches_display() {
        for kind in [
            MediaKind::TvShow,
            MediaKind::TvSeason,
            MediaKind::TvEpisode,
            MediaKind::Movie,
        ] {
            assert_eq!(kind.to_string().parse::<MediaKind>().unwrap(), kind);
        }
        assert!("music".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_update_mode_eligibility() {
        assert!(!UpdateMode::FROZEN.allows_refresh());
        assert!(UpdateMode::ENABLED.allows_refresh());
        assert!(UpdateMode::FORCE.allows_refresh());
        assert!(!UpdateMode::REFRESHED.allows_refresh());
        assert!(UpdateMode::from(7).allows_refresh());
    }

    #[test]
    fn test_update_mode_markers_are_distinct() {
        let modes = [
            UpdateMode::FROZEN,
            UpdateMode::ENABLED,
            UpdateMode::FORCE,
            UpdateMode::REFRESHED,
        ];
        for (i, a) in modes.iter().enumerate() {
            for b in &modes[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(UpdateMode::FORCE.to_string(), "force");
    }
}
