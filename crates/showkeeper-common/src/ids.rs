//! Typed ID wrappers for type safety across showkeeper.
//!
//! Each ID type is a newtype over `Uuid`, preventing accidental misuse
//! (e.g., passing a `SeasonId` where a `ShowId` is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a newtype ID wrapper over `Uuid`.
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(Uuid);

            impl $name {
                /// Create a new random ID.
                #[must_use]
                pub fn new() -> Self {
                    Self(Uuid::new_v4())
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = uuid::Error;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    Uuid::parse_str(s).map(Self)
                }
            }

            impl From<Uuid> for $name {
                fn from(uuid: Uuid) -> Self {
                    Self(uuid)
                }
            }

            impl From<$name> for Uuid {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Unique identifier for a media library.
    LibraryId,
    /// Unique identifier for a TV show.
    ShowId,
    /// Unique identifier for a season of a show.
    SeasonId,
    /// Unique identifier for a single episode.
    EpisodeId,
    /// Unique identifier for a video file registered against a media entity.
    VideoFileId,
    /// Unique identifier for a tag.
    TagId,
    /// Unique identifier for a person.
    PersonId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_id_creation() {
        let id1 = ShowId::new();
        let id2 = ShowId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_library_id_round_trips_through_string() {
        let id = LibraryId::new();
        let parsed: LibraryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<LibraryId>().is_err());
    }

    #[test]
    fn test_episode_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let id = EpisodeId::from(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
