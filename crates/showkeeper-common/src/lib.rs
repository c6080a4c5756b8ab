//! Showkeeper-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across showkeeper:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for libraries, shows, seasons, etc.
//! - **Core Types**: Media kinds and the per-entity update mode
//! - **Path Utilities**: Video file detection by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use showkeeper_common::{ShowId, MediaKind, UpdateMode, Error, Result};
//! use showkeeper_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let show_id = ShowId::new();
//! assert_eq!(MediaKind::TvShow.to_string(), "tvshow");
//! assert!(UpdateMode::ENABLED.allows_refresh());
//! assert!(is_video_file(Path::new("Show.S01E01.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("show"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
