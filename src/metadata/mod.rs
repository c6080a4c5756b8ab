//! Metadata provider system for enriching shows with external data.
//!
//! # Module layout
//!
//! - [`provider`] -- Provider traits and shared data types.
//! - [`registry`] -- Provider catalog and the per-scan registry.
//! - [`selector`] -- Fuzzy selection of the best search candidate.

pub mod provider;
pub mod registry;
pub mod selector;

pub use provider::{BoundShow, ProviderSettings, SearchCandidate, TvShowProvider};
pub use registry::{ProviderCatalog, ProviderRegistry};
pub use selector::{select_best, MatchError};
