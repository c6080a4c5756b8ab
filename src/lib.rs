//! Showkeeper - TV library reconciliation
//!
//! This library crate exposes the scanner, the provider system and the
//! configuration layer for embedders and integration testing.

pub mod config;
pub mod metadata;
pub mod scanner;
