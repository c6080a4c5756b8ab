//! Showkeeper-DB: catalog schema, migrations, and query operations
//!
//! This crate is the persisted store behind the reconciliation engine. It uses
//! SQLite through rusqlite with r2d2 connection pooling, and leaves every
//! uniqueness rule (one season per number, one episode per pair, one file row
//! per path) to table constraints rather than to its callers.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use showkeeper_db::pool::{init_pool, get_conn};
//! use showkeeper_db::queries::libraries;
//!
//! let pool = init_pool("/var/lib/showkeeper/catalog.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let library = libraries::create_library(&conn, "TV", "/media/tv").unwrap();
//! println!("Created library: {}", library.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
