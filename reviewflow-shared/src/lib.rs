//! # ReviewFlow Shared Library
//!
//! Domain types, storage and the reviewer-assignment engine used by the
//! ReviewFlow API server.
//!
//! ## Module Organization
//!
//! - `models`: Stored entities and their PostgreSQL queries
//! - `db`: Connection pool and migrations
//! - `directory`: Storage trait with PostgreSQL and in-memory backends
//! - `engine`: Reviewer selection, pull request lifecycle, team cascade, stats
//! - `error`: Domain error taxonomy

pub mod db;
pub mod directory;
pub mod engine;
pub mod error;
pub mod models;

/// Current version of the ReviewFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
