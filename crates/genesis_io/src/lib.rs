//! # Genesis IO
//!
//! Persistence collaborator for the Genesis simulation.
//!
//! This crate provides:
//! - A typed `IoError`
//! - Gzip JSON archives and JSON-line records
//! - Versioned organism and world records with forward migration
//! - An atomic, sequence-numbered save store
//! - JSONL event history

/// Error types and result aliases for I/O operations
pub mod error;
/// Event history as JSON lines
pub mod history;
/// Save records, schema migration and the save store
pub mod persistence;
/// Gzip archives and JSON lines
pub mod serialization;

pub use error::{IoError, Result};
pub use history::{HistoryLine, HistoryLogger};
pub use persistence::{
    deserialize, migrate, migrate_world, serialize, OrganismRecord, SaveStore, WorldRecord,
    CURRENT_SCHEMA,
};
pub use serialization::{from_json_line, json_value_from_gz, to_json_gz, to_json_line};
