//! Core library for the professional directory service.
//!
//! The `directory` module holds the storage-agnostic application lifecycle:
//! registration intake, the public directory query engine, and the admin
//! moderation state machine, all running against a pluggable
//! [`directory::DirectoryStore`].

pub mod config;
pub mod directory;
pub mod error;
pub mod telemetry;
