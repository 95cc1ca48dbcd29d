//! Application lifecycle and directory query engine.
//!
//! One storage-agnostic core replaces the platform's three duplicated backend
//! variants: registrations flow through [`RegistrationEngine`], the public
//! directory reads through [`DirectoryQuery`], and admins decide applications
//! through [`Moderation`]. All three talk to a [`DirectoryStore`] port with an
//! in-memory adapter and a SQLite adapter.

pub mod domain;
pub mod intake;
pub mod memory;
pub mod moderation;
pub mod query;
pub mod registration;
pub mod resolver;
pub mod router;
pub mod sqlite;
pub mod storage;

#[cfg(test)]
mod tests;

pub use domain::{
    Category, CategoryRef, DirectoryEntry, DirectoryFilter, NewProfessional, ProfessionalId,
    ProfessionalProfile, ProfessionalStatus, RegistrationForm, ServiceFormat, NATIONWIDE,
};
pub use memory::MemoryStore;
pub use moderation::Moderation;
pub use query::{AdminListing, DirectoryQuery, PublicListing};
pub use registration::{RegistrationEngine, RegistrationReceipt};
pub use router::{directory_router, ApiState};
pub use sqlite::SqliteStore;
pub use storage::{DirectoryStore, StoreError};

/// Errors surfaced by the registration, query, and moderation engines. The
/// API facade maps these onto status codes and localized bodies.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("target age range is inverted (min {min} > max {max})")]
    InvertedAgeRange { min: i64, max: i64 },
    #[error("credential hashing failed: {0}")]
    Credential(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
