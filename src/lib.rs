/// entitykit: schema-validated entities over record datastores
///
/// Entities are built from untrusted JSON through an ordered validation chain,
/// or decoded from records a backend already holds, and persisted back through
/// the same backend interface.

// Configuration: entity field tables and record store location
pub mod config;

// Error catalog for validation, construction and persistence failures
pub mod error;

// JSON parsing and type helpers used by the validators
pub mod json;

// Backend collaborator interface plus in-memory and SQLite record stores
pub mod backend;

// Entity contract, shared validators and the class-name registry
pub mod entity;

// The Project entity and its validation chain
pub mod project;

// Re-export commonly used types for external consumers
pub use backend::{Backend, MemoryBackend, Record, SqliteBackend};
pub use config::{Config, ModelsConfig};
pub use entity::{initialize, AnyEntity, Entity, EntityContext, EntityRegistry, Lifecycle, Source};
pub use error::{BackendError, EntityError, EntityResult};
pub use project::{Project, ProjectField};
