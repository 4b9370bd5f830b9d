/// Project entity
///
/// Top-level entity of the datastore. Built from a JSON payload through the
/// validation chain in `validate`, or decoded from a stored record.

pub mod types;
mod validate;

pub use types::{Project, ProjectField, Reference};
