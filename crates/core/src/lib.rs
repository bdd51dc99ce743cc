//! `stowage-core` — entity identity building blocks.
//!
//! This crate contains **pure domain** primitives (no storage concerns): the
//! aggregate contract, keys, key generation, and the repository error model.

pub mod entity;
pub mod error;
pub mod generator;
pub mod key;

pub use entity::{AggregateRoot, EntityHandle, StagedEntity, TrackedEntity};
pub use error::{ErrorKind, RepositoryError, RepositoryResult};
pub use generator::{KeyGenerator, Sequence};
pub use key::{Key, KeyValue};
