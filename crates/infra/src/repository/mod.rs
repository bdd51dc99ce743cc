//! Repositories: the application-facing contract, the store seam, and the
//! in-memory implementation.

pub mod base;
pub mod extensions;
pub mod in_memory;
pub mod r#trait;

pub use base::RepositoryBase;
pub use extensions::RepositoryExt;
pub use in_memory::{MemoryRepository, MemoryStore};
pub use r#trait::{EntityStore, Repository};
