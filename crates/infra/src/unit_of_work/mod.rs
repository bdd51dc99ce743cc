//! Unit of work boundary.
//!
//! A unit of work stages entity changes against their repositories and
//! replays them in one commit, without any storage assumptions of its own.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::MemoryUnitOfWork;
pub use r#trait::{EntityState, PendingChange, UnitOfWork, UnitOfWorkEntity, UnitOfWorkRepository};
