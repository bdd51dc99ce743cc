//! Infrastructure layer: repositories, units of work, and the query engine
//! they share.

pub mod query;
pub mod repository;
pub mod unit_of_work;

pub use query::{Direction, Filter, OrderBy, Page, Sort};
pub use repository::{EntityStore, MemoryRepository, MemoryStore, Repository, RepositoryBase, RepositoryExt};
pub use unit_of_work::{EntityState, MemoryUnitOfWork, PendingChange, UnitOfWork, UnitOfWorkEntity, UnitOfWorkRepository};

#[cfg(test)]
mod integration_tests;

#[cfg(test)]
pub(crate) mod test_support;
