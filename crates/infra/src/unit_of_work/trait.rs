use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use stowage_core::{AggregateRoot, EntityHandle, RepositoryResult, StagedEntity};

/// Intended state of a staged entity.
///
/// Commit replays states in phase order: `Removed`, then `Added`, then `Changed`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EntityState {
    Added,
    Changed,
    Removed,
}

impl EntityState {
    /// Replay order used by commit.
    pub const PHASES: [EntityState; 3] = [EntityState::Removed, EntityState::Added, EntityState::Changed];
}

/// An entity registered in a unit of work, tagged with its intended state.
#[derive(Clone)]
pub struct UnitOfWorkEntity {
    pub entity: StagedEntity,
    pub state: EntityState,
}

impl UnitOfWorkEntity {
    pub fn new(entity: StagedEntity, state: EntityState) -> Self {
        Self { entity, state }
    }

    /// Typed handle to the staged entity, if it is an `E`.
    pub fn entity_as<E: AggregateRoot>(&self) -> Option<EntityHandle<E>> {
        EntityHandle::from_staged(self.entity.as_ref())
    }
}

impl core::fmt::Debug for UnitOfWorkEntity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitOfWorkEntity")
            .field("entity_type", &self.entity.entity_type())
            .field("key", &self.entity.describe_key())
            .field("state", &self.state)
            .finish()
    }
}

/// A staged change and the repository it must be replayed against.
#[derive(Clone)]
pub struct PendingChange {
    pub entity: UnitOfWorkEntity,
    pub repository: Arc<dyn UnitOfWorkRepository>,
}

impl PendingChange {
    pub fn new(entity: StagedEntity, state: EntityState, repository: Arc<dyn UnitOfWorkRepository>) -> Self {
        Self {
            entity: UnitOfWorkEntity::new(entity, state),
            repository,
        }
    }

    pub fn state(&self) -> EntityState {
        self.entity.state
    }

    /// Invokes the persist primitive matching the intended state.
    pub async fn replay(&self) -> RepositoryResult<()> {
        let item = &self.entity.entity;
        match self.entity.state {
            EntityState::Removed => self.repository.persist_deleted_item(item).await,
            EntityState::Added => self.repository.persist_new_item(item).await,
            EntityState::Changed => self.repository.persist_updated_item(item).await,
        }
    }
}

impl core::fmt::Debug for PendingChange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingChange")
            .field("entity", &self.entity)
            .field("repository", &self.repository.name())
            .finish()
    }
}

/// Persist contract a repository exposes to units of work.
///
/// Only a unit of work commit calls these; application code stages changes
/// through the repository instead.
#[async_trait]
pub trait UnitOfWorkRepository: Send + Sync {
    /// Repository name, for diagnostics.
    fn name(&self) -> String;

    /// Inserts a new entity, generating its key if unassigned.
    ///
    /// Fails with `DuplicateKey` if the key is already stored.
    async fn persist_new_item(&self, item: &StagedEntity) -> RepositoryResult<()>;

    /// Replaces the stored entity with the same key.
    async fn persist_updated_item(&self, item: &StagedEntity) -> RepositoryResult<()>;

    /// Removes the stored entity with the same key.
    ///
    /// Fails with `EntityNotFound` if no stored entity has that key.
    async fn persist_deleted_item(&self, item: &StagedEntity) -> RepositoryResult<()>;
}

/// Session-scoped staging area for entity changes.
///
/// ## Lifecycle
///
/// Empty → staging (any number of `register_*` calls) → empty again, through
/// either `commit` or `rollback`. Nothing is ever partially drained.
///
/// ## Commit semantics
///
/// `commit` replays every pending change against its repository in phase
/// order (all removals, then all additions, then all changes; registration
/// order within a phase). The first failure stops the replay and is returned
/// as is. Phases already applied stay applied, and the pending list is empty
/// after the call either way, so a later commit never replays them twice.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Stages `entity` to be inserted by `repository` on commit.
    fn register_added(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>);

    /// Stages `entity` to replace its stored version on commit.
    fn register_changed(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>);

    /// Stages `entity` to be removed by `repository` on commit.
    fn register_removed(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>);

    /// Replays all pending changes, then clears them.
    async fn commit(&self) -> RepositoryResult<()>;

    /// Discards all pending changes without touching any repository.
    fn rollback(&self);

    /// First pending entity whose key equals `key` (a raw key value or a `Key<_>`).
    fn get(&self, key: &dyn Any) -> Option<UnitOfWorkEntity>;

    /// Number of pending changes.
    fn pending_count(&self) -> usize;
}
