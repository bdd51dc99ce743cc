use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use stowage_core::{RepositoryResult, StagedEntity};

use super::r#trait::{EntityState, PendingChange, UnitOfWork, UnitOfWorkEntity, UnitOfWorkRepository};

/// In-memory unit of work.
///
/// Holds pending changes in registration order. No deduplication: staging the
/// same entity twice replays it twice.
#[derive(Default)]
pub struct MemoryUnitOfWork {
    pending: Mutex<Vec<PendingChange>>,
}

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of the pending changes, in registration order.
    pub fn pending(&self) -> Vec<PendingChange> {
        self.lock().clone()
    }

    // The pending list is plain data; a panic mid-push cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, Vec<PendingChange>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, entity: StagedEntity, state: EntityState, repository: Arc<dyn UnitOfWorkRepository>) {
        debug!(
            entity_type = entity.entity_type(),
            key = %entity.describe_key(),
            ?state,
            repository = %repository.name(),
            "change staged"
        );
        self.lock().push(PendingChange::new(entity, state, repository));
    }

    fn take_pending(&self) -> Vec<PendingChange> {
        std::mem::take(&mut *self.lock())
    }
}

impl core::fmt::Debug for MemoryUnitOfWork {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryUnitOfWork")
            .field("pending", &*self.lock())
            .finish()
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn register_added(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>) {
        self.register(entity, EntityState::Added, repository);
    }

    fn register_changed(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>) {
        self.register(entity, EntityState::Changed, repository);
    }

    fn register_removed(&self, entity: StagedEntity, repository: Arc<dyn UnitOfWorkRepository>) {
        self.register(entity, EntityState::Removed, repository);
    }

    #[tracing::instrument(skip(self))]
    async fn commit(&self) -> RepositoryResult<()> {
        // Drained up front: whatever happens below, these are never replayed again.
        let pending = self.take_pending();
        if pending.is_empty() {
            debug!("nothing to commit");
            return Ok(());
        }

        let mut replayed = [0usize; 3];
        for (phase, state) in EntityState::PHASES.into_iter().enumerate() {
            for change in pending.iter().filter(|c| c.state() == state) {
                debug!(
                    entity_type = change.entity.entity.entity_type(),
                    key = %change.entity.entity.describe_key(),
                    ?state,
                    repository = %change.repository.name(),
                    "replaying change"
                );
                if let Err(err) = change.replay().await {
                    warn!(
                        error = %err,
                        ?state,
                        discarded = pending.len() - replayed.iter().sum::<usize>(),
                        "commit aborted; earlier phases stay applied"
                    );
                    return Err(err);
                }
                replayed[phase] += 1;
            }
        }

        info!(
            removed = replayed[0],
            added = replayed[1],
            changed = replayed[2],
            "unit of work committed"
        );
        Ok(())
    }

    fn rollback(&self) {
        let discarded = self.take_pending().len();
        if discarded > 0 {
            warn!(discarded, "pending changes rolled back");
        }
    }

    fn get(&self, key: &dyn Any) -> Option<UnitOfWorkEntity> {
        self.lock()
            .iter()
            .find(|c| c.entity.entity.has_key(key))
            .map(|c| c.entity.clone())
    }

    fn pending_count(&self) -> usize {
        self.lock().len()
    }
}
