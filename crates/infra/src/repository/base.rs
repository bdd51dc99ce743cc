use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use stowage_core::{AggregateRoot, EntityHandle, Key, RepositoryError, RepositoryResult};

use super::r#trait::{EntityStore, Repository};
use crate::query::{Direction, Filter, OrderBy, Page, Sort};
use crate::unit_of_work::{UnitOfWork, UnitOfWorkRepository};

/// Repository over any [`EntityStore`].
///
/// Owns the unit-of-work binding and the staging rules; reads and persists are
/// the store's business.
pub struct RepositoryBase<S> {
    store: Arc<S>,
    unit_of_work: RwLock<Option<Arc<dyn UnitOfWork>>>,
}

impl<S: EntityStore> RepositoryBase<S> {
    pub fn from_store(store: S, unit_of_work: Option<Arc<dyn UnitOfWork>>) -> Self {
        Self {
            store: Arc::new(store),
            unit_of_work: RwLock::new(unit_of_work),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Currently bound unit of work, if any.
    pub fn unit_of_work(&self) -> Option<Arc<dyn UnitOfWork>> {
        self.unit_of_work
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn bound_unit_of_work(&self) -> RepositoryResult<Arc<dyn UnitOfWork>> {
        self.unit_of_work()
            .ok_or_else(|| RepositoryError::missing_unit_of_work(self.store.store_name()))
    }

    fn target(&self) -> Arc<dyn UnitOfWorkRepository> {
        self.store.clone()
    }

    fn stage_changed(&self, entity: EntityHandle<S::Entity>) -> RepositoryResult<()> {
        let unit_of_work = self.bound_unit_of_work()?;
        debug!(key = ?entity.key(), repository = %self.store.store_name(), "staging changed entity");
        unit_of_work.register_changed(entity.staged(), self.target());
        Ok(())
    }

    async fn ordered(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<S::Entity>>,
        order_by: Option<OrderBy<S::Entity>>,
        direction: Direction,
    ) -> RepositoryResult<Vec<EntityHandle<S::Entity>>> {
        let order_by = order_by
            .ok_or_else(|| RepositoryError::invalid_argument("order_by", "an ordering is required"))?;

        self.store
            .query(filter, Sort::By(order_by, direction), Page::new(offset, limit))
            .await
    }
}

impl<S> core::fmt::Debug for RepositoryBase<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RepositoryBase")
            .field("store", &std::any::type_name::<S>())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S: EntityStore> Repository<S::Entity> for RepositoryBase<S> {
    fn set_unit_of_work(&self, unit_of_work: Arc<dyn UnitOfWork>) {
        *self.unit_of_work.write().unwrap_or_else(PoisonError::into_inner) = Some(unit_of_work);
    }

    async fn find_by(
        &self,
        key: &<S::Entity as AggregateRoot>::Key,
        sync_before_find: bool,
    ) -> RepositoryResult<Option<EntityHandle<S::Entity>>> {
        self.store.find_by(key, sync_before_find).await
    }

    async fn find_all(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<S::Entity>>,
    ) -> RepositoryResult<Vec<EntityHandle<S::Entity>>> {
        self.store
            .query(filter, Sort::ByKey, Page::new(offset, limit))
            .await
    }

    async fn find_all_ascending(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<S::Entity>>,
        order_by: Option<OrderBy<S::Entity>>,
    ) -> RepositoryResult<Vec<EntityHandle<S::Entity>>> {
        self.ordered(offset, limit, filter, order_by, Direction::Ascending)
            .await
    }

    async fn find_all_descending(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<S::Entity>>,
        order_by: Option<OrderBy<S::Entity>>,
    ) -> RepositoryResult<Vec<EntityHandle<S::Entity>>> {
        self.ordered(offset, limit, filter, order_by, Direction::Descending)
            .await
    }

    async fn count_all(&self, filter: Option<Filter<S::Entity>>) -> RepositoryResult<u64> {
        self.store.count(filter).await
    }

    fn add(&self, entity: EntityHandle<S::Entity>) -> RepositoryResult<()> {
        let unit_of_work = self.bound_unit_of_work()?;
        debug!(key = ?entity.key(), repository = %self.store.store_name(), "staging new entity");
        unit_of_work.register_added(entity.staged(), self.target());
        Ok(())
    }

    fn remove(&self, entity: EntityHandle<S::Entity>) -> RepositoryResult<()> {
        let unit_of_work = self.bound_unit_of_work()?;
        debug!(key = ?entity.key(), repository = %self.store.store_name(), "staging removed entity");
        unit_of_work.register_removed(entity.staged(), self.target());
        Ok(())
    }

    async fn attach(&self, entity: EntityHandle<S::Entity>) -> RepositoryResult<EntityHandle<S::Entity>> {
        let existing = match entity.key().normalized() {
            Key::Assigned(key) => self.store.find_by(&key, false).await?,
            Key::Unassigned => None,
        };

        match existing {
            Some(_) => self.stage_changed(entity.clone())?,
            None => self.add(entity.clone())?,
        }

        Ok(entity)
    }
}
