use std::sync::Arc;

use async_trait::async_trait;

use stowage_core::{AggregateRoot, EntityHandle, RepositoryError, RepositoryResult, StagedEntity};

use crate::query::{Filter, OrderBy, Page, Sort};
use crate::unit_of_work::{UnitOfWork, UnitOfWorkRepository};

/// Repository of aggregate entities, as seen by application code.
///
/// ## Reads
///
/// Reads go straight to the backing store. `find_all` orders by key
/// ascending; the `*_ascending`/`*_descending` variants order by a caller
/// supplied sort key and require one. A window (`offset`, `limit`) is applied
/// after filtering and ordering. Nothing found is an empty result, never an
/// error.
///
/// ## Writes
///
/// `add`, `remove` and `attach` only stage the change in the bound unit of
/// work; the store changes when that unit of work commits.
#[async_trait]
pub trait Repository<E: AggregateRoot>: Send + Sync {
    /// Binds the unit of work used by subsequent staging calls.
    fn set_unit_of_work(&self, unit_of_work: Arc<dyn UnitOfWork>);

    /// Entity with the given key, if stored.
    ///
    /// `sync_before_find` asks stores that buffer writes to flush first.
    async fn find_by(&self, key: &E::Key, sync_before_find: bool) -> RepositoryResult<Option<EntityHandle<E>>>;

    /// Entities matching `filter` (all if `None`), key ascending, windowed.
    async fn find_all(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<E>>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>>;

    /// Entities matching `filter`, ascending by `order_by`, windowed.
    ///
    /// Fails with `InvalidArgument` when `order_by` is `None`.
    async fn find_all_ascending(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<E>>,
        order_by: Option<OrderBy<E>>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>>;

    /// Entities matching `filter`, descending by `order_by`, windowed.
    ///
    /// Fails with `InvalidArgument` when `order_by` is `None`.
    async fn find_all_descending(
        &self,
        offset: usize,
        limit: usize,
        filter: Option<Filter<E>>,
        order_by: Option<OrderBy<E>>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>>;

    /// Number of entities matching `filter` (all if `None`).
    async fn count_all(&self, filter: Option<Filter<E>>) -> RepositoryResult<u64>;

    /// Stages `entity` for insertion.
    fn add(&self, entity: EntityHandle<E>) -> RepositoryResult<()>;

    /// Stages `entity` for removal.
    fn remove(&self, entity: EntityHandle<E>) -> RepositoryResult<()>;

    /// Stages `entity` as changed if its key is stored, otherwise as added.
    ///
    /// Returns the handle passed in, not the stored one.
    async fn attach(&self, entity: EntityHandle<E>) -> RepositoryResult<EntityHandle<E>>;
}

/// Storage-facing half of a repository.
///
/// A concrete store implements typed reads and the three persist primitives;
/// [`RepositoryBase`](super::RepositoryBase) layers staging on top. Every
/// store is a [`UnitOfWorkRepository`] through a blanket impl that recovers
/// the typed handle from the staged entity.
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    type Entity: AggregateRoot;

    /// Store name, for diagnostics.
    fn store_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    async fn find_by(
        &self,
        key: &<Self::Entity as AggregateRoot>::Key,
        sync_before_find: bool,
    ) -> RepositoryResult<Option<EntityHandle<Self::Entity>>>;

    async fn query(
        &self,
        filter: Option<Filter<Self::Entity>>,
        sort: Sort<Self::Entity>,
        page: Page,
    ) -> RepositoryResult<Vec<EntityHandle<Self::Entity>>>;

    async fn count(&self, filter: Option<Filter<Self::Entity>>) -> RepositoryResult<u64>;

    async fn persist_new(&self, item: EntityHandle<Self::Entity>) -> RepositoryResult<()>;

    async fn persist_updated(&self, item: EntityHandle<Self::Entity>) -> RepositoryResult<()>;

    async fn persist_deleted(&self, item: EntityHandle<Self::Entity>) -> RepositoryResult<()>;
}

fn typed<E: AggregateRoot>(item: &StagedEntity) -> RepositoryResult<EntityHandle<E>> {
    EntityHandle::from_staged(item.as_ref()).ok_or_else(|| {
        RepositoryError::invalid_argument(
            "item",
            format!(
                "expected {}, got {}",
                std::any::type_name::<E>(),
                item.entity_type()
            ),
        )
    })
}

#[async_trait]
impl<S: EntityStore> UnitOfWorkRepository for S {
    fn name(&self) -> String {
        self.store_name()
    }

    async fn persist_new_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        let item = typed::<S::Entity>(item)?;
        self.persist_new(item).await
    }

    async fn persist_updated_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        let item = typed::<S::Entity>(item)?;
        self.persist_updated(item).await
    }

    async fn persist_deleted_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        let item = typed::<S::Entity>(item)?;
        self.persist_deleted(item).await
    }
}
