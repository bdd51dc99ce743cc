use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use stowage_core::{AggregateRoot, EntityHandle, Key, KeyGenerator, RepositoryError, RepositoryResult};

use super::base::RepositoryBase;
use super::r#trait::EntityStore;
use crate::query::{self, Filter, Page, Sort};
use crate::unit_of_work::UnitOfWork;

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::storage("lock poisoned")
}

/// In-memory entity store.
///
/// Intended for tests/dev. Entities are kept in insertion order (an update
/// re-inserts at the end) and are unique by key. Reads work on a snapshot of
/// the collection, so a commit never mutates what a read is iterating.
pub struct MemoryStore<E: AggregateRoot> {
    entities: RwLock<Vec<EntityHandle<E>>>,
    create_new_key: KeyGenerator<E>,
}

impl<E: AggregateRoot> MemoryStore<E> {
    pub fn new(create_new_key: impl Fn(&E) -> E::Key + Send + Sync + 'static) -> Self {
        Self::with_generator(Arc::new(create_new_key))
    }

    pub fn with_generator(create_new_key: KeyGenerator<E>) -> Self {
        Self {
            entities: RwLock::new(Vec::new()),
            create_new_key,
        }
    }

    /// Number of stored entities.
    pub fn len(&self) -> RepositoryResult<usize> {
        Ok(self.entities.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.len()? == 0)
    }

    fn snapshot(&self) -> RepositoryResult<Vec<EntityHandle<E>>> {
        Ok(self.entities.read().map_err(poisoned)?.clone())
    }

    fn position(entities: &[EntityHandle<E>], key: &E::Key) -> Option<usize> {
        entities.iter().position(|e| e.read().key().matches(key))
    }
}

impl<E: AggregateRoot> core::fmt::Debug for MemoryStore<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entity", &std::any::type_name::<E>())
            .field("len", &self.len().ok())
            .finish()
    }
}

#[async_trait]
impl<E: AggregateRoot> EntityStore for MemoryStore<E> {
    type Entity = E;

    fn store_name(&self) -> String {
        format!("MemoryRepository<{}>", std::any::type_name::<E>())
    }

    // Nothing is buffered, so there is nothing to sync.
    async fn find_by(&self, key: &E::Key, _sync_before_find: bool) -> RepositoryResult<Option<EntityHandle<E>>> {
        let entities = self.snapshot()?;
        Ok(Self::position(&entities, key).map(|i| entities[i].clone()))
    }

    async fn query(
        &self,
        filter: Option<Filter<E>>,
        sort: Sort<E>,
        page: Page,
    ) -> RepositoryResult<Vec<EntityHandle<E>>> {
        let entities = self.snapshot()?;
        Ok(query::run(&entities, filter.as_ref(), &sort, page))
    }

    async fn count(&self, filter: Option<Filter<E>>) -> RepositoryResult<u64> {
        let entities = self.snapshot()?;
        Ok(query::count(&entities, filter.as_ref()) as u64)
    }

    async fn persist_new(&self, item: EntityHandle<E>) -> RepositoryResult<()> {
        let key = match item.key().normalized() {
            Key::Assigned(key) => key,
            Key::Unassigned => self.generate_key(&item)?,
        };

        let mut entities = self.entities.write().map_err(poisoned)?;
        Self::insert(&mut entities, item, key)
    }

    async fn persist_updated(&self, item: EntityHandle<E>) -> RepositoryResult<()> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let (index, key) = Self::locate(&entities, &item)?;

        let previous = entities.remove(index);
        if let Err(err) = Self::insert(&mut entities, item, key) {
            entities.insert(index, previous);
            return Err(err);
        }
        Ok(())
    }

    async fn persist_deleted(&self, item: EntityHandle<E>) -> RepositoryResult<()> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let (index, _) = Self::locate(&entities, &item)?;

        entities.remove(index);
        Ok(())
    }
}

impl<E: AggregateRoot> MemoryStore<E> {
    fn generate_key(&self, item: &EntityHandle<E>) -> RepositoryResult<E::Key> {
        let generated = (self.create_new_key)(&*item.read());
        match Key::new(generated) {
            Key::Assigned(key) => Ok(key),
            Key::Unassigned => Err(RepositoryError::invalid_argument(
                "create_new_key",
                "generator returned an unset key",
            )),
        }
    }

    /// Index and key of the stored entity sharing `item`'s key.
    fn locate(entities: &[EntityHandle<E>], item: &EntityHandle<E>) -> RepositoryResult<(usize, E::Key)> {
        match item.key().normalized() {
            Key::Assigned(key) => match Self::position(entities, &key) {
                Some(index) => Ok((index, key)),
                None => Err(RepositoryError::entity_not_found(key)),
            },
            unassigned => Err(RepositoryError::entity_not_found(unassigned)),
        }
    }

    fn insert(entities: &mut Vec<EntityHandle<E>>, item: EntityHandle<E>, key: E::Key) -> RepositoryResult<()> {
        if Self::position(entities, &key).is_some() {
            return Err(RepositoryError::duplicate_key(key));
        }

        item.write().set_key(Key::Assigned(key));
        entities.push(item);
        Ok(())
    }
}

/// Repository backed by a [`MemoryStore`].
pub type MemoryRepository<E> = RepositoryBase<MemoryStore<E>>;

impl<E: AggregateRoot> RepositoryBase<MemoryStore<E>> {
    /// Repository with no unit of work bound yet (see `set_unit_of_work`).
    pub fn new(create_new_key: impl Fn(&E) -> E::Key + Send + Sync + 'static) -> Self {
        Self::from_store(MemoryStore::new(create_new_key), None)
    }

    pub fn with_unit_of_work(
        unit_of_work: Arc<dyn UnitOfWork>,
        create_new_key: impl Fn(&E) -> E::Key + Send + Sync + 'static,
    ) -> Self {
        Self::from_store(MemoryStore::new(create_new_key), Some(unit_of_work))
    }
}
