//! Aggregate entities: identity by key, shared through handles.

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::key::{Key, KeyValue};

/// Aggregate root marker + minimal interface.
///
/// The key is mutable: an entity may be created without one and receive it
/// when its repository persists it.
pub trait AggregateRoot: Send + Sync + 'static {
    /// Value type of the entity key.
    type Key: KeyValue;

    /// Returns the entity key.
    fn key(&self) -> &Key<Self::Key>;

    /// Replaces the entity key.
    fn set_key(&mut self, key: Key<Self::Key>);
}

/// Shared, mutable handle to an entity.
///
/// Units of work and stores keep handles rather than owning the entity, so a
/// key assigned at commit time is visible through every clone.
pub struct EntityHandle<E>(Arc<RwLock<E>>);

impl<E> EntityHandle<E> {
    pub fn new(entity: E) -> Self {
        Self(Arc::new(RwLock::new(entity)))
    }

    /// Read access. A poisoned lock is recovered: entities are plain state.
    pub fn read(&self) -> RwLockReadGuard<'_, E> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, E> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles point at the same entity object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<E: AggregateRoot> EntityHandle<E> {
    /// Snapshot of the current key.
    pub fn key(&self) -> Key<E::Key> {
        self.read().key().clone()
    }

    /// Type-erased view for staging in a unit of work.
    pub fn staged(&self) -> StagedEntity {
        Arc::new(self.clone())
    }

    /// Recovers a typed handle from a staged entity, if it holds an `E`.
    pub fn from_staged(staged: &dyn TrackedEntity) -> Option<Self> {
        staged.as_any().downcast_ref::<Self>().cloned()
    }
}

impl<E> Clone for EntityHandle<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> From<E> for EntityHandle<E> {
    fn from(entity: E) -> Self {
        Self::new(entity)
    }
}

impl<E: core::fmt::Debug> core::fmt::Debug for EntityHandle<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("EntityHandle").field(&*self.read()).finish()
    }
}

/// Type-erased entity, as seen by a unit of work spanning several repositories.
pub trait TrackedEntity: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;

    /// True when the entity's assigned key equals `key`.
    ///
    /// `key` may be a raw key value (`E::Key`) or a `Key<E::Key>`; keys of any
    /// other type never match.
    fn has_key(&self, key: &dyn Any) -> bool;

    /// Rust type name of the entity, for diagnostics.
    fn entity_type(&self) -> &'static str;

    /// Debug rendering of the current key, for diagnostics.
    fn describe_key(&self) -> String;
}

/// Entity staged in a unit of work.
pub type StagedEntity = Arc<dyn TrackedEntity>;

impl<E: AggregateRoot> TrackedEntity for EntityHandle<E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn has_key(&self, key: &dyn Any) -> bool {
        let wanted = if let Some(value) = key.downcast_ref::<E::Key>() {
            Some(value)
        } else {
            key.downcast_ref::<Key<E::Key>>().and_then(Key::value)
        };

        wanted.is_some_and(|value| self.read().key().matches(value))
    }

    fn entity_type(&self) -> &'static str {
        std::any::type_name::<E>()
    }

    fn describe_key(&self) -> String {
        format!("{:?}", self.read().key())
    }
}
