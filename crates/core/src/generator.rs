//! Key generation for entities persisted without a key.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::entity::AggregateRoot;

/// Produces a key for an entity whose key is unassigned.
///
/// Invoked only at persist time, and only when the entity has no key.
pub type KeyGenerator<E> = Arc<dyn Fn(&E) -> <E as AggregateRoot>::Key + Send + Sync>;

/// Fresh UUIDv7 rendered as a string (time-ordered).
pub fn uuid_string<E>(_entity: &E) -> String {
    Uuid::now_v7().to_string()
}

/// Monotonic integer keys, starting at 1.
///
/// Share one instance between repositories that need a common key space.
#[derive(Debug, Default)]
pub struct Sequence {
    last: AtomicU64,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts after `last`, e.g. the highest key already in a seeded store.
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Wraps the sequence as a generator for any `u64`-keyed entity.
    pub fn generator<E>(self: Arc<Self>) -> KeyGenerator<E>
    where
        E: AggregateRoot<Key = u64>,
    {
        Arc::new(move |_entity: &E| self.next())
    }
}
