//! Shared fixtures for unit and integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use stowage_core::{AggregateRoot, EntityHandle, Key, RepositoryError, RepositoryResult, StagedEntity};

use crate::unit_of_work::UnitOfWorkRepository;

/// String-keyed aggregate.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub key: Key<String>,
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            key: Key::Unassigned,
            name: name.to_string(),
        }
    }

    pub fn with_key(key: &str, name: &str) -> Self {
        Self {
            key: Key::new(key.to_string()),
            name: name.to_string(),
        }
    }
}

impl AggregateRoot for User {
    type Key = String;

    fn key(&self) -> &Key<String> {
        &self.key
    }

    fn set_key(&mut self, key: Key<String>) {
        self.key = key;
    }
}

/// Integer-keyed aggregate.
#[derive(Debug, Clone, Default)]
pub struct Order {
    pub id: Key<u64>,
    pub total: i64,
}

impl Order {
    pub fn new(total: i64) -> Self {
        Self {
            id: Key::Unassigned,
            total,
        }
    }
}

impl AggregateRoot for Order {
    type Key = u64;

    fn key(&self) -> &Key<u64> {
        &self.id
    }

    fn set_key(&mut self, key: Key<u64>) {
        self.id = key;
    }
}

pub fn user(key: &str, name: &str) -> EntityHandle<User> {
    EntityHandle::new(User::with_key(key, name))
}

pub fn name_of(handle: &EntityHandle<User>) -> String {
    handle.read().name.clone()
}

pub fn key_of(handle: &EntityHandle<User>) -> String {
    handle.key().value().cloned().unwrap_or_default()
}

/// Persist call observed by [`RecordingRepository`], with the entity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replayed {
    New(String),
    Updated(String),
    Deleted(String),
}

/// Records persist calls in order; optionally rejects one key on insert.
#[derive(Debug, Default)]
pub struct RecordingRepository {
    calls: Mutex<Vec<Replayed>>,
    reject_new: Option<String>,
}

impl RecordingRepository {
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(key: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::default(),
            reject_new: Some(key.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<Replayed> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Replayed) {
        self.calls.lock().unwrap().push(call);
    }

    fn key(item: &StagedEntity) -> String {
        EntityHandle::<User>::from_staged(item.as_ref())
            .map(|u| key_of(&u))
            .unwrap_or_default()
    }
}

#[async_trait]
impl UnitOfWorkRepository for RecordingRepository {
    fn name(&self) -> String {
        "recording".to_string()
    }

    async fn persist_new_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        let key = Self::key(item);
        self.record(Replayed::New(key.clone()));
        if self.reject_new.as_ref() == Some(&key) {
            return Err(RepositoryError::duplicate_key(key));
        }
        Ok(())
    }

    async fn persist_updated_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        self.record(Replayed::Updated(Self::key(item)));
        Ok(())
    }

    async fn persist_deleted_item(&self, item: &StagedEntity) -> RepositoryResult<()> {
        self.record(Replayed::Deleted(Self::key(item)));
        Ok(())
    }
}
