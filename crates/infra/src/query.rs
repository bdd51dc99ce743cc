//! Query engine: filter → order → window over a sequence of entities.
//!
//! Pure functions over entity handles; stores call into this with a snapshot
//! of their backing collection.

use std::cmp::Ordering;
use std::sync::Arc;

use stowage_core::{AggregateRoot, EntityHandle};

/// Entity predicate.
pub struct Filter<E>(Arc<dyn Fn(&E) -> bool + Send + Sync>);

impl<E> Filter<E> {
    pub fn new(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Matches every entity.
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    pub fn matches(&self, entity: &E) -> bool {
        (self.0)(entity)
    }
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> core::fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Filter(..)")
    }
}

/// Sort key extractor, erased to a comparator.
pub struct OrderBy<E>(Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>);

impl<E> OrderBy<E> {
    /// Orders entities by the value `key` extracts from them.
    pub fn new<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&E) -> K + Send + Sync + 'static,
    {
        Self(Arc::new(move |a: &E, b: &E| key(a).cmp(&key(b))))
    }

    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        (self.0)(a, b)
    }
}

impl<E> Clone for OrderBy<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> core::fmt::Debug for OrderBy<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("OrderBy(..)")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering applied before the page window.
#[derive(Debug, Clone)]
pub enum Sort<E> {
    /// Entity key, ascending. The default total order of a repository.
    ByKey,
    By(OrderBy<E>, Direction),
}

/// Offset/limit window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    /// Number of matching entities to skip.
    pub offset: usize,
    /// Maximum number of entities to return.
    pub limit: usize,
}

impl Page {
    /// Everything.
    pub const ALL: Page = Page {
        offset: 0,
        limit: usize::MAX,
    };

    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::ALL
    }
}

/// Runs a query: keep entities matching `filter` (all if `None`), stable-sort
/// them, then skip `page.offset` and take `page.limit`.
///
/// Ties keep the order of `entities`.
pub fn run<E: AggregateRoot>(
    entities: &[EntityHandle<E>],
    filter: Option<&Filter<E>>,
    sort: &Sort<E>,
    page: Page,
) -> Vec<EntityHandle<E>> {
    let matched: Vec<EntityHandle<E>> = entities
        .iter()
        .filter(|h| filter.is_none_or(|f| f.matches(&h.read())))
        .cloned()
        .collect();

    let mut order: Vec<usize> = (0..matched.len()).collect();
    {
        // One read guard per entity for the whole sort.
        let views: Vec<_> = matched.iter().map(EntityHandle::read).collect();
        match sort {
            Sort::ByKey => order.sort_by(|&a, &b| views[a].key().cmp(views[b].key())),
            Sort::By(order_by, Direction::Ascending) => {
                order.sort_by(|&a, &b| order_by.compare(&views[a], &views[b]))
            }
            Sort::By(order_by, Direction::Descending) => {
                order.sort_by(|&a, &b| order_by.compare(&views[b], &views[a]))
            }
        }
    }

    order
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .map(|i| matched[i].clone())
        .collect()
}

/// Number of entities matching `filter` (all if `None`).
pub fn count<E>(entities: &[EntityHandle<E>], filter: Option<&Filter<E>>) -> usize {
    match filter {
        None => entities.len(),
        Some(f) => entities.iter().filter(|h| f.matches(&h.read())).count(),
    }
}
