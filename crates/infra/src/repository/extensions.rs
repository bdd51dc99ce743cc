//! Convenience queries composed from the [`Repository`] primitives.

use async_trait::async_trait;

use stowage_core::{AggregateRoot, EntityHandle, RepositoryResult};

use super::r#trait::Repository;
use crate::query::{Filter, OrderBy};

/// Shorthand overloads over a [`Repository`].
///
/// Each method is a plain composition of `find_all*` and `count_all`; none adds
/// behavior of its own.
#[async_trait]
pub trait RepositoryExt<E: AggregateRoot>: Repository<E> {
    /// Every entity, key ascending.
    async fn find_all_entities(&self) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all(0, usize::MAX, None).await
    }

    async fn find_all_filtered(&self, filter: Filter<E>) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all(0, usize::MAX, Some(filter)).await
    }

    async fn find_all_paged(&self, offset: usize, limit: usize) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all(offset, limit, None).await
    }

    async fn find_all_ascending_by(&self, order_by: OrderBy<E>) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_ascending(0, usize::MAX, None, Some(order_by)).await
    }

    async fn find_all_ascending_filtered(
        &self,
        filter: Filter<E>,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_ascending(0, usize::MAX, Some(filter), Some(order_by))
            .await
    }

    async fn find_all_ascending_paged(
        &self,
        offset: usize,
        limit: usize,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_ascending(offset, limit, None, Some(order_by)).await
    }

    async fn find_all_descending_by(&self, order_by: OrderBy<E>) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_descending(0, usize::MAX, None, Some(order_by)).await
    }

    async fn find_all_descending_filtered(
        &self,
        filter: Filter<E>,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_descending(0, usize::MAX, Some(filter), Some(order_by))
            .await
    }

    async fn find_all_descending_paged(
        &self,
        offset: usize,
        limit: usize,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Vec<EntityHandle<E>>> {
        self.find_all_descending(offset, limit, None, Some(order_by)).await
    }

    async fn count_all_entities(&self) -> RepositoryResult<u64> {
        self.count_all(None).await
    }

    /// Entity with the lowest key.
    async fn find_first(&self) -> RepositoryResult<Option<EntityHandle<E>>> {
        Ok(self.find_all(0, 1, None).await?.into_iter().next())
    }

    /// Lowest-keyed entity matching `filter`.
    async fn find_first_matching(&self, filter: Filter<E>) -> RepositoryResult<Option<EntityHandle<E>>> {
        Ok(self.find_all(0, 1, Some(filter)).await?.into_iter().next())
    }

    async fn find_first_ascending(
        &self,
        filter: Option<Filter<E>>,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Option<EntityHandle<E>>> {
        Ok(self
            .find_all_ascending(0, 1, filter, Some(order_by))
            .await?
            .into_iter()
            .next())
    }

    async fn find_first_descending(
        &self,
        filter: Option<Filter<E>>,
        order_by: OrderBy<E>,
    ) -> RepositoryResult<Option<EntityHandle<E>>> {
        Ok(self
            .find_all_descending(0, 1, filter, Some(order_by))
            .await?
            .into_iter()
            .next())
    }

    /// Entity with the highest key: the last position of the key order.
    async fn find_last(&self) -> RepositoryResult<Option<EntityHandle<E>>> {
        let count = self.count_all(None).await?;
        if count == 0 {
            return Ok(None);
        }

        let last = usize::try_from(count - 1).unwrap_or(usize::MAX);
        Ok(self.find_all(last, 1, None).await?.into_iter().next())
    }
}

impl<E: AggregateRoot, R: Repository<E> + ?Sized> RepositoryExt<E> for R {}
