//! End-to-end tests: two repositories sharing one unit of work.
//!
//! Verifies:
//! - Commit replays removals, then additions, then changes, whatever the
//!   registration order
//! - Rollback leaves every store untouched
//! - A failed commit keeps the phases already applied and clears the rest
//! - `attach` chooses between insert and update by stored key

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use stowage_core::generator::uuid_string;
    use stowage_core::{EntityHandle, Key, RepositoryError, Sequence};

    use crate::query::OrderBy;
    use crate::repository::{MemoryRepository, MemoryStore, Repository, RepositoryExt};
    use crate::test_support::{Order, User, key_of, name_of, user};
    use crate::unit_of_work::{EntityState, MemoryUnitOfWork, UnitOfWork};

    struct Session {
        uow: Arc<MemoryUnitOfWork>,
        users: MemoryRepository<User>,
        orders: MemoryRepository<Order>,
    }

    fn session() -> Session {
        stowage_observability::init_for_tests();

        let uow = MemoryUnitOfWork::arc();
        let users = MemoryRepository::with_unit_of_work(uow.clone(), uuid_string);
        let orders = MemoryRepository::from_store(
            MemoryStore::with_generator(Arc::new(Sequence::new()).generator()),
            Some(uow.clone() as Arc<dyn UnitOfWork>),
        );
        Session { uow, users, orders }
    }

    async fn seeded() -> Session {
        let s = session();
        s.users.add(user("a", "Ada")).unwrap();
        s.users.add(user("c", "Cy")).unwrap();
        s.orders.add(EntityHandle::new(Order::new(100))).unwrap();
        s.uow.commit().await.unwrap();
        s
    }

    async fn user_keys(s: &Session) -> Vec<String> {
        let all = s.users.find_all(0, usize::MAX, None).await.unwrap();
        all.iter().map(key_of).collect()
    }

    async fn stored_names(s: &Session) -> Vec<String> {
        let all = s
            .users
            .find_all_ascending_by(OrderBy::new(|u: &User| u.name.clone()))
            .await
            .unwrap();
        all.iter().map(name_of).collect()
    }

    #[tokio::test]
    async fn removal_frees_a_key_for_an_addition_in_the_same_commit() {
        let s = seeded().await;
        let stored_a = s.users.find_by(&"a".to_string(), true).await.unwrap().unwrap();

        // Registered before the removal that makes room for it.
        s.users.add(user("a", "Ada II")).unwrap();
        s.orders.add(EntityHandle::new(Order::new(250))).unwrap();
        s.users.remove(stored_a).unwrap();
        let cy = s.users.find_by(&"c".to_string(), true).await.unwrap().unwrap();
        cy.write().name = "Cyrus".to_string();
        s.users.attach(cy).await.unwrap();

        s.uow.commit().await.unwrap();

        assert_eq!(stored_names(&s).await, vec!["Ada II", "Cyrus"]);
        let orders = s.orders.find_all(0, usize::MAX, None).await.unwrap();
        let totals: Vec<i64> = orders.iter().map(|o| o.read().total).collect();
        assert_eq!(totals, vec![100, 250]);
        assert_eq!(s.uow.pending_count(), 0);
    }

    #[tokio::test]
    async fn rollback_leaves_every_store_untouched() {
        let s = seeded().await;
        let before = user_keys(&s).await;

        s.users.add(user("b", "Bo")).unwrap();
        s.users.remove(user("a", "Ada")).unwrap();
        s.orders.add(EntityHandle::new(Order::new(7))).unwrap();
        s.uow.rollback();
        s.uow.commit().await.unwrap();

        assert_eq!(user_keys(&s).await, before);
        assert_eq!(s.orders.count_all(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_commit_keeps_applied_phases() {
        let s = seeded().await;

        s.users.attach(user("c", "Cyrus")).await.unwrap();
        s.orders
            .add(EntityHandle::new(Order {
                id: Key::new(1),
                total: 5,
            }))
            .unwrap();
        s.users.remove(user("a", "Ada")).unwrap();

        let err = s.uow.commit().await.unwrap_err();
        assert_eq!(err, RepositoryError::duplicate_key(1_u64));

        // Removal ran, the change after the failing addition did not.
        assert_eq!(stored_names(&s).await, vec!["Cy"]);
        assert_eq!(s.uow.pending_count(), 0);

        s.uow.commit().await.unwrap();
        assert_eq!(stored_names(&s).await, vec!["Cy"]);
    }

    #[tokio::test]
    async fn attach_without_key_inserts_with_a_generated_one() {
        let s = session();
        let handle = s.users.attach(EntityHandle::new(User::named("Nia"))).await.unwrap();

        assert_eq!(s.uow.pending().len(), 1);
        assert_eq!(s.uow.pending()[0].state(), EntityState::Added);

        s.uow.commit().await.unwrap();

        let key = key_of(&handle);
        assert!(!key.is_empty());
        let found = s.users.find_by(&key, true).await.unwrap().unwrap();
        assert!(found.ptr_eq(&handle));

        let wanted = key.clone();
        let matching = s
            .users
            .find_all_filtered(crate::query::Filter::new(move |u: &User| u.key.matches(&wanted)))
            .await
            .unwrap();
        assert_eq!(matching.len(), 1);
    }

    #[tokio::test]
    async fn staged_entities_are_visible_through_get_before_commit() {
        let s = seeded().await;
        let extra = EntityHandle::new(Order {
            id: Key::new(42),
            total: 9,
        });

        s.orders.add(extra.clone()).unwrap();
        s.users.remove(user("c", "Cy")).unwrap();

        let staged_order = s.uow.get(&42_u64).unwrap();
        assert_eq!(staged_order.state, EntityState::Added);
        assert!(staged_order.entity_as::<Order>().unwrap().ptr_eq(&extra));

        let staged_user = s.uow.get(&Key::new("c".to_string())).unwrap();
        assert_eq!(staged_user.state, EntityState::Removed);
        assert!(staged_user.entity_as::<Order>().is_none());

        assert!(s.uow.get(&"a".to_string()).is_none());
        assert!(s.orders.find_by(&42, false).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repositories_can_be_rebound_to_another_unit_of_work() {
        stowage_observability::init_for_tests();
        let users: MemoryRepository<User> = MemoryRepository::new(uuid_string);

        let err = users.add(user("a", "Ada")).unwrap_err();
        assert!(matches!(err, RepositoryError::MissingUnitOfWork { .. }));

        let first = MemoryUnitOfWork::arc();
        let second = MemoryUnitOfWork::arc();
        users.set_unit_of_work(first.clone());
        users.add(user("a", "Ada")).unwrap();
        users.set_unit_of_work(second.clone());
        users.add(user("b", "Bo")).unwrap();

        assert_eq!(first.pending_count(), 1);
        assert_eq!(second.pending_count(), 1);

        second.commit().await.unwrap();
        assert_eq!(users.find_last().await.unwrap().map(|u| key_of(&u)), Some("b".to_string()));
        assert_eq!(users.count_all(None).await.unwrap(), 1);
    }
}
