//! Process-local user storage.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff::Timestamp;

use super::UserRepository;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User, UserId};

/// User repository backed by a concurrent map.
///
/// Identifiers are handed out from a monotonically increasing sequence
/// starting at 1. Saving under an explicit id moves the sequence past it
/// so later assignments never collide. Once `i64::MAX` has been used,
/// saves without an id fail instead of wrapping.
#[derive(Debug)]
pub struct InMemoryUserRepository {
    users: DashMap<UserId, User>,
    /// Highest id assigned or pinned so far, 0 before the first save.
    last_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            last_id: AtomicI64::new(0),
        }
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn next_id(&self) -> AppResult<UserId> {
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| AppError::Database {
                operation: "assign user id".to_string(),
                source: anyhow::anyhow!("user id sequence exhausted"),
            })
    }

    fn insert_with_fresh_id(&self, user: NewUser, now: Timestamp) -> AppResult<User> {
        loop {
            let id = self.next_id()?;
            // A concurrent pinned save may have claimed the id first.
            if let Entry::Vacant(slot) = self.users.entry(id) {
                let stored = User {
                    id,
                    name: user.name,
                    email: user.email,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(stored.clone());
                return Ok(stored);
            }
        }
    }

    fn upsert(&self, id: UserId, user: NewUser, now: Timestamp) -> User {
        self.last_id.fetch_max(id, Ordering::SeqCst);

        match self.users.entry(id) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                stored.name = user.name;
                stored.email = user.email;
                stored.updated_at = now;
                stored.clone()
            }
            Entry::Vacant(slot) => {
                let stored = User {
                    id,
                    name: user.name,
                    email: user.email,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(stored.clone());
                stored
            }
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn save(&self, user: NewUser) -> AppResult<User> {
        let now = Timestamp::now();
        let stored = match user.id {
            Some(id) => self.upsert(id, user, now),
            None => self.insert_with_fresh_id(user, now)?,
        };
        tracing::debug!(user_id = stored.id, "User saved in memory");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.save(NewUser::named("Alice")).await.unwrap();
        let second = repo.save(NewUser::named("Bob")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_find_missing_user_returns_none() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.find_by_id(42).await.unwrap().is_none());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_save_with_explicit_id_replaces_record() {
        let repo = InMemoryUserRepository::new();
        let created = repo
            .save(NewUser::named("Alice").with_email("alice@example.com"))
            .await
            .unwrap();

        let replaced = repo
            .save(NewUser::named("Alicia").with_id(created.id))
            .await
            .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "Alicia");
        assert_eq!(replaced.email, None);
        assert_eq!(replaced.created_at, created.created_at);
        assert!(replaced.updated_at >= created.updated_at);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_id_advances_sequence() {
        let repo = InMemoryUserRepository::new();
        repo.save(NewUser::named("Pinned").with_id(10)).await.unwrap();

        let next = repo.save(NewUser::named("Fresh")).await.unwrap();
        assert_eq!(next.id, 11);
    }

    #[tokio::test]
    async fn test_explicit_id_at_max_exhausts_sequence() {
        let repo = InMemoryUserRepository::new();
        let saved = repo
            .save(NewUser::named("Edge").with_id(i64::MAX))
            .await
            .unwrap();
        assert_eq!(saved.id, i64::MAX);

        for _ in 0..2 {
            let error = repo.save(NewUser::named("Fresh")).await.unwrap_err();
            assert!(matches!(error, AppError::Database { .. }));
        }
        assert_eq!(repo.len(), 1);

        // Pinned saves still work once fresh ids run out.
        let replaced = repo
            .save(NewUser::named("Edge again").with_id(i64::MAX))
            .await
            .unwrap();
        assert_eq!(replaced.name, "Edge again");
    }

    #[tokio::test]
    async fn test_non_positive_explicit_id_leaves_sequence_alone() {
        let repo = InMemoryUserRepository::new();
        let pinned = repo.save(NewUser::named("Neg").with_id(-5)).await.unwrap();
        assert_eq!(pinned.id, -5);
        assert!(repo.find_by_id(-5).await.unwrap().is_some());

        let fresh = repo.save(NewUser::named("Fresh")).await.unwrap();
        assert_eq!(fresh.id, 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ids() {
        let repo = Arc::new(InMemoryUserRepository::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.save(NewUser::named(format!("user-{i}"))).await })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            let user = handle.await.unwrap().unwrap();
            assert!(ids.insert(user.id));
        }
        assert_eq!(repo.len(), 32);
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #[test]
        fn prop_saved_user_round_trips(name in "[a-zA-Z ]{1,40}", email in proptest::option::of("[a-z]{1,10}@[a-z]{1,10}\\.com")) {
            let repo = InMemoryUserRepository::new();
            let new_user = NewUser { id: None, name: name.clone(), email: email.clone() };

            let (saved, found) = block_on(async {
                let saved = repo.save(new_user).await.unwrap();
                let found = repo.find_by_id(saved.id).await.unwrap();
                (saved, found)
            });

            prop_assert_eq!(found.as_ref(), Some(&saved));
            prop_assert_eq!(saved.name, name);
            prop_assert_eq!(saved.email, email);
        }

        #[test]
        fn prop_creates_yield_distinct_ids(names in proptest::collection::vec("[a-z]{1,12}", 1..20)) {
            let repo = InMemoryUserRepository::new();
            let count = names.len();

            let ids: HashSet<UserId> = block_on(async {
                let mut ids = HashSet::new();
                for name in names {
                    ids.insert(repo.save(NewUser::named(name)).await.unwrap().id);
                }
                ids
            });

            prop_assert_eq!(ids.len(), count);
        }
    }
}
