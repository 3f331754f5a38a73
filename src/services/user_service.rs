//! User service sitting between the HTTP handlers and the repository.
//!
//! Both operations forward to the repository unchanged; this is the
//! seam where business rules would be added.

use std::sync::Arc;

use crate::error::AppResult;
use crate::models::{NewUser, User, UserId};
use crate::repositories::UserRepository;

/// User service for handling user-related operations.
///
/// Holds the repository behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Creates a new UserService with the given repository.
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Looks up a user by id.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        self.repo.find_by_id(id).await
    }

    /// Saves a user.
    ///
    /// # Returns
    /// The stored user, with its id assigned when none was given
    pub async fn save(&self, user: NewUser) -> AppResult<User> {
        self.repo.save(user).await
    }
}
