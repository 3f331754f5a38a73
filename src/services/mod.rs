//! Service layer for business logic operations.
//!
//! Services sit between the HTTP handlers and the repositories.

mod user_service;

pub use user_service::UserService;

use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since services only hold `Arc` handles.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories) -> Self {
        Self {
            users: UserService::new(repos.users),
        }
    }
}
