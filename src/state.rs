//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use axum::extract::FromRef;

use crate::repositories::Repositories;
use crate::services::{Services, UserService};

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since services and repositories hold `Arc` handles.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the repositories, used by health checks
    pub repositories: Repositories,
}

impl AppState {
    /// Creates a new AppState, wiring services on top of the given repositories.
    ///
    /// # Example
    /// ```ignore
    /// let state = AppState::new(Repositories::in_memory());
    /// ```
    pub fn new(repositories: Repositories) -> Self {
        let services = Services::new(repositories.clone());
        Self {
            services,
            repositories,
        }
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.services.users.clone()
    }
}
