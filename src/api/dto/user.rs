//! User-related DTOs for API requests and responses.
//!
//! These types are the wire contract for `/api/users` (representation
//! version 1). Every field is mapped to the domain model by hand.

use crate::models::{NewUser, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Version of the user representation served by this module.
pub const USER_REPRESENTATION_VERSION: &str = "1";

/// Response header carrying [`USER_REPRESENTATION_VERSION`].
pub const REPRESENTATION_VERSION_HEADER: &str = "x-representation-version";

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for creating or replacing a user.
///
/// Server-managed fields such as timestamps are ignored when present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Pins the identifier; the record under it is replaced if it exists
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl CreateUserRequest {
    /// Converts the request DTO into save data for the service layer.
    pub fn into_new_user(self) -> NewUser {
        NewUser {
            id: self.id,
            name: self.name,
            email: self.email,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response body for user data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// RFC 3339 creation time
    #[schema(format = DateTime)]
    pub created_at: String,
    /// RFC 3339 time of the last save
    #[schema(format = DateTime)]
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.to_string(),
            updated_at: user.updated_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use serde_json::json;

    #[test]
    fn test_partial_request_decodes() {
        let request: CreateUserRequest = serde_json::from_value(json!({ "name": "Alice" })).unwrap();
        let new_user = request.into_new_user();
        assert_eq!(new_user, NewUser::named("Alice"));
    }

    #[test]
    fn test_request_ignores_server_managed_fields() {
        let request: CreateUserRequest = serde_json::from_value(json!({
            "id": 7,
            "name": "Alice",
            "email": "alice@example.com",
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(
            request.into_new_user(),
            NewUser::named("Alice").with_email("alice@example.com").with_id(7)
        );
    }

    #[test]
    fn test_request_without_name_is_rejected() {
        let result = serde_json::from_value::<CreateUserRequest>(json!({ "email": "a@b.c" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_field_mapping() {
        let created_at: Timestamp = "2024-05-01T10:00:00Z".parse().unwrap();
        let updated_at: Timestamp = "2024-05-02T11:30:00Z".parse().unwrap();
        let user = User {
            id: 3,
            name: "Carol".to_string(),
            email: None,
            created_at,
            updated_at,
        };

        let value = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 3,
                "name": "Carol",
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-02T11:30:00Z"
            })
        );
    }
}
