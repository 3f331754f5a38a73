//! User request handlers.
//!
//! Each handler extracts its input, calls `UserService`, and maps the
//! result onto the v1 user representation.

use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode, header},
};
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    CreateUserRequest, ErrorResponse, REPRESENTATION_VERSION_HEADER, USER_REPRESENTATION_VERSION,
    UserResponse,
};
use crate::api::extract::{ApiJson, ApiPath};
use crate::error::{AppError, AppResult};
use crate::models::UserId;
use crate::services::UserService;
use crate::state::AppState;

/// Creates user-related routes.
///
/// Routes:
/// - POST /       - Create a user
/// - GET /{id}    - Get user by ID
pub fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(create_user))
        .routes(routes!(get_user))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(REPRESENTATION_VERSION_HEADER),
            HeaderValue::from_static(USER_REPRESENTATION_VERSION),
        ))
}

/// GET /api/users/{id} - Get user by ID
///
/// Returns the user with the specified ID or 404 if not found.
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = i64, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Identifier is not an integer", body = ErrorResponse),
        (status = 404, description = "No user with this identifier", body = ErrorResponse)
    )
)]
async fn get_user(
    State(users): State<UserService>,
    ApiPath(id): ApiPath<UserId>,
) -> AppResult<Json<UserResponse>> {
    let user = users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::user_not_found(id))?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/users - Create a user
///
/// Persists the user from the JSON request body.
/// Returns 201 Created with the stored user and its location.
#[utoipa::path(
    post,
    path = "/",
    tag = USER_TAG,
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User stored", body = UserResponse),
        (status = 400, description = "Malformed JSON", body = ErrorResponse),
        (status = 422, description = "Body does not match the user representation", body = ErrorResponse)
    )
)]
async fn create_user(
    State(users): State<UserService>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, [(HeaderName, String); 1], Json<UserResponse>)> {
    let user = users.save(payload.into_new_user()).await?;
    tracing::info!(user_id = user.id, "User stored");

    let location = format!("/api/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(UserResponse::from(user)),
    ))
}
