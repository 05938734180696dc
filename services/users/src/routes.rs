//! Users service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    auth::{Principal, auth_middleware},
    error::{ApiError, ApiResult},
    models::{CreateUserRequest, UpdateUserRequest, UserResponse},
    state::AppState,
};

/// Create the router for the users service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let healthy = common::database::health_check(&state.db_pool)
        .await
        .map_err(|e| {
            error!("Health check failed: {}", e);
            ApiError::ServiceUnavailable
        })?;

    if !healthy {
        return Err(ApiError::ServiceUnavailable);
    }

    Ok(Json(json!({ "status": "ok" })))
}

/// List all users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    info!("{} listing users", principal.username);

    let users: Vec<UserResponse> = state
        .user_service
        .list()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

/// Get a user by ID
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let user = state.user_service.get(id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Create a new user
pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateUserRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    info!("{} creating user {}", principal.username, payload.email);

    let user = state
        .user_service
        .create(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}

/// Overwrite a user's name and email
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    info!("{} updating user {}", principal.username, id);

    let user = state
        .user_service
        .update(id, &payload.name, &payload.email)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user by ID
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    info!("{} deleting user {}", principal.username, id);

    state.user_service.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
