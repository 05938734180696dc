//! Application state shared across handlers

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    auth::{AuthProvider, LoginGuard},
    service::UserService,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub user_service: UserService,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub login_guard: LoginGuard,
}
