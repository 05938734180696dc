//! User service: validation, password hashing and storage orchestration

use std::sync::Arc;

use chrono::Utc;
use common::password::PasswordHashing;
use tracing::info;

use crate::{
    error::{ServiceError, ServiceResult},
    models::{NewUser, User, UserChanges},
    repositories::UserStore,
    validation::{validate_email, validate_name, validate_password},
};

/// CRUD operations over users
///
/// Input is validated before the store is touched; the store owns
/// uniqueness and existence checks.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hashing: PasswordHashing,
}

impl UserService {
    /// Create a new user service over a store
    pub fn new(store: Arc<dyn UserStore>, hashing: PasswordHashing) -> Self {
        Self { store, hashing }
    }

    /// All users
    pub async fn list(&self) -> ServiceResult<Vec<User>> {
        Ok(self.store.list().await?)
    }

    /// A single user
    pub async fn get(&self, id: i64) -> ServiceResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Register a new user
    pub async fn create(&self, name: &str, email: &str, password: &str) -> ServiceResult<User> {
        let name = validate_name(name).map_err(ServiceError::Validation)?;
        let email = validate_email(email).map_err(ServiceError::Validation)?;
        validate_password(password).map_err(ServiceError::Validation)?;

        info!("Creating new user: {}", email);

        let hashing = self.hashing.clone();
        let password = password.to_string();
        let password_hash =
            tokio::task::spawn_blocking(move || hashing.hash(&password)).await??;

        let new_user = NewUser {
            name,
            email,
            password_hash,
            created_at: Utc::now(),
        };

        Ok(self.store.insert(&new_user).await?)
    }

    /// Overwrite a user's name and email
    pub async fn update(&self, id: i64, name: &str, email: &str) -> ServiceResult<User> {
        let name = validate_name(name).map_err(ServiceError::Validation)?;
        let email = validate_email(email).map_err(ServiceError::Validation)?;

        info!("Updating user {}", id);

        let changes = UserChanges {
            name,
            email,
            updated_at: Utc::now(),
        };

        Ok(self.store.update(id, &changes).await?)
    }

    /// Remove a user
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        info!("Deleting user {}", id);
        Ok(self.store.delete(id).await?)
    }
}
