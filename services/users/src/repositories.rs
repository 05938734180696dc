//! Repositories for database operations

use async_trait::async_trait;
use common::error::DatabaseError;
use thiserror::Error;

use crate::models::{NewUser, User, UserChanges};

pub mod user;

pub use user::SqlUserRepository;

/// Errors reported by a user store
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Another record already owns the email
    #[error("email already in use")]
    DuplicateEmail,

    /// No record with the requested id
    #[error("user {0} not found")]
    NotFound(i64),

    /// Underlying storage failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        let e = DatabaseError::Query(e);
        if e.is_unique_violation() {
            RepositoryError::DuplicateEmail
        } else {
            RepositoryError::Database(e)
        }
    }
}

/// Storage abstraction behind the user service
///
/// Implementations must run `insert`, `update` and `delete` as a single
/// atomic check-and-mutate step.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users ordered by id
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Look up a user by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    /// Insert a user, failing with `DuplicateEmail` if the email is taken
    async fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError>;

    /// Overwrite name and email of an existing user
    async fn update(&self, id: i64, changes: &UserChanges) -> Result<User, RepositoryError>;

    /// Remove a user
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}
