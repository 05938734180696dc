//! SQLite-backed user repository

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User, UserChanges};

/// User repository over a SQLite pool
///
/// Writers take `write_lock` and then open a transaction, so the uniqueness
/// or existence check and the mutation it guards are never interleaved with
/// another writer.
#[derive(Clone)]
pub struct SqlUserRepository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqlUserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn email_owner(
        tx: &mut Transaction<'_, Sqlite>,
        email: &str,
    ) -> Result<Option<i64>, RepositoryError> {
        let owner = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(owner)
    }

    async fn exists(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<bool, RepositoryError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        Ok(found.is_some())
    }
}

#[async_trait]
impl UserStore for SqlUserRepository {
    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        debug!("Finding user by ID: {}", id);

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        if Self::email_owner(&mut tx, &new_user.email).await?.is_some() {
            return Err(RepositoryError::DuplicateEmail);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.created_at)
        .bind(new_user.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Inserted user {}", user.id);
        Ok(user)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        if !Self::exists(&mut tx, id).await? {
            return Err(RepositoryError::NotFound(id));
        }

        match Self::email_owner(&mut tx, &changes.email).await? {
            Some(owner) if owner != id => return Err(RepositoryError::DuplicateEmail),
            _ => {}
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1, email = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, name, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(changes.updated_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Updated user {}", id);
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }

        tx.commit().await?;

        info!("Deleted user {}", id);
        Ok(())
    }
}
