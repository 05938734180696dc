//! Integration tests for the infrastructure components
//!
//! These tests verify that the embedded database and the password hasher
//! work together the way the services use them.

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    password::{PasswordConfig, PasswordHashing},
};
use sqlx::Row;

/// Store a hash in SQLite, read it back and verify it
#[tokio::test]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i64 = row.get("result");
    assert_eq!(result, 1, "SQLite simple query test failed");

    sqlx::query("CREATE TABLE credentials (name TEXT PRIMARY KEY, hash TEXT NOT NULL)")
        .execute(&pool)
        .await?;

    let hashing = PasswordHashing::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })?;
    let hash = hashing.hash("integration_test_value")?;

    sqlx::query("INSERT INTO credentials (name, hash) VALUES ($1, $2)")
        .bind("integration_test_key")
        .bind(&hash)
        .execute(&pool)
        .await?;

    let stored: String = sqlx::query_scalar("SELECT hash FROM credentials WHERE name = $1")
        .bind("integration_test_key")
        .fetch_one(&pool)
        .await?;

    assert!(hashing.verify("integration_test_value", &stored)?);
    assert!(!hashing.verify("wrong_value", &stored)?);

    Ok(())
}

/// A duplicate primary key surfaces as a unique violation
#[tokio::test]
async fn test_unique_violation_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;

    sqlx::query("CREATE TABLE emails (email TEXT NOT NULL UNIQUE)")
        .execute(&pool)
        .await?;
    sqlx::query("INSERT INTO emails (email) VALUES ('a@example.com')")
        .execute(&pool)
        .await?;

    let err = sqlx::query("INSERT INTO emails (email) VALUES ('a@example.com')")
        .execute(&pool)
        .await
        .expect_err("duplicate insert must fail");

    let err = common::error::DatabaseError::Query(err);
    assert!(err.is_unique_violation());

    Ok(())
}
