//! Credential verification

use std::collections::HashMap;

use async_trait::async_trait;
use common::{error::PasswordError, password::PasswordHashing};
use thiserror::Error;
use tracing::error;

/// An authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
}

/// Authentication failures
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Verification could not be carried out
    #[error("credential verification failed: {0}")]
    Internal(String),
}

/// Verifies a username/password pair
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Whether `username` names a configured principal
    fn is_known(&self, username: &str) -> bool;

    async fn verify(&self, username: &str, password: &str) -> Result<Principal, AuthError>;
}

/// Fixed set of principals whose passwords are hashed at startup
#[derive(Debug, Clone)]
pub struct StaticAuthProvider {
    hashing: PasswordHashing,
    principals: HashMap<String, String>,
    dummy_hash: String,
}

impl StaticAuthProvider {
    /// Hash every `(username, password)` pair with `hashing`
    pub fn new<'a, I>(hashing: PasswordHashing, principals: I) -> Result<Self, PasswordError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let principals = principals
            .into_iter()
            .map(|(username, password)| {
                Ok::<_, PasswordError>((username.to_string(), hashing.hash(password)?))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        // Unknown usernames are checked against this so they cost the same
        // as a wrong password.
        let dummy_hash = hashing.hash("unknown-principal")?;

        Ok(Self {
            hashing,
            principals,
            dummy_hash,
        })
    }

    /// Configured usernames, sorted
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.principals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[async_trait]
impl AuthProvider for StaticAuthProvider {
    fn is_known(&self, username: &str) -> bool {
        self.principals.contains_key(username)
    }

    async fn verify(&self, username: &str, password: &str) -> Result<Principal, AuthError> {
        let known = self.principals.get(username);
        let hash = known.unwrap_or(&self.dummy_hash).clone();
        let hashing = self.hashing.clone();
        let password = password.to_string();

        let matches = tokio::task::spawn_blocking(move || hashing.verify(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .map_err(|e| {
                error!("Failed to verify credentials: {}", e);
                AuthError::Internal(e.to_string())
            })?;

        if matches && known.is_some() {
            Ok(Principal {
                username: username.to_string(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::password::PasswordConfig;

    fn provider() -> StaticAuthProvider {
        let hashing = PasswordHashing::new(&PasswordConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        StaticAuthProvider::new(hashing, [("user", "password"), ("admin", "admin")]).unwrap()
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let provider = provider();

        let principal = provider.verify("admin", "admin").await.unwrap();
        assert_eq!(principal.username, "admin");

        let principal = provider.verify("user", "password").await.unwrap();
        assert_eq!(principal.username, "user");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() {
        let provider = provider();

        assert!(matches!(
            provider.verify("admin", "password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            provider.verify("mallory", "unknown-principal").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            provider.verify("", "").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_passwords_are_not_kept_in_plaintext() {
        let provider = provider();

        assert_eq!(provider.usernames(), vec!["admin", "user"]);
        assert!(provider.is_known("admin"));
        assert!(!provider.is_known("mallory"));
        for hash in provider.principals.values() {
            assert!(hash.starts_with("$argon2id$"));
        }
    }
}
