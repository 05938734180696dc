//! Service configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `config/users.{toml,yaml,json}` file, then `USERS_`-prefixed environment
//! variables using `__` between nested keys (`USERS_SERVER__PORT=8080`).

use std::time::Duration;

use common::password::PasswordConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::auth::LoginGuardConfig;

/// Built-in password for the `user` principal
pub const DEFAULT_USER_PASSWORD: &str = "password";
/// Built-in password for the `admin` principal
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging settings; `RUST_LOG` overrides `level`
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub level: String,
}

/// Credentials of the two static principals and the lockout policy
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub user_password: String,
    pub admin_password: String,
    pub max_failed_attempts: u32,
    pub failure_window_seconds: u64,
    pub lockout_seconds: u64,
}

impl AuthSettings {
    /// `(username, password)` pairs for the static principals
    pub fn principals(&self) -> [(&str, &str); 2] {
        [
            ("user", self.user_password.as_str()),
            ("admin", self.admin_password.as_str()),
        ]
    }

    /// Whether a built-in password is still in use
    pub fn uses_default_passwords(&self) -> bool {
        self.user_password == DEFAULT_USER_PASSWORD || self.admin_password == DEFAULT_ADMIN_PASSWORD
    }

    pub fn login_guard(&self) -> LoginGuardConfig {
        LoginGuardConfig {
            max_failed_attempts: self.max_failed_attempts,
            failure_window: Duration::from_secs(self.failure_window_seconds),
            lockout: Duration::from_secs(self.lockout_seconds),
        }
    }
}

/// Argon2 cost settings
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&PasswordSettings> for PasswordConfig {
    fn from(settings: &PasswordSettings) -> Self {
        PasswordConfig {
            memory_kib: settings.memory_kib,
            iterations: settings.iterations,
            parallelism: settings.parallelism,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerSettings,
    pub log: LogSettings,
    pub auth: AuthSettings,
    pub password: PasswordSettings,
}

impl ServiceConfig {
    /// Load configuration from defaults, `config/users.*` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/users").required(false))
            .add_source(
                Environment::with_prefix("USERS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let password = PasswordConfig::default();

        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("log.level", "info")?
            .set_default("auth.user_password", DEFAULT_USER_PASSWORD)?
            .set_default("auth.admin_password", DEFAULT_ADMIN_PASSWORD)?
            .set_default("auth.max_failed_attempts", 5)?
            .set_default("auth.failure_window_seconds", 300)?
            .set_default("auth.lockout_seconds", 900)?
            .set_default("password.memory_kib", password.memory_kib)?
            .set_default("password.iterations", password.iterations)?
            .set_default("password.parallelism", password.parallelism)
    }
}
