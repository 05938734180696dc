//! User registry service
//!
//! CRUD over user records behind HTTP Basic authentication, backed by an
//! embedded SQLite database.

use sqlx::migrate::Migrator;

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod state;
pub mod validation;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
