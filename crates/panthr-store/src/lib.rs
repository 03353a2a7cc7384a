//! Panthr Store - SQLite persistence for user wallet records

pub mod sqlite;

pub use sqlite::{default_path, SqliteUserStore};
