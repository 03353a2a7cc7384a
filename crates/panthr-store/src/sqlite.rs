//! SQLite user store
//!
//! One row per user, keyed by the canonical user id string. Envelopes are
//! stored exactly as the vault renders them.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use panthr_core::{StoreError, UserId, UserSecretRecord, UserStore};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

/// SQLite-backed user store
pub struct SqliteUserStore {
    conn: Mutex<Connection>,
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl SqliteUserStore {
    /// Open or create the user database
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("Failed to create data dir: {}", e)))?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| StoreError::Backend(format!("Failed to open user database: {}", e)))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| StoreError::Backend(format!("Failed to set pragmas: {}", e)))?;

        Self::init(conn)
    }

    /// Open using the default path (~/.panthr/users.db)
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_path()?)
    }

    /// Private, non-persistent store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory().map_err(backend)?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY NOT NULL,
                envelope TEXT NOT NULL,
                envelope_version INTEGER NOT NULL,
                public_address TEXT NOT NULL,
                view_key TEXT NOT NULL,
                language TEXT NOT NULL DEFAULT 'en',
                notifications_enabled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| StoreError::Backend(format!("Failed to create users table: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

pub fn default_path() -> Result<PathBuf, StoreError> {
    Ok(dirs::home_dir()
        .ok_or_else(|| StoreError::Backend("No home directory".to_string()))?
        .join(".panthr")
        .join("users.db"))
}

struct RawRow {
    user_id: String,
    envelope: String,
    envelope_version: i64,
    public_address: String,
    view_key: String,
    language: String,
    notifications_enabled: bool,
    created_at: String,
    updated_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            envelope: row.get(1)?,
            envelope_version: row.get(2)?,
            public_address: row.get(3)?,
            view_key: row.get(4)?,
            language: row.get(5)?,
            notifications_enabled: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<UserSecretRecord, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            user_id: self.user_id.clone(),
            reason,
        };
        let envelope_version = u8::try_from(self.envelope_version)
            .map_err(|_| corrupt(format!("envelope version {} out of range", self.envelope_version)))?;
        let created_at = parse_time(&self.created_at).map_err(&corrupt)?;
        let updated_at = parse_time(&self.updated_at).map_err(&corrupt)?;

        Ok(UserSecretRecord {
            user_id: UserId::new(self.user_id.clone()),
            envelope: self.envelope,
            envelope_version,
            public_address: self.public_address,
            view_key: self.view_key,
            language: self.language,
            notifications_enabled: self.notifications_enabled,
            created_at,
            updated_at,
        })
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp '{}': {}", value, e))
}

impl UserStore for SqliteUserStore {
    fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserSecretRecord>, StoreError> {
        let conn = self.conn.lock().map_err(backend)?;

        let raw = conn
            .query_row(
                "SELECT user_id, envelope, envelope_version, public_address, view_key,
                        language, notifications_enabled, created_at, updated_at
                 FROM users WHERE user_id = ?1",
                params![user_id.as_str()],
                RawRow::from_row,
            )
            .optional()
            .map_err(backend)?;

        raw.map(RawRow::into_record).transpose()
    }

    fn upsert(&self, record: &UserSecretRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(backend)?;

        conn.execute(
            "INSERT INTO users (user_id, envelope, envelope_version, public_address, view_key,
                                language, notifications_enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_id) DO UPDATE SET
                envelope = excluded.envelope,
                envelope_version = excluded.envelope_version,
                public_address = excluded.public_address,
                view_key = excluded.view_key,
                language = excluded.language,
                notifications_enabled = excluded.notifications_enabled,
                updated_at = excluded.updated_at",
            params![
                record.user_id.as_str(),
                record.envelope,
                record.envelope_version,
                record.public_address,
                record.view_key,
                record.language,
                record.notifications_enabled,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| StoreError::Backend(format!("Failed to store user: {}", e)))?;

        debug!(user_id = %record.user_id, "user record stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panthr_crypto::Scheme;

    fn record(id: &str) -> UserSecretRecord {
        UserSecretRecord::new(
            UserId::new(id),
            format!("{}:abcd", "00".repeat(16)),
            Scheme::Aead,
            format!("aleo1{id}"),
            format!("AViewKey1{id}"),
        )
    }

    #[test]
    fn test_missing_user() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        assert!(store.find_by_user_id(&UserId::new("nobody")).unwrap().is_none());
    }

    #[test]
    fn test_upsert_and_find() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        let original = record("1");
        store.upsert(&original).unwrap();

        let found = store.find_by_user_id(&UserId::new("1")).unwrap().unwrap();
        assert_eq!(found.envelope, original.envelope);
        assert_eq!(found.envelope_version, 2);
        assert_eq!(found.public_address, "aleo11");
        assert_eq!(found.language, "en");
        assert!(!found.notifications_enabled);
        assert_eq!(found.created_at, original.created_at);
    }

    #[test]
    fn test_upsert_replaces_but_keeps_created_at() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        let first = record("1");
        store.upsert(&first).unwrap();

        let mut second = record("1");
        second.public_address = "aleo1replaced".into();
        second.notifications_enabled = true;
        second.created_at = first.created_at + chrono::Duration::hours(1);
        store.upsert(&second).unwrap();

        let found = store.find_by_user_id(&UserId::new("1")).unwrap().unwrap();
        assert_eq!(found.public_address, "aleo1replaced");
        assert!(found.notifications_enabled);
        assert_eq!(found.created_at, first.created_at);
    }

    #[test]
    fn test_ids_are_exact_strings() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.upsert(&record("12345")).unwrap();
        assert!(store.find_by_user_id(&UserId::new("012345")).unwrap().is_none());
        assert!(store.find_by_user_id(&UserId::from(12345u64)).unwrap().is_some());
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let store = SqliteUserStore::open_in_memory().unwrap();
        store.upsert(&record("1")).unwrap();
        store
            .conn
            .lock()
            .unwrap()
            .execute("UPDATE users SET envelope_version = 999", [])
            .unwrap();

        assert!(matches!(
            store.find_by_user_id(&UserId::new("1")),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
