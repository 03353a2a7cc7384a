//! User store contract. Frontends never talk to a database directly.

use thiserror::Error;

use crate::record::{UserId, UserSecretRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Corrupt record for user {user_id}: {reason}")]
    Corrupt { user_id: String, reason: String },
}

/// Persistence for [`UserSecretRecord`]s, unique by user id
pub trait UserStore: Send + Sync {
    fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserSecretRecord>, StoreError>;

    /// Insert, or replace every field of the existing record for the same user
    fn upsert(&self, record: &UserSecretRecord) -> Result<(), StoreError>;
}
