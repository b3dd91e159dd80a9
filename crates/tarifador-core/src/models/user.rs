//! User model
//!
//! Represents an API user. Call records may only be registered by an
//! authenticated user; bills are public reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,

    /// Username (unique, for login)
    pub username: String,

    /// Password hash (never expose in API responses)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether the user may log in
    pub active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a new active user from a username and a precomputed hash
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Check if the user is allowed to authenticate
    pub fn can_login(&self) -> bool {
        self.active
    }
}
