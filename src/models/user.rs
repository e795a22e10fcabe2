//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Member,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
    Pending,
}

/// Self-declared climbing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimbingLevel {
    Debutant,
    Intermediaire,
    Avance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub level: Option<ClimbingLevel>,
}

/// Account timestamps. Never sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMeta {
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub last_login_at: Option<DateTime<Utc>>,
}

/// User account stored in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    /// Lower-cased email address, unique across users
    pub email: String,
    /// Argon2 hash; absent for accounts created without a password
    #[serde(default)]
    pub password_hash: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub profile: UserProfile,
    pub security: SecurityMeta,
}

impl User {
    /// A fresh active account.
    pub fn new(
        id: String,
        email: String,
        display_name: String,
        roles: Vec<Role>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            password_hash: None,
            display_name,
            avatar_url: None,
            phone: None,
            roles,
            status: UserStatus::Active,
            email_verified: false,
            profile: UserProfile::default(),
            security: SecurityMeta {
                created_at: now,
                updated_at: None,
                last_login_at: None,
            },
        }
    }
}

/// Unique-email claim (`user_emails` collection), keyed by lower-cased email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailClaim {
    pub user_id: String,
}
