use chrono::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User role stored as the PostgreSQL ENUM type "user_role".
///
/// Admin may act on any resource as if they were its author; User only on
/// their own.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }
}

/// Account record. Email is the identity field and carries a unique
/// constraint; `password` holds the argon2 hash, never plain text.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub password: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Listing. `price` maps a NUMERIC(10,2) column; `created_at` is set once
/// on insert and never updated. `author_id` cascades on user deletion.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
}

/// Review attached to an advertisement. Cascades when either the author
/// or the advertisement is deleted.
#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct Review {
    pub id: i64,
    pub text: String,
    pub author_id: Uuid,
    pub ad_id: i64,
    pub created_at: DateTime<Utc>,
}
