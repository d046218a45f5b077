/**
 * User Model and Database Operations
 *
 * The `users` row carries credentials, profile fields, gamification totals,
 * moderation flags and the mirrored subscription status. Everything outside
 * the auth module reads users through the narrower `UserProfile` and
 * `UserSummary` views.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::shared::users::{Role, UserProfile};

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    /// Unique, case-insensitive
    pub username: String,
    /// Unique, case-insensitive
    pub email: String,
    /// Hashed password (bcrypt)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    #[sqlx(json)]
    pub roles: Vec<String>,
    pub points: i64,
    pub level: i64,
    pub is_active: bool,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub subscription_status: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        has_role(&self.roles, role)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            bio: self.bio.clone(),
            avatar_url: self.avatar_url.clone(),
            points: self.points,
            level: self.level,
            created_at: self.created_at,
        }
    }
}

/// Role check over a role list; `admin` implies every other role
pub fn has_role(roles: &[String], role: Role) -> bool {
    roles.iter().any(|r| {
        r.eq_ignore_ascii_case(role.as_str()) || r.eq_ignore_ascii_case(Role::Admin.as_str())
    })
}

/// Create a new user with the default `user` role
///
/// # Returns
/// Created user, or a unique violation if the username or email is taken
pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash, roles, created_at, updated_at)
        VALUES ($1, $2, $3, $4, '["user"]', $5, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Get user by email (case-insensitive)
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Get user by username (case-insensitive)
pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Look a login identifier up as a username first, then as an email
pub async fn find_by_login(pool: &SqlitePool, identifier: &str) -> Result<Option<User>, sqlx::Error> {
    if let Some(user) = get_user_by_username(pool, identifier).await? {
        return Ok(Some(user));
    }
    if identifier.contains('@') {
        return get_user_by_email(pool, identifier).await;
    }
    Ok(None)
}

/// Get user by ID
pub async fn get_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn touch_last_login(pool: &SqlitePool, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password(
    pool: &SqlitePool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mirror a subscription status onto the user row
pub async fn update_subscription_status(
    pool: &SqlitePool,
    user_id: Uuid,
    status: &str,
    customer_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET subscription_status = $1,
            stripe_customer_id = COALESCE($2, stripe_customer_id),
            updated_at = $3
        WHERE id = $4
        "#,
    )
    .bind(status)
    .bind(customer_id)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
