use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{is_unique_violation, CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    /// Materialized credit balance; mutated only by the credit ledger.
    pub time_credits: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl User {
    pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, bio, profile_image_url,
                   time_credits, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, bio, profile_image_url,
                   time_credits, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        bio: Option<&str>,
    ) -> Result<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, bio)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, bio, profile_image_url,
                      time_credits, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(bio)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(CoreError::Conflict("email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Update profile fields only; `time_credits` is never touched here.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        bio: Option<&str>,
        profile_image_url: Option<&str>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                bio = COALESCE($3, bio),
                profile_image_url = COALESCE($4, profile_image_url),
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, bio, profile_image_url,
                      time_credits, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(bio)
        .bind(profile_image_url)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
