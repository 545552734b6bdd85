use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{is_unique_violation, CoreError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

/// One (user, skill) pair; `is_offering` distinguishes teaching from
/// learning interest. At most one row per pair, enforced by the primary key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSkill {
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub proficiency: i32,
    pub is_offering: bool,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Skill {
    pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name, category, description, created_at
            FROM skills
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(skill)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        category: &str,
        description: Option<&str>,
    ) -> Result<Skill> {
        let res = sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (name, category, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, category, description, created_at
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(description)
        .fetch_one(db)
        .await;

        match res {
            Ok(skill) => Ok(skill),
            Err(e) if is_unique_violation(&e) => Err(CoreError::Conflict(format!(
                "skill \"{name}\" already exists"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list(db: &PgPool, category: Option<&str>) -> Result<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, name, category, description, created_at
            FROM skills
            WHERE $1::text IS NULL OR category = $1
            ORDER BY name
            "#,
        )
        .bind(category)
        .fetch_all(db)
        .await?;
        Ok(skills)
    }
}

impl UserSkill {
    /// Insert-or-update: a second add for the same (user, skill) pair
    /// replaces the previous values instead of creating a duplicate row.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        skill_id: Uuid,
        proficiency: i32,
        is_offering: bool,
        description: Option<&str>,
    ) -> Result<UserSkill> {
        let row = sqlx::query_as::<_, UserSkill>(
            r#"
            INSERT INTO user_skills (user_id, skill_id, proficiency, is_offering, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, skill_id) DO UPDATE
            SET proficiency = EXCLUDED.proficiency,
                is_offering = EXCLUDED.is_offering,
                description = EXCLUDED.description,
                updated_at = now()
            RETURNING user_id, skill_id, proficiency, is_offering, description,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(skill_id)
        .bind(proficiency)
        .bind(is_offering)
        .bind(description)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, user_id: Uuid, skill_id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM user_skills WHERE user_id = $1 AND skill_id = $2")
            .bind(user_id)
            .bind(skill_id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn list_for_user(db: &PgPool, user_id: Uuid) -> Result<Vec<UserSkill>> {
        let rows = sqlx::query_as::<_, UserSkill>(
            r#"
            SELECT user_id, skill_id, proficiency, is_offering, description,
                   created_at, updated_at
            FROM user_skills
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
