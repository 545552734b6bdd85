use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::Result;

/// A candidate user with review aggregates already folded in.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CandidateRow {
    pub user_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserSkillRow {
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub name: String,
    pub category: String,
    pub proficiency: i32,
    pub is_offering: bool,
    pub description: Option<String>,
}

/// Users other than `exclude` offering at least one skill matching the
/// category/name filters, with rating aggregates, ordered by name.
pub(crate) async fn browse_candidates(
    db: &PgPool,
    exclude: Uuid,
    category: Option<&str>,
    skill_name: Option<&str>,
) -> Result<Vec<CandidateRow>> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT u.id AS user_id, u.name, u.bio, u.profile_image_url,
               COALESCE(r.average_rating, 0.0) AS average_rating,
               COALESCE(r.review_count, 0) AS review_count
        FROM users u
        LEFT JOIN (
            SELECT reviewed_id,
                   AVG(rating)::float8 AS average_rating,
                   COUNT(*) AS review_count
            FROM reviews
            GROUP BY reviewed_id
        ) r ON r.reviewed_id = u.id
        WHERE u.id <> $1
          AND EXISTS (
              SELECT 1
              FROM user_skills us
              JOIN skills s ON s.id = us.skill_id
              WHERE us.user_id = u.id
                AND us.is_offering
                AND ($2::text IS NULL OR s.category = $2)
                AND ($3::text IS NULL OR s.name ILIKE '%' || $3 || '%')
          )
        ORDER BY u.name
        "#,
    )
    .bind(exclude)
    .bind(category)
    .bind(skill_name)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Users other than `exclude` offering any of the given skills, best
/// rated first.
pub(crate) async fn offering_candidates(
    db: &PgPool,
    exclude: Uuid,
    skill_ids: &[Uuid],
    limit: i64,
) -> Result<Vec<CandidateRow>> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT u.id AS user_id, u.name, u.bio, u.profile_image_url,
               COALESCE(r.average_rating, 0.0) AS average_rating,
               COALESCE(r.review_count, 0) AS review_count
        FROM users u
        LEFT JOIN (
            SELECT reviewed_id,
                   AVG(rating)::float8 AS average_rating,
                   COUNT(*) AS review_count
            FROM reviews
            GROUP BY reviewed_id
        ) r ON r.reviewed_id = u.id
        WHERE u.id <> $1
          AND EXISTS (
              SELECT 1 FROM user_skills us
              WHERE us.user_id = u.id AND us.is_offering AND us.skill_id = ANY($2)
          )
        ORDER BY average_rating DESC, u.name
        LIMIT $3
        "#,
    )
    .bind(exclude)
    .bind(skill_ids)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Users with at least one received review, best average first, ties
/// broken by review count.
pub(crate) async fn top_rated(
    db: &PgPool,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<CandidateRow>> {
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT u.id AS user_id, u.name, u.bio, u.profile_image_url,
               AVG(rv.rating)::float8 AS average_rating,
               COUNT(rv.id) AS review_count
        FROM users u
        JOIN reviews rv ON rv.reviewed_id = u.id
        WHERE ($1::text IS NULL OR EXISTS (
                  SELECT 1
                  FROM user_skills us
                  JOIN skills s ON s.id = us.skill_id
                  WHERE us.user_id = u.id AND us.is_offering AND s.category = $1
              ))
        GROUP BY u.id, u.name, u.bio, u.profile_image_url
        ORDER BY average_rating DESC, review_count DESC, u.name
        LIMIT $2
        "#,
    )
    .bind(category)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub(crate) async fn candidate(db: &PgPool, user_id: Uuid) -> Result<Option<CandidateRow>> {
    let row = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT u.id AS user_id, u.name, u.bio, u.profile_image_url,
               COALESCE(r.average_rating, 0.0) AS average_rating,
               COALESCE(r.review_count, 0) AS review_count
        FROM users u
        LEFT JOIN (
            SELECT reviewed_id,
                   AVG(rating)::float8 AS average_rating,
                   COUNT(*) AS review_count
            FROM reviews
            GROUP BY reviewed_id
        ) r ON r.reviewed_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Skill ids a user wants to learn.
pub(crate) async fn learning_skill_ids(db: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT skill_id FROM user_skills WHERE user_id = $1 AND NOT is_offering",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Skills for a batch of users in one query; `only_offering` limits the
/// set to teaching entries (browse lists), details views take everything.
pub(crate) async fn skills_for_users(
    db: &PgPool,
    user_ids: &[Uuid],
    only_offering: bool,
) -> Result<Vec<UserSkillRow>> {
    let rows = sqlx::query_as::<_, UserSkillRow>(
        r#"
        SELECT us.user_id, us.skill_id, s.name, s.category, us.proficiency,
               us.is_offering, us.description
        FROM user_skills us
        JOIN skills s ON s.id = us.skill_id
        WHERE us.user_id = ANY($1) AND (NOT $2 OR us.is_offering)
        ORDER BY s.name
        "#,
    )
    .bind(user_ids)
    .bind(only_offering)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
