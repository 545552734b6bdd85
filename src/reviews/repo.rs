use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub exchange_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Review {
    pub async fn create(
        db: &PgPool,
        exchange_id: Uuid,
        reviewer_id: Uuid,
        reviewed_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (exchange_id, reviewer_id, reviewed_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, exchange_id, reviewer_id, reviewed_id, rating, comment,
                      created_at, updated_at
            "#,
        )
        .bind(exchange_id)
        .bind(reviewer_id)
        .bind(reviewed_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(db)
        .await?;
        Ok(review)
    }

    /// Reviews received by a user, newest first.
    pub async fn list_received(db: &PgPool, reviewed_id: Uuid) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, exchange_id, reviewer_id, reviewed_id, rating, comment,
                   created_at, updated_at
            FROM reviews
            WHERE reviewed_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(reviewed_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
