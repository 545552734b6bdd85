use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::exchanges::repo::SkillExchange;
use crate::reviews::repo::Review;
use crate::state::AppState;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Leave a review on an exchange. The reviewer must be one of the two
/// participants; the reviewed user is the counterparty. Whether the
/// exchange has actually completed is the caller's responsibility.
pub async fn create_review(
    state: &AppState,
    exchange_id: Uuid,
    reviewer_id: Uuid,
    rating: i32,
    comment: Option<&str>,
) -> Result<Review> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CoreError::InvalidArgument(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }

    let exchange = SkillExchange::find(&state.db, exchange_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("exchange {exchange_id}")))?;
    let reviewed_id = if reviewer_id == exchange.offerer_id {
        exchange.learner_id
    } else if reviewer_id == exchange.learner_id {
        exchange.offerer_id
    } else {
        return Err(CoreError::Unauthorized(
            "only exchange participants may leave a review".into(),
        ));
    };

    let review =
        Review::create(&state.db, exchange_id, reviewer_id, reviewed_id, rating, comment).await?;
    info!(review_id = %review.id, %exchange_id, %reviewer_id, rating, "review created");
    Ok(review)
}

pub async fn list_reviews_for_user(state: &AppState, user_id: Uuid) -> Result<Vec<Review>> {
    Review::list_received(&state.db, user_id).await
}
