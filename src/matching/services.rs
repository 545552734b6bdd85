use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::matching::dto::{BrowseFilters, MatchPage, MatchSkill, UserMatch};
use crate::matching::repo::{self, CandidateRow};
use crate::state::AppState;

/// Hard cap on page size, applied regardless of what the caller asks for.
pub const MAX_PAGE_LIMIT: i64 = 50;

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_PAGE_LIMIT)
}

/// Slice out one page; returns the page plus the pre-pagination total.
fn paginate<T>(items: Vec<T>, page: i64, limit: i64) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let start = ((page - 1) * limit) as usize;
    let page_items = items.into_iter().skip(start).take(limit as usize).collect();
    (page_items, total)
}

/// Browse other users offering skills, filtered and paginated.
///
/// Rating and presence filters run after aggregation, so pagination only
/// happens once every filter has been applied.
pub async fn browse_users(
    state: &AppState,
    current_user: Uuid,
    filters: &BrowseFilters,
    page: i64,
    limit: i64,
) -> Result<MatchPage> {
    let page = page.max(1);
    let limit = clamp_limit(limit);

    let candidates = repo::browse_candidates(
        &state.db,
        current_user,
        filters.category.as_deref(),
        filters.skill_name.as_deref(),
    )
    .await?;

    let filtered: Vec<CandidateRow> = candidates
        .into_iter()
        .filter(|c| filters.min_rating.map_or(true, |min| c.average_rating >= min))
        .filter(|c| {
            filters
                .is_online
                .map_or(true, |want| state.presence.is_online(c.user_id) == want)
        })
        .collect();

    let (page_rows, total) = paginate(filtered, page, limit);
    let items = hydrate(state, page_rows, true).await?;
    Ok(MatchPage {
        items,
        total,
        page,
        limit,
    })
}

/// Full detail view for one user: every skill (not just offered),
/// rating aggregates, and live presence.
pub async fn get_user_match_details(
    state: &AppState,
    target_user: Uuid,
    current_user: Uuid,
) -> Result<UserMatch> {
    tracing::debug!(%target_user, %current_user, "match details lookup");
    let row = repo::candidate(&state.db, target_user)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {target_user}")))?;
    let mut matches = hydrate(state, vec![row], false).await?;
    Ok(matches.remove(0))
}

/// Users offering any skill the caller wants to learn; when the caller
/// has no learning interests this degrades to the top-rated listing.
pub async fn get_recommended_matches(
    state: &AppState,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<UserMatch>> {
    let limit = clamp_limit(limit);
    let interests = repo::learning_skill_ids(&state.db, user_id).await?;
    if interests.is_empty() {
        return get_top_rated_users(state, None, limit).await;
    }
    let rows = repo::offering_candidates(&state.db, user_id, &interests, limit).await?;
    hydrate(state, rows, true).await
}

pub async fn get_top_rated_users(
    state: &AppState,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<UserMatch>> {
    let limit = clamp_limit(limit);
    let rows = repo::top_rated(&state.db, category, limit).await?;
    hydrate(state, rows, true).await
}

/// Attach skills and presence to candidate rows, one skills query for the
/// whole batch.
async fn hydrate(
    state: &AppState,
    rows: Vec<CandidateRow>,
    only_offering: bool,
) -> Result<Vec<UserMatch>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
    let mut skills_by_user: HashMap<Uuid, Vec<MatchSkill>> = HashMap::new();
    for row in repo::skills_for_users(&state.db, &ids, only_offering).await? {
        skills_by_user
            .entry(row.user_id)
            .or_default()
            .push(MatchSkill {
                skill_id: row.skill_id,
                name: row.name,
                category: row.category,
                proficiency: row.proficiency,
                is_offering: row.is_offering,
                description: row.description,
            });
    }

    Ok(rows
        .into_iter()
        .map(|r| UserMatch {
            is_online: state.presence.is_online(r.user_id),
            skills: skills_by_user.remove(&r.user_id).unwrap_or_default(),
            user_id: r.user_id,
            name: r.name,
            bio: r.bio,
            profile_image_url: r.profile_image_url,
            average_rating: r.average_rating,
            review_count: r.review_count,
        })
        .collect())
}
