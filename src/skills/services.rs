use tracing::info;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::skills::repo::{Skill, UserSkill};
use crate::state::AppState;
use crate::users::repo::User;

pub const MIN_PROFICIENCY: i32 = 1;
pub const MAX_PROFICIENCY: i32 = 5;

pub async fn create_skill(
    state: &AppState,
    name: &str,
    category: &str,
    description: Option<&str>,
) -> Result<Skill> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidArgument("skill name must not be empty".into()));
    }
    if category.trim().is_empty() {
        return Err(CoreError::InvalidArgument("category must not be empty".into()));
    }
    let skill = Skill::create(&state.db, name.trim(), category.trim(), description).await?;
    info!(skill_id = %skill.id, name = %skill.name, "skill created");
    Ok(skill)
}

pub async fn get_skill(state: &AppState, id: Uuid) -> Result<Skill> {
    Skill::find(&state.db, id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("skill {id}")))
}

pub async fn list_skills(state: &AppState, category: Option<&str>) -> Result<Vec<Skill>> {
    Skill::list(&state.db, category).await
}

/// Add a skill to a user's profile, or update it in place when the
/// (user, skill) pair already exists.
pub async fn add_user_skill(
    state: &AppState,
    user_id: Uuid,
    skill_id: Uuid,
    proficiency: i32,
    is_offering: bool,
    description: Option<&str>,
) -> Result<UserSkill> {
    if !(MIN_PROFICIENCY..=MAX_PROFICIENCY).contains(&proficiency) {
        return Err(CoreError::InvalidArgument(format!(
            "proficiency must be between {MIN_PROFICIENCY} and {MAX_PROFICIENCY}, got {proficiency}"
        )));
    }
    if User::find(&state.db, user_id).await?.is_none() {
        return Err(CoreError::NotFound(format!("user {user_id}")));
    }
    if Skill::find(&state.db, skill_id).await?.is_none() {
        return Err(CoreError::NotFound(format!("skill {skill_id}")));
    }

    UserSkill::upsert(&state.db, user_id, skill_id, proficiency, is_offering, description).await
}

pub async fn remove_user_skill(state: &AppState, user_id: Uuid, skill_id: Uuid) -> Result<()> {
    let removed = UserSkill::delete(&state.db, user_id, skill_id).await?;
    if !removed {
        return Err(CoreError::NotFound(format!(
            "user skill ({user_id}, {skill_id})"
        )));
    }
    Ok(())
}

pub async fn list_user_skills(state: &AppState, user_id: Uuid) -> Result<Vec<UserSkill>> {
    UserSkill::list_for_user(&state.db, user_id).await
}
