use serde::Serialize;
use uuid::Uuid;

/// A user as seen in browse/recommendation results.
#[derive(Debug, Clone, Serialize)]
pub struct UserMatch {
    pub user_id: Uuid,
    pub name: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub skills: Vec<MatchSkill>,
    /// Arithmetic mean of received review ratings; 0.0 means "no reviews"
    /// (ratings start at 1, so a real average can never be 0.0).
    pub average_rating: f64,
    pub review_count: i64,
    pub is_online: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSkill {
    pub skill_id: Uuid,
    pub name: String,
    pub category: String,
    pub proficiency: i32,
    pub is_offering: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BrowseFilters {
    pub category: Option<String>,
    pub skill_name: Option<String>,
    pub min_rating: Option<f64>,
    pub is_online: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchPage {
    pub items: Vec<UserMatch>,
    /// Number of candidates after all filters, before pagination.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
