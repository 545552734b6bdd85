use skillswap::exchanges::repo::{NewExchange, SkillExchange};
use skillswap::skills::Skill;
use skillswap::users::User;
use skillswap::AppState;
use sqlx::postgres::PgPoolOptions;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Check if a test database is available via environment variable.
#[allow(dead_code)]
pub fn database_available() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").is_ok()
}

/// Skip test with message if no test database is configured.
#[macro_export]
macro_rules! require_database {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: DATABASE_URL not set");
            return;
        }
    };
}

/// Capture tracing output per test; RUST_LOG controls verbosity.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Connect to the test database and make sure the schema is current.
#[allow(dead_code)]
pub async fn test_state() -> AppState {
    init_tracing();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to test database");
    skillswap::db::run_migrations(&pool)
        .await
        .expect("run migrations");
    AppState::with_pool(pool)
}

/// Unique email per call so test runs never collide on the unique index.
#[allow(dead_code)]
pub fn unique_email(tag: &str) -> String {
    format!("{tag}-{}@example.com", Uuid::new_v4())
}

#[allow(dead_code)]
pub async fn seed_user(state: &AppState, name: &str) -> User {
    skillswap::users::services::create_user(state, name, &unique_email(name), "s3cret-pass", None)
        .await
        .expect("create test user")
}

#[allow(dead_code)]
pub async fn seed_user_with_credits(state: &AppState, name: &str, credits: i32) -> User {
    let user = seed_user(state, name).await;
    if credits > 0 {
        skillswap::credits::services::add_credits(state, user.id, credits, "test seed")
            .await
            .expect("seed credits");
    }
    user
}

/// A skill with a unique name; the category isolates test data sets.
#[allow(dead_code)]
pub async fn seed_skill(state: &AppState, category: &str) -> Skill {
    skillswap::skills::services::create_skill(
        state,
        &format!("skill-{}", Uuid::new_v4()),
        category,
        None,
    )
    .await
    .expect("create test skill")
}

#[allow(dead_code)]
pub fn unique_category(tag: &str) -> String {
    format!("{tag}-{}", Uuid::new_v4())
}

#[allow(dead_code)]
pub async fn seed_exchange(
    state: &AppState,
    learner_id: Uuid,
    offerer_id: Uuid,
    skill_id: Uuid,
    duration_minutes: i32,
) -> SkillExchange {
    skillswap::exchanges::services::create_exchange(
        state,
        NewExchange {
            learner_id,
            offerer_id,
            skill_id,
            scheduled_at: OffsetDateTime::now_utc() + Duration::days(1),
            duration_minutes,
            notes: None,
        },
    )
    .await
    .expect("create test exchange")
}
