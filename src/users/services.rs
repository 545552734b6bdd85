use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::state::AppState;
use crate::users::repo::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub async fn create_user(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    bio: Option<&str>,
) -> Result<User> {
    if name.trim().is_empty() {
        return Err(CoreError::InvalidArgument("name must not be empty".into()));
    }
    if !is_valid_email(email) {
        return Err(CoreError::InvalidArgument(format!(
            "invalid email address: {email}"
        )));
    }
    if password.len() < 8 {
        return Err(CoreError::InvalidArgument(
            "password must be at least 8 characters".into(),
        ));
    }

    let hash = hash_password(password)
        .map_err(|e| CoreError::InvalidArgument(format!("password hashing failed: {e}")))?;
    let user = User::create(&state.db, name.trim(), email, &hash, bio).await?;
    info!(user_id = %user.id, "user created");

    let grant = state.config.signup_credits;
    if grant > 0 {
        if let Err(e) =
            crate::credits::services::add_credits(state, user.id, grant, "signup grant").await
        {
            warn!(error = %e, user_id = %user.id, "signup credit grant failed");
        }
    }

    Ok(user)
}

pub async fn get_user(state: &AppState, id: Uuid) -> Result<User> {
    User::find(&state.db, id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {id}")))
}

pub async fn update_profile(
    state: &AppState,
    id: Uuid,
    name: Option<&str>,
    bio: Option<&str>,
    profile_image_url: Option<&str>,
) -> Result<User> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(CoreError::InvalidArgument("name must not be empty".into()));
        }
    }
    User::update_profile(&state.db, id, name, bio, profile_image_url)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("user {id}")))
}
