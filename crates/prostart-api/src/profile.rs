use prostart_db::Database;
use prostart_types::api::{Identity, ProfilePatch};
use prostart_types::models::{Role, User};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

const LEVEL_BANDS: [&str; 9] = [
    "Beginner 1",
    "Beginner 2",
    "Beginner 3",
    "Intermediate 1",
    "Intermediate 2",
    "Intermediate 3",
    "Advanced 1",
    "Advanced 2",
    "Advanced 3",
];

/// Experience points per level band.
const BAND_WIDTH: u32 = 50;

/// Current record of the acting user.
pub fn load_profile(db: &Database, identity: &Identity) -> ApiResult<User> {
    db.user_by_id(identity.user_id)?.ok_or(ApiError::NotAuthenticated)
}

/// Apply a profile edit. The stored session is refreshed with the result.
pub fn update_profile(db: &Database, identity: &Identity, patch: ProfilePatch) -> ApiResult<User> {
    let mut users = db.users()?;

    if let Some(email) = patch.email.as_deref().map(str::trim) {
        if email.is_empty() {
            return Err(ApiError::MissingField("email"));
        }
        if users.iter().any(|u| u.email == email && u.id != identity.user_id) {
            warn!(user_id = identity.user_id, email, "profile edit rejected: email already in use");
            return Err(ApiError::EmailTaken(email.to_string()));
        }
    }
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::MissingField("name"));
    }

    let user = users
        .iter_mut()
        .find(|u| u.id == identity.user_id)
        .ok_or(ApiError::NotAuthenticated)?;

    if let Some(name) = patch.name {
        user.name = name.trim().to_string();
    }
    if let Some(email) = patch.email {
        user.email = email.trim().to_string();
    }
    if let Some(expertise) = patch.expertise {
        if user.role == Role::Mentor {
            user.expertise = Some(expertise.trim().to_string());
        } else {
            debug!(user_id = user.id, "ignoring expertise for non-mentor");
        }
    }

    let updated = user.clone();
    db.save_users(&users)?;
    db.set_current_user(&updated)?;

    info!(user_id = updated.id, "updated profile");
    Ok(updated)
}

/// A stored level wins; otherwise the level follows from experience.
pub fn student_level(user: &User) -> String {
    match &user.level {
        Some(level) if !level.is_empty() => level.clone(),
        _ => level_for_experience(user.experience.unwrap_or(0)).to_string(),
    }
}

pub fn level_for_experience(experience: u32) -> &'static str {
    let band = (experience / BAND_WIDTH) as usize;
    LEVEL_BANDS[band.min(LEVEL_BANDS.len() - 1)]
}
