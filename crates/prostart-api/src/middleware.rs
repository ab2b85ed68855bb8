use prostart_db::Database;
use prostart_types::api::Identity;
use prostart_types::models::User;
use tracing::warn;

use crate::error::{ApiError, ApiResult};

/// Resolve the stored session into an explicit identity.
///
/// The session is a snapshot taken at login, so the account it names must
/// still exist in the user collection.
pub fn require_identity(db: &Database) -> ApiResult<Identity> {
    let session = db.current_user()?.ok_or(ApiError::NotAuthenticated)?;
    let users = db.users()?;
    let user = authenticated_user(&users, &Identity::from(&session))?;
    Ok(Identity::from(user))
}

/// Current record of the acting user.
pub(crate) fn authenticated_user<'a>(users: &'a [User], identity: &Identity) -> ApiResult<&'a User> {
    users.iter().find(|u| u.id == identity.user_id).ok_or_else(|| {
        warn!(user_id = identity.user_id, "identity does not match a known user");
        ApiError::NotAuthenticated
    })
}
