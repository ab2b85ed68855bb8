use prostart_db::Database;
use prostart_types::api::{Identity, LoginRequest, RegisterRequest};
use prostart_types::models::User;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::ids::next_id;

/// Create an account and log it in.
pub fn register(db: &Database, req: RegisterRequest) -> ApiResult<Identity> {
    let name = req.name.trim();
    let email = req.email.trim();
    if name.is_empty() {
        return Err(ApiError::MissingField("name"));
    }
    if email.is_empty() {
        return Err(ApiError::MissingField("email"));
    }
    if req.password.is_empty() {
        return Err(ApiError::MissingField("password"));
    }

    let mut users = db.users()?;
    if users.iter().any(|u| u.email == email) {
        warn!(email, "registration rejected: email already in use");
        return Err(ApiError::EmailTaken(email.to_string()));
    }

    let id = next_id(users.iter().map(|u| u.id));
    let user = User::new(id, name.to_string(), email.to_string(), req.password, req.role);

    users.push(user.clone());
    db.save_users(&users)?;
    db.set_current_user(&user)?;

    info!(user_id = id, role = %user.role, "registered user");
    Ok(Identity::from(&user))
}

/// Plaintext credential check. There is no hashing: this store is a local
/// stand-in, not an authentication system.
pub fn login(db: &Database, req: LoginRequest) -> ApiResult<Identity> {
    let email = req.email.trim();
    let user = db
        .users()?
        .into_iter()
        .find(|u| u.email == email && u.password == req.password)
        .ok_or_else(|| {
            warn!(email, "login failed");
            ApiError::InvalidCredentials
        })?;

    db.set_current_user(&user)?;
    info!(user_id = user.id, "logged in");
    Ok(Identity::from(&user))
}

pub fn logout(db: &Database) -> ApiResult<()> {
    db.clear_current_user()?;
    info!("logged out");
    Ok(())
}

pub fn current_user(db: &Database) -> ApiResult<Option<User>> {
    Ok(db.current_user()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::require_identity;
    use prostart_types::models::Role;

    fn register_req(name: &str, email: &str, role: Role) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: "secret".into(),
            role,
        }
    }

    #[test]
    fn test_register_logs_in() {
        let db = Database::open_in_memory(false).unwrap();
        let identity = register(&db, register_req(" Olga ", "olga@test.com", Role::Student)).unwrap();

        assert_eq!(identity.name, "Olga");
        assert_eq!(require_identity(&db).unwrap(), identity);

        let stored = current_user(&db).unwrap().unwrap();
        assert_eq!(stored.level.as_deref(), Some("Beginner 1"));
        assert_eq!(stored.experience, Some(0));
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let db = Database::open_in_memory(true).unwrap();
        let err = register(&db, register_req("Copy", "student@test.com", Role::Student)).unwrap_err();

        assert!(matches!(err, ApiError::EmailTaken(_)));
        assert_eq!(db.users().unwrap().len(), 4);
        assert!(current_user(&db).unwrap().is_none());
    }

    #[test]
    fn test_register_requires_fields() {
        let db = Database::open_in_memory(false).unwrap();
        let err = register(&db, register_req("  ", "a@test.com", Role::Mentor)).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("name")));
    }

    #[test]
    fn test_registered_ids_are_distinct() {
        let db = Database::open_in_memory(false).unwrap();
        let a = register(&db, register_req("A", "a@test.com", Role::Student)).unwrap();
        let b = register(&db, register_req("B", "b@test.com", Role::Company)).unwrap();
        assert!(b.user_id > a.user_id);
    }

    #[test]
    fn test_login_and_logout() {
        let db = Database::open_in_memory(true).unwrap();

        let bad = LoginRequest {
            email: "mentor@test.com".into(),
            password: "wrong".into(),
        };
        assert!(matches!(login(&db, bad), Err(ApiError::InvalidCredentials)));

        let good = LoginRequest {
            email: "mentor@test.com".into(),
            password: "password".into(),
        };
        let identity = login(&db, good).unwrap();
        assert_eq!(identity.user_id, 2);
        assert_eq!(identity.role, Role::Mentor);

        logout(&db).unwrap();
        assert!(matches!(require_identity(&db), Err(ApiError::NotAuthenticated)));
        logout(&db).unwrap();
    }
}
