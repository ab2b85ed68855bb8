use prostart_db::Database;
use prostart_types::models::{Role, User};

use crate::error::ApiResult;

pub fn list_mentors(db: &Database) -> ApiResult<Vec<User>> {
    Ok(db.users()?.into_iter().filter(|u| u.role == Role::Mentor).collect())
}

/// Mentors whose name or expertise contains `search` (case-insensitive),
/// optionally restricted to an exact expertise.
pub fn filter_mentors(
    db: &Database,
    search: Option<&str>,
    expertise: Option<&str>,
) -> ApiResult<Vec<User>> {
    let search = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    let expertise = expertise.filter(|e| !e.is_empty());

    Ok(list_mentors(db)?
        .into_iter()
        .filter(|m| {
            m.name.to_lowercase().contains(&search)
                || m
                    .expertise
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&search))
        })
        .filter(|m| expertise.is_none_or(|e| m.expertise.as_deref() == Some(e)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_filter() {
        let db = Database::open_in_memory(true).unwrap();
        assert_eq!(list_mentors(&db).unwrap().len(), 2);

        let by_expertise_text = filter_mentors(&db, Some("web"), None).unwrap();
        assert_eq!(by_expertise_text.len(), 1);
        assert_eq!(by_expertise_text[0].id, 4);

        let by_name = filter_mentors(&db, Some("maria"), None).unwrap();
        assert_eq!(by_name[0].id, 2);

        let exact = filter_mentors(&db, None, Some("UI/UX Design")).unwrap();
        assert_eq!(exact.len(), 1);
        assert!(filter_mentors(&db, Some("maria"), Some("Web Development")).unwrap().is_empty());
    }
}
