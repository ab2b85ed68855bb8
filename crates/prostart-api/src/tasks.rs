use prostart_db::Database;
use prostart_types::api::{Identity, NewTaskRequest, TaskFilter};
use prostart_types::models::{Role, Task, TaskId, TaskStatus, User, UserId};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::ids::next_id;
use crate::middleware::authenticated_user;

pub fn publish_task(db: &Database, identity: &Identity, req: NewTaskRequest) -> ApiResult<Task> {
    if identity.role != Role::Company {
        return Err(ApiError::Forbidden("only companies can publish tasks"));
    }

    let users = db.users()?;
    let company = authenticated_user(&users, identity)?;

    let title = required(&req.title, "title")?;
    let description = required(&req.description, "description")?;
    let direction = required(&req.direction, "direction")?;
    let level = required(&req.level, "level")?;

    let mut tasks = db.tasks()?;
    let task = Task {
        id: next_id(tasks.iter().map(|t| t.id)),
        title,
        company_id: company.id,
        company_name: company.name.clone(),
        direction,
        level,
        description,
        applicants: vec![],
        status: TaskStatus::Open,
        assigned_to: None,
    };

    tasks.push(task.clone());
    db.save_tasks(&tasks)?;

    info!(task_id = task.id, company_id = company.id, "published task");
    Ok(task)
}

fn required(value: &str, field: &'static str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::MissingField(field));
    }
    Ok(value.to_string())
}

/// Add the acting student to the task's applicants. Applying twice is an error.
pub fn apply_to_task(db: &Database, identity: &Identity, task_id: TaskId) -> ApiResult<Task> {
    if identity.role != Role::Student {
        return Err(ApiError::Forbidden("only students can apply to tasks"));
    }

    let users = db.users()?;
    let student = authenticated_user(&users, identity)?;

    let mut tasks = db.tasks()?;
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or(ApiError::TaskNotFound(task_id))?;

    if task.has_applicant(student.id) {
        warn!(task_id, user_id = student.id, "duplicate application");
        return Err(ApiError::AlreadyApplied {
            user_id: student.id,
            task_id,
        });
    }

    task.applicants.push(student.id);
    let updated = task.clone();
    db.save_tasks(&tasks)?;

    info!(task_id, user_id = student.id, "applied to task");
    Ok(updated)
}

/// Hand the task to one of its applicants; only the owning company may do this.
pub fn assign_task(
    db: &Database,
    identity: &Identity,
    task_id: TaskId,
    student_id: UserId,
) -> ApiResult<Task> {
    let users = db.users()?;
    let company = authenticated_user(&users, identity)?;

    let mut tasks = db.tasks()?;
    let task = tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or(ApiError::TaskNotFound(task_id))?;

    if task.company_id != company.id {
        return Err(ApiError::Forbidden("only the owning company can assign this task"));
    }
    if !task.has_applicant(student_id) {
        return Err(ApiError::NotAnApplicant {
            user_id: student_id,
            task_id,
        });
    }

    task.assigned_to = Some(student_id);
    task.status = TaskStatus::InProgress;
    let updated = task.clone();
    db.save_tasks(&tasks)?;

    info!(task_id, student_id, "assigned task");
    Ok(updated)
}

/// Tasks whose title or description contains `search` (case-insensitive) and
/// whose direction and level equal the given values.
pub fn filter_tasks(db: &Database, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
    let search = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();
    let direction = filter.direction.as_deref().filter(|d| !d.is_empty());
    let level = filter.level.as_deref().filter(|l| !l.is_empty());

    let tasks = db
        .tasks()?
        .into_iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&search) || t.description.to_lowercase().contains(&search)
        })
        .filter(|t| direction.is_none_or(|d| t.direction == d))
        .filter(|t| level.is_none_or(|l| t.level == l))
        .collect();

    Ok(tasks)
}

pub fn tasks_for_company(db: &Database, company_id: UserId) -> ApiResult<Vec<Task>> {
    Ok(db
        .tasks()?
        .into_iter()
        .filter(|t| t.company_id == company_id)
        .collect())
}

/// Users who applied to the task, in application order. Unknown ids are skipped.
pub fn applicants(db: &Database, task_id: TaskId) -> ApiResult<Vec<User>> {
    let task = db.task_by_id(task_id)?.ok_or(ApiError::TaskNotFound(task_id))?;
    let users = db.users()?;

    Ok(task
        .applicants
        .iter()
        .filter_map(|id| users.iter().find(|u| u.id == *id).cloned())
        .collect())
}

/// Display label for a difficulty level; older records used seniority names.
pub fn difficulty_label(level: &str) -> &str {
    match level {
        "Junior" => "Easiest",
        "Middle" => "Easy",
        "Senior" => "Medium",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(db: &Database, id: UserId) -> Identity {
        Identity::from(&db.user_by_id(id).unwrap().unwrap())
    }

    fn new_task(title: &str) -> NewTaskRequest {
        NewTaskRequest {
            title: title.into(),
            description: "Write the API".into(),
            direction: "Backend".into(),
            level: "Easy".into(),
        }
    }

    #[test]
    fn test_publish_requires_company() {
        let db = Database::open_in_memory(true).unwrap();

        let err = publish_task(&db, &identity(&db, 1), new_task("x")).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let task = publish_task(&db, &identity(&db, 3), new_task("  Billing service ")).unwrap();
        assert_eq!(task.title, "Billing service");
        assert_eq!(task.company_name, "TechnoStart LLC");
        assert_eq!(task.status, TaskStatus::Open);
        assert_eq!(tasks_for_company(&db, 3).unwrap().len(), 3);
    }

    #[test]
    fn test_publish_rejects_blank_fields() {
        let db = Database::open_in_memory(true).unwrap();
        let mut req = new_task("Title");
        req.level = " ".into();

        let err = publish_task(&db, &identity(&db, 3), req).unwrap_err();
        assert!(matches!(err, ApiError::MissingField("level")));
        assert_eq!(db.tasks().unwrap().len(), 2);
    }

    #[test]
    fn test_apply_is_append_only_and_unique() {
        let db = Database::open_in_memory(true).unwrap();
        let student = identity(&db, 1);

        let task = apply_to_task(&db, &student, 1).unwrap();
        assert_eq!(task.applicants, vec![1]);

        let err = apply_to_task(&db, &student, 1).unwrap_err();
        assert!(matches!(err, ApiError::AlreadyApplied { user_id: 1, task_id: 1 }));

        assert!(matches!(
            apply_to_task(&db, &identity(&db, 2), 1),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            apply_to_task(&db, &student, 404),
            Err(ApiError::TaskNotFound(404))
        ));
        assert_eq!(applicants(&db, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_assign_to_applicant() {
        let db = Database::open_in_memory(true).unwrap();
        let company = identity(&db, 3);

        assert!(matches!(
            assign_task(&db, &company, 1, 1),
            Err(ApiError::NotAnApplicant { .. })
        ));

        apply_to_task(&db, &identity(&db, 1), 1).unwrap();
        let task = assign_task(&db, &company, 1, 1).unwrap();
        assert_eq!(task.assigned_to, Some(1));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.can_chat(1));

        assert!(matches!(
            assign_task(&db, &identity(&db, 2), 1, 1),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_filter_tasks() {
        let db = Database::open_in_memory(true).unwrap();

        let all = filter_tasks(&db, &TaskFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let by_text = filter_tasks(
            &db,
            &TaskFilter {
                search: Some("FIGMA".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].id, 2);

        let by_direction = filter_tasks(
            &db,
            &TaskFilter {
                direction: Some("Web Development".into()),
                level: Some("Medium".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(by_direction.is_empty());
    }

    #[test]
    fn test_difficulty_labels() {
        assert_eq!(difficulty_label("Junior"), "Easiest");
        assert_eq!(difficulty_label("Senior"), "Medium");
        assert_eq!(difficulty_label("Hard"), "Hard");
    }
}
