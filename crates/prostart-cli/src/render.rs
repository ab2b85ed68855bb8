use std::fmt::Write;

use chrono::Local;
use prostart_api::ApiError;
use prostart_api::profile::student_level;
use prostart_api::tasks::difficulty_label;
use prostart_db::models::KvRow;
use prostart_types::api::{ConversationView, DialogSummary, MessengerState};
use prostart_types::models::{Role, Task, User, UserId};

const TITLE_PREVIEW: usize = 20;
const MESSAGE_PREVIEW: usize = 40;
const DESCRIPTION_PREVIEW: usize = 150;

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// User-visible notice for a failed operation.
pub fn notice(err: &ApiError) -> String {
    match err {
        ApiError::NotAuthenticated => "Please log in first (prostart login <email> <password>).".into(),
        ApiError::InvalidCredentials => "Wrong email or password.".into(),
        ApiError::EmailTaken(_) => "A user with this email already exists.".into(),
        ApiError::AlreadyApplied { .. } => "You have already applied to this task.".into(),
        other => {
            let mut text = other.to_string();
            if let Some(first) = text.get(..1) {
                let upper = first.to_uppercase();
                text.replace_range(..1, &upper);
            }
            text.push('.');
            text
        }
    }
}

/// Subtitle shown under the counterpart's name in the dialog list.
pub fn dialog_label(dialog: &DialogSummary) -> String {
    if dialog.conversation.task_id.is_some() {
        return match &dialog.task {
            Some(task) => format!("Task: {}...", truncate(&task.title, TITLE_PREVIEW)),
            None => "Task: n/a".into(),
        };
    }
    dialog
        .counterpart
        .as_ref()
        .map_or("Chat", |u| role_label(u.role))
        .to_string()
}

pub fn messenger(state: &MessengerState) -> String {
    if state.dialogs.is_empty() {
        return "You have no active conversations yet.\n".into();
    }

    let mut out = String::new();
    for dialog in &state.dialogs {
        let marker = if state.active == Some(dialog.conversation.id) { '*' } else { ' ' };
        let name = dialog.counterpart.as_ref().map_or("Unknown", |u| u.name.as_str());
        let preview = dialog
            .last_message
            .as_ref()
            .map_or_else(|| "No messages".to_string(), |m| truncate(&m.text, MESSAGE_PREVIEW));
        let _ = writeln!(
            out,
            "{marker} [{}] {name} | {} | {preview}",
            dialog.conversation.id,
            dialog_label(dialog)
        );
    }
    out
}

pub fn conversation(view: &ConversationView, viewer: UserId) -> String {
    let mut out = String::new();
    let name = view.counterpart.as_ref().map_or("User", |u| u.name.as_str());
    let _ = write!(out, "Chat with: {name}");

    match (&view.task, view.conversation.task_id) {
        (Some(task), Some(_)) => {
            let _ = write!(out, " (task: \"{}\")", task.title);
        }
        (None, None) => {
            if let Some(user) = &view.counterpart {
                let _ = write!(out, " ({})", role_label(user.role));
            }
        }
        _ => {}
    }
    out.push('\n');

    if view.messages.is_empty() {
        out.push_str("Start the conversation by sending the first message.\n");
        return out;
    }

    for message in &view.messages {
        let sender = if message.sender_id == viewer {
            "You".to_string()
        } else if view.counterpart.as_ref().is_some_and(|u| u.id == message.sender_id) {
            view.counterpart.as_ref().map(|u| u.name.clone()).unwrap_or_default()
        } else {
            "User".to_string()
        };
        let time = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
        let _ = writeln!(out, "  {time} {sender}: {}", message.text);
    }
    out
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Student => "Student",
        Role::Mentor => "Mentor",
        Role::Company => "Company",
    }
}

/// Task cards; `viewer` marks tasks the viewer applied to.
pub fn tasks(tasks: &[Task], viewer: Option<UserId>) -> String {
    if tasks.is_empty() {
        return "No tasks match these criteria.\n".into();
    }

    let mut out = String::new();
    for task in tasks {
        let applied = viewer.is_some_and(|id| task.has_applicant(id));
        let _ = writeln!(
            out,
            "[{}] {} | {} | {} | {} | {}{}",
            task.id,
            task.title,
            task.company_name,
            task.direction,
            difficulty_label(&task.level),
            task.status,
            if applied { " | applied" } else { "" }
        );
        let _ = writeln!(out, "    {}...", truncate(&task.description, DESCRIPTION_PREVIEW));
    }
    out
}

pub fn users(users: &[User], empty: &str) -> String {
    if users.is_empty() {
        return format!("{empty}\n");
    }

    let mut out = String::new();
    for user in users {
        let detail = match user.role {
            Role::Mentor => user
                .expertise
                .clone()
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "General expertise".into()),
            Role::Student => {
                let projects = user.portfolio.as_ref().map_or(0, Vec::len);
                format!("{} | portfolio: {projects} projects", student_level(user))
            }
            Role::Company => "Company".into(),
        };
        let _ = writeln!(out, "[{}] {} <{}> | {detail}", user.id, user.name, user.email);
    }
    out
}

pub fn profile(user: &User, own_tasks: &[Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} <{}>", user.name, user.email);
    let _ = writeln!(out, "Role: {}", user.role.display_name());

    match user.role {
        Role::Student => {
            let _ = writeln!(out, "Level: {}", student_level(user));
            let _ = writeln!(out, "Experience: {}", user.experience.unwrap_or(0));
        }
        Role::Mentor => {
            if let Some(expertise) = user.expertise.as_deref().filter(|e| !e.is_empty()) {
                let _ = writeln!(out, "Expertise: {expertise}");
            }
        }
        Role::Company => {
            let _ = writeln!(out, "Published tasks: {}", own_tasks.len());
            for task in own_tasks {
                let _ = writeln!(
                    out,
                    "  [{}] {} | {} | {} applications",
                    task.id,
                    task.title,
                    task.status,
                    task.applicants.len()
                );
            }
        }
    }
    out
}

pub fn entries(rows: &[KvRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "{} ({}, {} bytes)", row.key, row.updated_at, row.value.len());
        let _ = writeln!(out, "    {}", truncate(&row.value, 120));
    }
    out
}
