use anyhow::Result;
use chrono::{Duration, Utc};
use prostart_types::models::{
    Conversation, ConversationKind, Message, ParticipantPair, Role, Task, TaskStatus, User,
};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::models::Key;

/// Fill every collection that does not exist yet with the demo data set.
pub(crate) fn apply(conn: &Connection) -> Result<()> {
    let mut seeded = 0;
    seeded += insert_if_absent(conn, Key::Users, &users())?;
    seeded += insert_if_absent(conn, Key::Tasks, &tasks())?;
    seeded += insert_if_absent(conn, Key::Chats, &conversations())?;

    if seeded > 0 {
        info!("Seeded {} empty collections with demo data", seeded);
    }
    Ok(())
}

fn insert_if_absent<T: Serialize + ?Sized>(conn: &Connection, key: Key, value: &T) -> Result<usize> {
    let json = serde_json::to_string(value)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO kv (key, value) VALUES (?1, ?2)",
        (key.as_str(), &json),
    )?;
    Ok(inserted)
}

fn users() -> Vec<User> {
    let mut student = User::new(
        1,
        "Ivan Studentov".into(),
        "student@test.com".into(),
        "password".into(),
        Role::Student,
    );
    student.level = Some("Beginner 2".into());
    student.experience = Some(150);

    let mut design_mentor = User::new(
        2,
        "Maria Mentor".into(),
        "mentor@test.com".into(),
        "password".into(),
        Role::Mentor,
    );
    design_mentor.expertise = Some("UI/UX Design".into());

    let company = User::new(
        3,
        "TechnoStart LLC".into(),
        "company@test.com".into(),
        "password".into(),
        Role::Company,
    );

    let mut web_mentor = User::new(
        4,
        "Alexei Kodman".into(),
        "alexei@test.com".into(),
        "password".into(),
        Role::Mentor,
    );
    web_mentor.expertise = Some("Web Development".into());

    vec![student, design_mentor, company, web_mentor]
}

fn tasks() -> Vec<Task> {
    vec![
        Task {
            id: 1,
            title: "Landing page for a SaaS product".into(),
            company_id: 3,
            company_name: "TechnoStart LLC".into(),
            direction: "Web Development".into(),
            level: "Easy".into(),
            description: "Build a responsive landing page with clean code and a modern design."
                .into(),
            applicants: vec![],
            status: TaskStatus::Open,
            assigned_to: None,
        },
        Task {
            id: 2,
            title: "Mobile app prototype".into(),
            company_id: 3,
            company_name: "TechnoStart LLC".into(),
            direction: "UI/UX Design".into(),
            level: "Medium".into(),
            description: "Build a clickable Figma prototype for a new application.".into(),
            applicants: vec![1],
            status: TaskStatus::InProgress,
            assigned_to: Some(1),
        },
    ]
}

fn conversations() -> Vec<Conversation> {
    let now = Utc::now();
    vec![Conversation {
        id: 101,
        task_id: Some(2),
        kind: ConversationKind::Task,
        participants: ParticipantPair::new(1, 3),
        messages: vec![
            Message {
                sender_id: 3,
                text: "Hello Ivan! Your application for task #2 stands out.".into(),
                timestamp: now - Duration::hours(1),
            },
            Message {
                sender_id: 1,
                text: "Thank you! I am ready to start.".into(),
                timestamp: now - Duration::minutes(30),
            },
        ],
    }]
}
