use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type TaskId = i64;
pub type ConversationId = i64;

/// Sender id of conversation-creation announcements. Never a real user.
pub const SYSTEM_SENDER_ID: UserId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Mentor => "mentor",
            Self::Company => "company",
        }
    }

    /// Human-facing role name used on profile pages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Mentor => "Mentor",
            Self::Company => "Employer company",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "mentor" => Ok(Self::Mentor),
            "company" => Ok(Self::Company),
            other => Err(format!("unknown role '{other}' (expected student, mentor or company)")),
        }
    }
}

/// A registered account. Role-specific attributes are only present for the
/// role that owns them, and are omitted from the stored JSON otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expertise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_tasks: Option<Vec<TaskId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl User {
    /// Build a freshly registered user with the defaults of its role.
    pub fn new(id: UserId, name: String, email: String, password: String, role: Role) -> Self {
        let student = role == Role::Student;
        Self {
            id,
            name,
            email,
            password,
            role,
            portfolio: student.then(Vec::new),
            expertise: (role == Role::Mentor).then(String::new),
            posted_tasks: (role == Role::Company).then(Vec::new),
            experience: student.then_some(0),
            level: student.then(|| "Beginner 1".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("Open"),
            Self::InProgress => f.write_str("In Progress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub company_id: UserId,
    pub company_name: String,
    pub direction: String,
    pub level: String,
    pub description: String,
    #[serde(default)]
    pub applicants: Vec<UserId>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
}

impl Task {
    pub fn has_applicant(&self, user_id: UserId) -> bool {
        self.applicants.contains(&user_id)
    }

    /// Applicants and the assignee may open the task conversation.
    pub fn can_chat(&self, user_id: UserId) -> bool {
        self.has_applicant(user_id) || self.assigned_to == Some(user_id)
    }
}

/// Two participant ids kept in ascending order, so `(a, b)` and `(b, a)`
/// compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[UserId; 2]", into = "[UserId; 2]")]
pub struct ParticipantPair([UserId; 2]);

impl ParticipantPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b { Self([a, b]) } else { Self([b, a]) }
    }

    pub fn first(&self) -> UserId {
        self.0[0]
    }

    pub fn second(&self) -> UserId {
        self.0[1]
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.0.contains(&user_id)
    }

    /// The participant that is not `user_id`, or `None` if `user_id` is not in the pair.
    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        match self.0 {
            [a, b] if a == user_id => Some(b),
            [a, b] if b == user_id => Some(a),
            _ => None,
        }
    }
}

impl From<[UserId; 2]> for ParticipantPair {
    fn from([a, b]: [UserId; 2]) -> Self {
        Self::new(a, b)
    }
}

impl From<ParticipantPair> for [UserId; 2] {
    fn from(pair: ParticipantPair) -> Self {
        pair.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversationKind {
    Task,
    MentorStudent,
    Direct,
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => f.write_str("task"),
            Self::MentorStudent => f.write_str("mentor-student"),
            Self::Direct => f.write_str("direct"),
        }
    }
}

/// Kinds a conversation outside any task can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectKind {
    Direct,
    MentorStudent,
}

impl From<DirectKind> for ConversationKind {
    fn from(kind: DirectKind) -> Self {
        match kind {
            DirectKind::Direct => Self::Direct,
            DirectKind::MentorStudent => Self::MentorStudent,
        }
    }
}

/// Uniqueness key: at most one conversation exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub participants: ParticipantPair,
    pub task_id: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(rename = "chatType")]
    pub kind: ConversationKind,
    pub participants: ParticipantPair,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Conversation {
    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            participants: self.participants,
            task_id: self.task_id,
        }
    }

    pub fn counterpart(&self, user_id: UserId) -> Option<UserId> {
        self.participants.other(user_id)
    }

    /// Messages written by users, in insertion order.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_system())
    }

    pub fn last_visible_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| !m.is_system())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub sender_id: UserId,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn system(text: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender_id: SYSTEM_SENDER_ID,
            text,
            timestamp,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id == SYSTEM_SENDER_ID
    }
}
