use serde::{Deserialize, Serialize};

use crate::models::{Conversation, ConversationId, Message, Role, Task, User, UserId};

// -- Identity --

/// The authenticated caller. Resolved once from the stored session and passed
/// explicitly into every operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            role: user.role,
        }
    }
}

// -- Auth --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Profile --

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub expertise: Option<String>,
}

// -- Tasks --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTaskRequest {
    pub title: String,
    pub description: String,
    pub direction: String,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub search: Option<String>,
    pub direction: Option<String>,
    pub level: Option<String>,
}

// -- Conversations --

/// One row of the dialog list.
#[derive(Debug, Clone, Serialize)]
pub struct DialogSummary {
    pub conversation: Conversation,
    pub counterpart: Option<User>,
    pub task: Option<Task>,
    pub last_message: Option<Message>,
}

/// An opened conversation with its user-written messages.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationView {
    pub conversation: Conversation,
    pub counterpart: Option<User>,
    pub task: Option<Task>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessengerState {
    pub dialogs: Vec<DialogSummary>,
    pub active: Option<ConversationId>,
}
