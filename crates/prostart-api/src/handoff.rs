//! Intents handed from one view to the next through scratch keys.
//!
//! A view that wants the messenger to open a particular conversation stashes
//! an [`Intent`]; the messenger takes every pending intent once, clearing the
//! keys as it reads them.

use prostart_db::Database;
use prostart_db::models::Key;
use prostart_types::models::{TaskId, UserId};
use tracing::{debug, warn};

use crate::error::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Open the conversation about a task with its owning company.
    TaskChat(TaskId),
    /// A student wants to talk to this mentor.
    MentorChat(UserId),
    /// A mentor wants to talk to this student.
    StudentChat(UserId),
}

impl Intent {
    fn key(&self) -> Key {
        match self {
            Self::TaskChat(_) => Key::PendingTaskChat,
            Self::MentorChat(_) => Key::PendingMentorChat,
            Self::StudentChat(_) => Key::PendingStudentChat,
        }
    }

    fn target(&self) -> i64 {
        match *self {
            Self::TaskChat(id) | Self::MentorChat(id) | Self::StudentChat(id) => id,
        }
    }
}

/// Record an intent for the next messenger start. Replaces a pending intent of the same kind.
pub fn stash(db: &Database, intent: Intent) -> ApiResult<()> {
    let replaced = db.contains(intent.key())?;
    db.set_json(intent.key(), &intent.target())?;
    debug!(?intent, replaced, "stashed intent");
    Ok(())
}

/// Read and clear every pending intent, task first, then mentor, then student.
///
/// A value that cannot be decoded is dropped with a warning; it has already
/// been cleared, so it cannot block later starts.
pub fn take_pending(db: &Database) -> ApiResult<Vec<Intent>> {
    let slots: [(Key, fn(i64) -> Intent); 3] = [
        (Key::PendingTaskChat, Intent::TaskChat),
        (Key::PendingMentorChat, Intent::MentorChat),
        (Key::PendingStudentChat, Intent::StudentChat),
    ];

    let mut intents = Vec::new();
    for (key, make) in slots {
        match db.take_json::<i64>(key) {
            Ok(Some(id)) => intents.push(make(id)),
            Ok(None) => {}
            Err(e) => warn!(key = key.as_str(), error = %e, "dropping unreadable intent"),
        }
    }
    Ok(intents)
}
