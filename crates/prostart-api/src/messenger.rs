use prostart_db::Database;
use prostart_types::api::{Identity, MessengerState};
use prostart_types::models::{Conversation, DirectKind, Role, UserId};
use tracing::{debug, warn};

use crate::conversations::{
    find_or_create_direct_conversation, find_or_create_task_conversation, list_conversations,
};
use crate::error::ApiResult;
use crate::handoff::Intent;

/// Start the messenger for `identity`.
///
/// Intents are applied in order and the last one that opens a conversation
/// makes it active. An intent that fails is logged and skipped. Without an
/// active conversation the first dialog in the list is selected.
pub fn initialize(db: &Database, identity: &Identity, intents: &[Intent]) -> ApiResult<MessengerState> {
    let mut active = None;

    for intent in intents {
        match resolve(db, identity, *intent) {
            Ok(Some(conversation)) => active = Some(conversation.id),
            Ok(None) => debug!(?intent, "intent does not apply to this user"),
            Err(e) => warn!(?intent, error = %e, "could not open conversation for intent"),
        }
    }

    let dialogs = list_conversations(db, identity)?;
    let active = active.or_else(|| dialogs.first().map(|d| d.conversation.id));

    Ok(MessengerState { dialogs, active })
}

fn resolve(db: &Database, identity: &Identity, intent: Intent) -> ApiResult<Option<Conversation>> {
    match intent {
        Intent::TaskChat(task_id) => {
            find_or_create_task_conversation(db, identity, task_id).map(Some)
        }
        Intent::MentorChat(mentor_id) => {
            open_if_roles(db, identity, mentor_id, Role::Student, Role::Mentor)
        }
        Intent::StudentChat(student_id) => {
            open_if_roles(db, identity, student_id, Role::Mentor, Role::Student)
        }
    }
}

/// Mentor-student conversation, only when the requester and target hold the expected roles.
fn open_if_roles(
    db: &Database,
    identity: &Identity,
    target_id: UserId,
    requester_role: Role,
    target_role: Role,
) -> ApiResult<Option<Conversation>> {
    if identity.role != requester_role {
        return Ok(None);
    }
    match db.user_by_id(target_id)? {
        Some(target) if target.role == target_role => {
            find_or_create_direct_conversation(db, identity, target_id, DirectKind::MentorStudent)
                .map(Some)
        }
        _ => Ok(None),
    }
}
