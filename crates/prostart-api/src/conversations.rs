//! Conversation matcher.
//!
//! Resolves a requester and a counterpart (another user, or the company that
//! owns a task) to exactly one conversation, creating it on first contact.
//! A conversation is identified by its [`ConversationKey`]: the sorted
//! participant pair plus the task id, `None` for direct conversations. The
//! same two users can therefore hold one conversation per task and one direct
//! conversation without any of them colliding.

use prostart_db::Database;
use prostart_types::api::{ConversationView, DialogSummary, Identity};
use prostart_types::models::{
    Conversation, ConversationId, ConversationKey, ConversationKind, DirectKind, Message,
    ParticipantPair, Role, SYSTEM_SENDER_ID, TaskId, UserId,
};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::ids::{next_id, now};
use crate::middleware::authenticated_user;

/// Conversation between the requester and the company owning `task_id`.
pub fn find_or_create_task_conversation(
    db: &Database,
    identity: &Identity,
    task_id: TaskId,
) -> ApiResult<Conversation> {
    let users = db.users()?;
    let requester = authenticated_user(&users, identity)?;

    let task = db.task_by_id(task_id)?.ok_or_else(|| {
        warn!(task_id, "cannot open task conversation: task not found");
        ApiError::TaskNotFound(task_id)
    })?;

    if task.company_id == requester.id {
        warn!(task_id, "cannot open task conversation with the owning company itself");
        return Err(ApiError::SelfConversation);
    }

    let key = ConversationKey {
        participants: ParticipantPair::new(requester.id, task.company_id),
        task_id: Some(task_id),
    };

    find_or_create(db, key, ConversationKind::Task, || {
        format!("Conversation for task \"{}\" created.", task.title)
    })
}

/// Conversation between the requester and `counterpart_id`, not tied to any task.
pub fn find_or_create_direct_conversation(
    db: &Database,
    identity: &Identity,
    counterpart_id: UserId,
    kind: DirectKind,
) -> ApiResult<Conversation> {
    let users = db.users()?;
    let requester = authenticated_user(&users, identity)?;

    if counterpart_id == requester.id {
        return Err(ApiError::SelfConversation);
    }

    let counterpart = users.iter().find(|u| u.id == counterpart_id).ok_or_else(|| {
        warn!(counterpart_id, "cannot open direct conversation: user not found");
        ApiError::UserNotFound(counterpart_id)
    })?;

    let key = ConversationKey {
        participants: ParticipantPair::new(requester.id, counterpart_id),
        task_id: None,
    };

    // Names are captured now; later renames do not rewrite this message.
    find_or_create(db, key, kind.into(), || {
        format!(
            "Conversation between \"{}\" and \"{}\" created.",
            requester.name, counterpart.name
        )
    })
}

fn find_or_create(
    db: &Database,
    key: ConversationKey,
    kind: ConversationKind,
    announcement: impl FnOnce() -> String,
) -> ApiResult<Conversation> {
    let mut conversations = db.conversations()?;

    if let Some(existing) = conversations.iter().find(|c| c.key() == key) {
        debug!(conversation_id = existing.id, "found existing conversation");
        return Ok(existing.clone());
    }

    let conversation = Conversation {
        id: next_id(conversations.iter().map(|c| c.id)),
        task_id: key.task_id,
        kind,
        participants: key.participants,
        messages: vec![Message::system(announcement(), now())],
    };

    conversations.push(conversation.clone());
    db.save_conversations(&conversations)?;

    info!(
        conversation_id = conversation.id,
        kind = %kind,
        first = key.participants.first(),
        second = key.participants.second(),
        task_id = ?key.task_id,
        "created conversation"
    );
    Ok(conversation)
}

/// Append a message from the acting user. The stored text is trimmed.
pub fn append_message(
    db: &Database,
    identity: &Identity,
    conversation_id: ConversationId,
    text: &str,
) -> ApiResult<Message> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let users = db.users()?;
    let sender = authenticated_user(&users, identity)?;
    if sender.id == SYSTEM_SENDER_ID {
        return Err(ApiError::Forbidden("the system sender id cannot post messages"));
    }

    let mut conversations = db.conversations()?;
    let conversation = conversations
        .iter_mut()
        .find(|c| c.id == conversation_id)
        .ok_or_else(|| {
            warn!(conversation_id, "cannot send: conversation not found");
            ApiError::ConversationNotFound(conversation_id)
        })?;

    if !conversation.participants.contains(sender.id) {
        warn!(conversation_id, user_id = sender.id, "cannot send: not a participant");
        return Err(ApiError::Forbidden("not a participant of this conversation"));
    }

    let message = Message {
        sender_id: sender.id,
        text: text.to_string(),
        timestamp: now(),
    };
    conversation.messages.push(message.clone());
    db.save_conversations(&conversations)?;

    debug!(conversation_id, user_id = sender.id, "appended message");
    Ok(message)
}

/// Conversations visible to the acting user, narrowed by its role.
pub fn list_conversations(db: &Database, identity: &Identity) -> ApiResult<Vec<DialogSummary>> {
    let users = db.users()?;
    let user = authenticated_user(&users, identity)?;
    list_conversations_for(db, user.id, Some(user.role))
}

/// Every conversation `user_id` takes part in, oldest first.
///
/// A mentor viewer only sees conversations whose counterpart is a student.
pub fn list_conversations_for(
    db: &Database,
    user_id: UserId,
    viewer_role: Option<Role>,
) -> ApiResult<Vec<DialogSummary>> {
    let users = db.users()?;
    let tasks = db.tasks()?;

    let dialogs = db
        .conversations()?
        .into_iter()
        .filter(|c| c.participants.contains(user_id))
        .map(|conversation| {
            let counterpart = conversation
                .counterpart(user_id)
                .and_then(|id| users.iter().find(|u| u.id == id))
                .cloned();
            let task = conversation
                .task_id
                .and_then(|id| tasks.iter().find(|t| t.id == id))
                .cloned();
            let last_message = conversation.last_visible_message().cloned();
            DialogSummary {
                conversation,
                counterpart,
                task,
                last_message,
            }
        })
        .filter(|dialog| {
            viewer_role != Some(Role::Mentor)
                || dialog
                    .counterpart
                    .as_ref()
                    .is_some_and(|u| u.role == Role::Student)
        })
        .collect();

    Ok(dialogs)
}

pub fn open_conversation(
    db: &Database,
    identity: &Identity,
    conversation_id: ConversationId,
) -> ApiResult<ConversationView> {
    let users = db.users()?;
    let user = authenticated_user(&users, identity)?;

    let conversation = db
        .conversations()?
        .into_iter()
        .find(|c| c.id == conversation_id)
        .ok_or_else(|| {
            warn!(conversation_id, "cannot open: conversation not found");
            ApiError::ConversationNotFound(conversation_id)
        })?;

    if !conversation.participants.contains(user.id) {
        warn!(conversation_id, user_id = user.id, "cannot open: not a participant");
        return Err(ApiError::Forbidden("not a participant of this conversation"));
    }

    let counterpart = conversation
        .counterpart(user.id)
        .and_then(|id| users.iter().find(|u| u.id == id))
        .cloned();
    let task = match conversation.task_id {
        Some(id) => db.task_by_id(id)?,
        None => None,
    };
    let messages = conversation.visible_messages().cloned().collect();

    Ok(ConversationView {
        conversation,
        counterpart,
        task,
        messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use prostart_types::models::{Task, TaskStatus, User};

    fn identity(db: &Database, id: UserId) -> Identity {
        Identity::from(&db.user_by_id(id).unwrap().unwrap())
    }

    /// Seed-free store: student 1, company 3, mentor 4 and task 2 owned by 3.
    fn fixture() -> Database {
        let db = Database::open_in_memory(false).unwrap();
        let mut mentor = User::new(4, "Alexei".into(), "m@x".into(), "p".into(), Role::Mentor);
        mentor.expertise = Some("Web Development".into());
        db.save_users(&[
            User::new(1, "Ivan".into(), "s@x".into(), "p".into(), Role::Student),
            User::new(3, "TechnoStart".into(), "c@x".into(), "p".into(), Role::Company),
            mentor,
        ])
        .unwrap();
        db.save_tasks(&[Task {
            id: 2,
            title: "Prototype".into(),
            company_id: 3,
            company_name: "TechnoStart".into(),
            direction: "UI/UX Design".into(),
            level: "Medium".into(),
            description: "Figma".into(),
            applicants: vec![1],
            status: TaskStatus::Open,
            assigned_to: None,
        }])
        .unwrap();
        db
    }

    #[test]
    fn test_task_conversation_is_created_once() {
        let db = fixture();
        let student = identity(&db, 1);

        let first = find_or_create_task_conversation(&db, &student, 2).unwrap();
        assert_eq!(first.participants, ParticipantPair::new(1, 3));
        assert_eq!(first.task_id, Some(2));
        assert_eq!(first.kind, ConversationKind::Task);
        assert_eq!(first.messages.len(), 1);
        assert!(first.messages[0].is_system());
        assert_eq!(first.messages[0].text, "Conversation for task \"Prototype\" created.");

        let again = find_or_create_task_conversation(&db, &student, 2).unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(db.conversations().unwrap().len(), 1);
    }

    #[test]
    fn test_company_side_resolves_to_same_task_conversation() {
        let db = fixture();
        let created = find_or_create_task_conversation(&db, &identity(&db, 1), 2).unwrap();

        // The company cannot open its own task conversation; it reaches the
        // thread through its dialog list instead.
        let err = find_or_create_task_conversation(&db, &identity(&db, 3), 2).unwrap_err();
        assert!(matches!(err, ApiError::SelfConversation));

        let dialogs = list_conversations(&db, &identity(&db, 3)).unwrap();
        assert_eq!(dialogs.len(), 1);
        assert_eq!(dialogs[0].conversation.id, created.id);
    }

    #[test]
    fn test_direct_conversation_is_order_independent() {
        let db = fixture();
        let from_student =
            find_or_create_direct_conversation(&db, &identity(&db, 1), 4, DirectKind::MentorStudent)
                .unwrap();
        let from_mentor =
            find_or_create_direct_conversation(&db, &identity(&db, 4), 1, DirectKind::MentorStudent)
                .unwrap();

        assert_eq!(from_student.id, from_mentor.id);
        assert_eq!(from_student.participants, ParticipantPair::new(1, 4));
        assert_eq!(from_student.task_id, None);
        assert_eq!(
            from_student.messages[0].text,
            "Conversation between \"Ivan\" and \"Alexei\" created."
        );
    }

    #[test]
    fn test_task_and_direct_conversations_never_merge() {
        let db = fixture();
        let student = identity(&db, 1);

        let direct = find_or_create_direct_conversation(&db, &student, 3, DirectKind::Direct).unwrap();
        let task = find_or_create_task_conversation(&db, &student, 2).unwrap();

        assert_ne!(direct.id, task.id);
        assert_eq!(direct.participants, task.participants);
        assert_eq!(direct.kind, ConversationKind::Direct);

        let direct_again =
            find_or_create_direct_conversation(&db, &student, 3, DirectKind::Direct).unwrap();
        assert_eq!(direct_again.id, direct.id);
        assert_eq!(db.conversations().unwrap().len(), 2);
    }

    #[test]
    fn test_preconditions_abort_without_writes() {
        let db = fixture();
        let student = identity(&db, 1);
        let ghost = Identity {
            user_id: 99,
            name: "Ghost".into(),
            role: Role::Student,
        };

        assert!(matches!(
            find_or_create_task_conversation(&db, &student, 77),
            Err(ApiError::TaskNotFound(77))
        ));
        assert!(matches!(
            find_or_create_task_conversation(&db, &ghost, 2),
            Err(ApiError::NotAuthenticated)
        ));
        assert!(matches!(
            find_or_create_direct_conversation(&db, &student, 55, DirectKind::Direct),
            Err(ApiError::UserNotFound(55))
        ));
        assert!(matches!(
            find_or_create_direct_conversation(&db, &student, 1, DirectKind::Direct),
            Err(ApiError::SelfConversation)
        ));
        assert!(db.conversations().unwrap().is_empty());
    }

    #[test]
    fn test_append_keeps_prior_messages() {
        let db = fixture();
        let student = identity(&db, 1);
        let conv = find_or_create_task_conversation(&db, &student, 2).unwrap();

        append_message(&db, &student, conv.id, "  hello  ").unwrap();
        append_message(&db, &identity(&db, 3), conv.id, "welcome").unwrap();

        let stored = &db.conversations().unwrap()[0];
        assert_eq!(stored.messages.len(), 3);
        assert_eq!(stored.messages[0], conv.messages[0]);
        assert_eq!(stored.messages[1].text, "hello");
        assert_eq!(stored.messages[1].sender_id, 1);
        assert_eq!(stored.messages[2].sender_id, 3);
    }

    #[test]
    fn test_append_rejections() {
        let db = fixture();
        let student = identity(&db, 1);
        let conv = find_or_create_task_conversation(&db, &student, 2).unwrap();

        assert!(matches!(
            append_message(&db, &student, conv.id, "   "),
            Err(ApiError::EmptyMessage)
        ));
        assert!(matches!(
            append_message(&db, &student, 12345, "hi"),
            Err(ApiError::ConversationNotFound(12345))
        ));
        assert!(matches!(
            append_message(&db, &identity(&db, 4), conv.id, "hi"),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(db.conversations().unwrap()[0].messages.len(), 1);
    }

    #[test]
    fn test_system_sender_cannot_post() {
        let db = fixture();
        let mut users = db.users().unwrap();
        users.push(User::new(
            SYSTEM_SENDER_ID,
            "System".into(),
            "sys@x".into(),
            "p".into(),
            Role::Student,
        ));
        db.save_users(&users).unwrap();

        let system = identity(&db, SYSTEM_SENDER_ID);
        let conv = find_or_create_direct_conversation(&db, &system, 1, DirectKind::Direct).unwrap();
        assert!(conv.participants.contains(SYSTEM_SENDER_ID));

        assert!(matches!(
            append_message(&db, &system, conv.id, "hello"),
            Err(ApiError::Forbidden(_))
        ));
        assert_eq!(db.conversations().unwrap()[0].messages.len(), 1);
    }

    #[test]
    fn test_mentor_list_excludes_company_threads() {
        let db = fixture();
        let mentor = identity(&db, 4);
        find_or_create_direct_conversation(&db, &mentor, 3, DirectKind::Direct).unwrap();
        let with_student =
            find_or_create_direct_conversation(&db, &mentor, 1, DirectKind::MentorStudent).unwrap();

        let dialogs = list_conversations(&db, &mentor).unwrap();
        assert_eq!(dialogs.len(), 1);
        assert_eq!(dialogs[0].conversation.id, with_student.id);

        let unfiltered = list_conversations_for(&db, 4, None).unwrap();
        assert_eq!(unfiltered.len(), 2);
    }

    #[test]
    fn test_list_keeps_insertion_order_and_previews() {
        let db = fixture();
        let student = identity(&db, 1);
        let older = find_or_create_task_conversation(&db, &student, 2).unwrap();
        let newer =
            find_or_create_direct_conversation(&db, &student, 4, DirectKind::MentorStudent).unwrap();
        append_message(&db, &student, older.id, "latest activity").unwrap();

        let dialogs = list_conversations(&db, &student).unwrap();
        let ids: Vec<_> = dialogs.iter().map(|d| d.conversation.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);

        assert_eq!(dialogs[0].task.as_ref().map(|t| t.id), Some(2));
        assert_eq!(dialogs[0].counterpart.as_ref().map(|u| u.id), Some(3));
        assert_eq!(
            dialogs[0].last_message.as_ref().map(|m| m.text.as_str()),
            Some("latest activity")
        );
        assert!(dialogs[1].last_message.is_none());
    }

    #[test]
    fn test_open_hides_system_messages() {
        let db = fixture();
        let student = identity(&db, 1);
        let conv = find_or_create_task_conversation(&db, &student, 2).unwrap();
        append_message(&db, &student, conv.id, "hi").unwrap();

        let view = open_conversation(&db, &student, conv.id).unwrap();
        assert_eq!(view.messages.len(), 1);
        assert_eq!(view.counterpart.map(|u| u.id), Some(3));
        assert_eq!(view.task.map(|t| t.title), Some("Prototype".to_string()));

        assert!(matches!(
            open_conversation(&db, &identity(&db, 4), conv.id),
            Err(ApiError::Forbidden(_))
        ));
    }
}
