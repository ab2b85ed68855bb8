use prostart_types::models::{ConversationId, TaskId, UserId};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every failure aborts the operation before anything is written.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    #[error("conversation {0} not found")]
    ConversationNotFound(ConversationId),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("required field '{0}' is empty")]
    MissingField(&'static str),

    #[error("a user with email {0} already exists")]
    EmailTaken(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("user {user_id} already applied to task {task_id}")]
    AlreadyApplied { user_id: UserId, task_id: TaskId },

    #[error("user {user_id} has not applied to task {task_id}")]
    NotAnApplicant { user_id: UserId, task_id: TaskId },

    #[error("cannot open a conversation with yourself")]
    SelfConversation,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
