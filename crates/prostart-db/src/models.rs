/// Fixed keys under which the platform keeps its state.
///
/// The string names are the historical storage layout and must not change,
/// or existing stores lose their data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Users,
    Tasks,
    /// Conversations; stored as "chats" for historical reasons.
    Chats,
    CurrentUser,
    /// Scratch values handing an intent from one view to the next.
    PendingTaskChat,
    PendingMentorChat,
    PendingStudentChat,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "prostartUsers",
            Self::Tasks => "prostartTasks",
            Self::Chats => "prostartChats",
            Self::CurrentUser => "prostartCurrentUser",
            Self::PendingTaskChat => "prostartCurrentChatTask",
            Self::PendingMentorChat => "prostartCurrentChatMentor",
            Self::PendingStudentChat => "prostartCurrentChatStudent",
        }
    }
}

/// Raw row of the `kv` table.
pub struct KvRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}
