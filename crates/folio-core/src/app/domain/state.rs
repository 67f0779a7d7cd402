use crate::session::UserIdentity;

/// One chat transcript entry. Identity is purely positional: the transcript
/// is append-only and never reordered or deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub author_username: String,
    pub author_avatar_url: String,
}

/// The global application state. Owned by the [`Store`](crate::app::Store)
/// and mutated only through dispatched actions.
///
/// Invariant: `logged_in == user.is_some()` after every reduction, and the
/// session cache mirrors `(logged_in, user)` at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub logged_in: bool,
    pub user: Option<UserIdentity>,
    /// Insertion order is display order; duplicates are kept.
    pub flash_messages: Vec<String>,
    pub is_search_open: bool,
    pub is_chat_open: bool,
    /// Inbound messages that arrived while the chat panel was closed, since
    /// it was last opened. Outbound appends never touch this.
    pub unread_chat_count: u64,
    pub chat_messages: Vec<ChatMessage>,
}

impl AppState {
    pub fn new() -> Self {
        Self::from_session(None)
    }

    /// Initial state at process start, seeded from the session cache.
    pub fn from_session(user: Option<UserIdentity>) -> Self {
        Self {
            logged_in: user.is_some(),
            user,
            flash_messages: Vec::new(),
            is_search_open: false,
            is_chat_open: false,
            unread_chat_count: 0,
            chat_messages: Vec::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
