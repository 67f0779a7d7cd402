use crate::app::domain::state::ChatMessage;
use crate::session::UserIdentity;

/// Every legal transition of the global state. The enum is closed, so the
/// reducer is total by construction and exhaustiveness is checked at compile
/// time.
#[derive(Debug, Clone)]
pub enum Action {
    Login(UserIdentity),
    Logout,
    FlashMessage(String),

    OpenSearch,
    CloseSearch,

    ToggleChat,
    CloseChat,
    IncrementUnreadChatCount,
    ClearUnreadChatCount,

    /// An inbound message delivered by the realtime channel, in arrival
    /// order.
    ChatMessageReceived(ChatMessage),
    /// A message the local user composed. Appended optimistically; the
    /// matching outbound send is fire-and-forget.
    ChatMessageSent(ChatMessage),
}
