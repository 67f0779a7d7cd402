use crate::session::UserIdentity;

/// Side effects a reduction requests. The reducer only describes them; the
/// store and the chat driver execute them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Mirror the logged-in identity to the session cache.
    PersistSession(UserIdentity),
    /// Erase the session cache.
    ClearSession,
    /// Establish the realtime channel for this session.
    ConnectChat,
    /// Tear the realtime channel down.
    DisconnectChat,
    /// Forward a composed message to the realtime channel.
    SendChatMessage { text: String },
}
