use crate::app::domain::action::Action;
use crate::app::domain::effect::Effect;
use crate::app::domain::state::{AppState, ChatMessage};
use crate::session::UserIdentity;

/// Apply one action to the state. Pure: no I/O, no clock, the result depends
/// only on `(state, action)`.
pub fn reduce(state: &mut AppState, action: Action) -> Vec<Effect> {
    match action {
        Action::Login(user) => handle_login(state, user),
        Action::Logout => handle_logout(state),
        Action::FlashMessage(text) => {
            state.flash_messages.push(text);
            vec![]
        }
        Action::OpenSearch => {
            state.is_search_open = true;
            vec![]
        }
        Action::CloseSearch => {
            state.is_search_open = false;
            vec![]
        }
        Action::ToggleChat => {
            state.is_chat_open = !state.is_chat_open;
            if state.is_chat_open {
                state.unread_chat_count = 0;
            }
            vec![]
        }
        Action::CloseChat => {
            state.is_chat_open = false;
            vec![]
        }
        Action::IncrementUnreadChatCount => {
            state.unread_chat_count += 1;
            vec![]
        }
        Action::ClearUnreadChatCount => {
            state.unread_chat_count = 0;
            vec![]
        }
        Action::ChatMessageReceived(message) => handle_chat_received(state, message),
        Action::ChatMessageSent(message) => handle_chat_sent(state, message),
    }
}

fn handle_login(state: &mut AppState, user: UserIdentity) -> Vec<Effect> {
    state.logged_in = true;
    state.user = Some(user.clone());
    vec![Effect::PersistSession(user), Effect::ConnectChat]
}

fn handle_logout(state: &mut AppState) -> Vec<Effect> {
    state.logged_in = false;
    state.user = None;
    vec![Effect::ClearSession, Effect::DisconnectChat]
}

fn handle_chat_received(state: &mut AppState, message: ChatMessage) -> Vec<Effect> {
    state.chat_messages.push(message);
    if !state.is_chat_open {
        state.unread_chat_count += 1;
    }
    vec![]
}

fn handle_chat_sent(state: &mut AppState, message: ChatMessage) -> Vec<Effect> {
    // Optimistic append: the local copy lands in the transcript whether or
    // not the outbound frame is ever delivered.
    let text = message.text.clone();
    state.chat_messages.push(message);
    vec![Effect::SendChatMessage { text }]
}
