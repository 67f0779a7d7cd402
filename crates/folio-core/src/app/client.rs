//! Top-level client wiring: store, API client, chat driver, startup session
//! check, shutdown.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::app::domain::{Action, ChatMessage};
use crate::app::flows::lock;
use crate::app::runtime::Lineage;
use crate::app::store::Store;
use crate::chat::{self, ChatTransport, ConnectionState, WebSocketTransport};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::SessionCache;

pub struct Client {
    store: Store,
    api: Arc<ApiClient>,
    shutdown: CancellationToken,
    session_check: Mutex<Lineage>,
    chat_handle: JoinHandle<()>,
    chat_state: watch::Receiver<ConnectionState>,
}

impl Client {
    /// Build a client against the production WebSocket transport.
    pub fn new(config: &ClientConfig, session: SessionCache) -> Result<Self> {
        let transport = Arc::new(WebSocketTransport::new(config.chat_url.clone()));
        Self::with_transport(config, session, transport)
    }

    /// Build a client with an explicit chat transport. Tests use this to
    /// substitute scripted stubs.
    pub fn with_transport(
        config: &ClientConfig,
        session: SessionCache,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config.api_base_url)?);
        let (store, chat_commands) = Store::new(session);
        let shutdown = CancellationToken::new();
        let (chat_handle, chat_state) = chat::spawn_driver(
            store.clone(),
            transport,
            chat_commands,
            shutdown.child_token(),
        );
        Ok(Self {
            store,
            api,
            shutdown,
            session_check: Mutex::new(Lineage::new()),
            chat_handle,
            chat_state,
        })
    }

    /// Start the background concerns of a restored session: connect the
    /// chat channel and probe token validity.
    pub fn start(&self) {
        let state = self.store.state();
        if let Some(user) = state.user {
            self.store.connect_chat();
            self.check_session(user.token);
        }
    }

    /// Fire the startup token check. An invalid token logs the user out and
    /// then explains why — strictly in that order.
    fn check_session(&self, token: String) {
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        lock(&self.session_check).fire(
            move |cancel| async move { api.check_token(&token, &cancel).await },
            move |valid| {
                if !valid {
                    store.dispatch(Action::Logout);
                    store.dispatch(Action::FlashMessage(
                        "Your session has expired. Please log in again.".to_string(),
                    ));
                }
            },
        );
    }

    /// Compose a chat message: optimistic local append plus a
    /// fire-and-forget outbound frame.
    pub fn send_chat_message(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        let Some(user) = self.store.state().user else {
            tracing::warn!("chat message composed while logged out");
            return;
        };
        self.store.dispatch(Action::ChatMessageSent(ChatMessage {
            text: text.to_string(),
            author_username: user.username,
            author_avatar_url: user.avatar_url,
        }));
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn chat_state(&self) -> watch::Receiver<ConnectionState> {
        self.chat_state.clone()
    }

    /// Tear everything down: cancels the session check and the chat
    /// channel, then waits for the driver to finish.
    pub async fn shutdown(self) {
        lock(&self.session_check).cancel();
        self.shutdown.cancel();
        if self.chat_handle.await.is_err() {
            tracing::warn!("chat driver ended abnormally during shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::chat::{ChatConnection, ChatError};
    use crate::session::UserIdentity;

    struct NoopTransport;

    #[async_trait]
    impl ChatTransport for NoopTransport {
        async fn connect(&self) -> std::result::Result<Box<dyn ChatConnection>, ChatError> {
            Err(ChatError::Connect("unavailable".to_string()))
        }
    }

    fn test_client(dir: &tempfile::TempDir, with_session: bool) -> Client {
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        if with_session {
            cache
                .store(&UserIdentity {
                    token: "t".to_string(),
                    username: "alice".to_string(),
                    avatar_url: "a.png".to_string(),
                })
                .unwrap();
        }
        let config = ClientConfig {
            api_base_url: "http://localhost:9".to_string(),
            chat_url: "ws://localhost:9".to_string(),
            debounce_quiet_ms: 800,
        };
        Client::with_transport(&config, cache, Arc::new(NoopTransport)).unwrap()
    }

    #[tokio::test]
    async fn composing_while_logged_out_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&dir, false);

        client.send_chat_message("hello");
        assert!(client.store().state().chat_messages.is_empty());
    }

    #[tokio::test]
    async fn blank_messages_are_not_composed() {
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&dir, true);

        client.send_chat_message("   ");
        assert!(client.store().state().chat_messages.is_empty());
    }

    #[tokio::test]
    async fn composed_message_carries_the_author_identity() {
        let dir = tempfile::tempdir().unwrap();
        let client = test_client(&dir, true);

        client.send_chat_message("hello");

        let state = client.store().state();
        assert_eq!(state.chat_messages.len(), 1);
        assert_eq!(state.chat_messages[0].text, "hello");
        assert_eq!(state.chat_messages[0].author_username, "alice");
        assert_eq!(state.chat_messages[0].author_avatar_url, "a.png");
        // Self-authored messages never count as unread.
        assert_eq!(state.unread_chat_count, 0);
    }
}
