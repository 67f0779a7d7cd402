//! The state store: the only mutation path for [`AppState`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};

use crate::app::domain::{Action, AppState, Effect, reduce};
use crate::session::SessionCache;

/// Commands forwarded to the chat driver. The store never blocks on the
/// network; realtime effects cross this channel instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Connect,
    Disconnect,
    Send { text: String },
}

/// Explicit state container. Constructed per client (or per test) and passed
/// by handle; there is no ambient global instance.
///
/// `dispatch` is synchronous and atomic: the reducer runs and the session
/// write-through completes under one lock, so no partially-applied step is
/// observable and the cache never lags the in-memory session state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: Mutex<AppState>,
    state_tx: watch::Sender<AppState>,
    session: SessionCache,
    chat_tx: mpsc::UnboundedSender<ChatCommand>,
}

impl Store {
    /// Build a store seeded from the session cache. Returns the receiver the
    /// chat driver consumes; dropping it is fine for consumers that never
    /// run the realtime channel (chat commands are then discarded).
    pub fn new(session: SessionCache) -> (Self, mpsc::UnboundedReceiver<ChatCommand>) {
        let state = AppState::from_session(session.load());
        let (state_tx, _) = watch::channel(state.clone());
        let (chat_tx, chat_rx) = mpsc::unbounded_channel();
        let store = Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(state),
                state_tx,
                session,
                chat_tx,
            }),
        };
        (store, chat_rx)
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply an action and execute its effects. The only mutation entry
    /// point.
    pub fn dispatch(&self, action: Action) {
        let mut state = self.lock();
        let effects = reduce(&mut state, action);
        let snapshot = state.clone();
        for effect in effects {
            self.run_effect(effect);
        }
        drop(state);
        self.inner.state_tx.send_replace(snapshot);
    }

    fn run_effect(&self, effect: Effect) {
        match effect {
            Effect::PersistSession(user) => {
                if let Err(err) = self.inner.session.store(&user) {
                    tracing::error!(error = %err, "failed to persist session");
                }
            }
            Effect::ClearSession => {
                if let Err(err) = self.inner.session.clear() {
                    tracing::error!(error = %err, "failed to clear session");
                }
            }
            Effect::ConnectChat => self.send_chat(ChatCommand::Connect),
            Effect::DisconnectChat => self.send_chat(ChatCommand::Disconnect),
            Effect::SendChatMessage { text } => self.send_chat(ChatCommand::Send { text }),
        }
    }

    fn send_chat(&self, command: ChatCommand) {
        if self.inner.chat_tx.send(command).is_err() {
            tracing::debug!("chat driver not running; dropping chat command");
        }
    }

    /// Ask the chat driver to establish the channel. Covers the paths where
    /// chat becomes relevant without a fresh login: a session restored at
    /// startup, or the chat surface mounting.
    pub fn connect_chat(&self) {
        self.send_chat(ChatCommand::Connect);
    }

    /// Current state snapshot.
    pub fn state(&self) -> AppState {
        self.lock().clone()
    }

    /// Subscribe to state changes. The receiver holds the latest snapshot
    /// after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state_tx.subscribe()
    }

    pub fn session_cache(&self) -> &SessionCache {
        &self.inner.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserIdentity;

    fn alice() -> UserIdentity {
        UserIdentity {
            token: "t".to_string(),
            username: "alice".to_string(),
            avatar_url: "a.png".to_string(),
        }
    }

    fn temp_store() -> (Store, mpsc::UnboundedReceiver<ChatCommand>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        let (store, chat_rx) = Store::new(cache);
        (store, chat_rx, dir)
    }

    #[tokio::test]
    async fn login_writes_through_to_session_cache() {
        let (store, _chat_rx, _dir) = temp_store();

        store.dispatch(Action::Login(alice()));

        let cached = store.session_cache().load().unwrap();
        assert_eq!(cached.token, "t");
        assert_eq!(cached.username, "alice");
        assert_eq!(cached.avatar_url, "a.png");
    }

    #[tokio::test]
    async fn logout_erases_session_cache() {
        let (store, _chat_rx, _dir) = temp_store();

        store.dispatch(Action::Login(alice()));
        store.dispatch(Action::Logout);

        assert!(store.session_cache().load().is_none());
        assert!(!store.state().logged_in);
    }

    #[tokio::test]
    async fn store_restores_session_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        cache.store(&alice()).unwrap();

        let (store, _chat_rx) = Store::new(cache);
        let state = store.state();
        assert!(state.logged_in);
        assert_eq!(state.user, Some(alice()));
    }

    #[tokio::test]
    async fn login_and_logout_drive_chat_lifecycle_commands() {
        let (store, mut chat_rx, _dir) = temp_store();

        store.dispatch(Action::Login(alice()));
        store.dispatch(Action::Logout);

        assert_eq!(chat_rx.try_recv(), Ok(ChatCommand::Connect));
        assert_eq!(chat_rx.try_recv(), Ok(ChatCommand::Disconnect));
    }

    #[tokio::test]
    async fn subscribers_observe_dispatches() {
        let (store, _chat_rx, _dir) = temp_store();
        let mut rx = store.subscribe();

        store.dispatch(Action::FlashMessage("hello".to_string()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().flash_messages, vec!["hello"]);
    }

    #[tokio::test]
    async fn dropped_chat_receiver_does_not_break_dispatch() {
        let (store, chat_rx, _dir) = temp_store();
        drop(chat_rx);

        store.dispatch(Action::Login(alice()));
        assert!(store.state().logged_in);
    }

    #[test]
    fn dispatch_is_atomic_across_threads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::at_path(dir.path().join("session.toml"));
        let (store, _chat_rx) = Store::new(cache);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..250 {
                    store.dispatch(Action::IncrementUnreadChatCount);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.state().unread_chat_count, 1000);
    }
}
