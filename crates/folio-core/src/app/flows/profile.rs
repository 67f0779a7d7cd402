//! Profile flow: load a profile and drive the follow/unfollow requests with
//! optimistic follower-count updates.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::api::{ApiClient, Profile};
use crate::app::flows::lock;
use crate::app::runtime::Lineage;
use crate::app::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileState {
    pub is_loading: bool,
    pub data: Option<Profile>,
    /// A follow/unfollow request is in flight; the buttons disable.
    pub follow_action_loading: bool,
    pub start_following_request_count: u64,
    pub stop_following_request_count: u64,
}

impl ProfileState {
    fn new() -> Self {
        Self {
            is_loading: true,
            data: None,
            follow_action_loading: false,
            start_following_request_count: 0,
            stop_following_request_count: 0,
        }
    }
}

#[derive(Clone)]
pub struct ProfileFlow {
    inner: Arc<ProfileFlowInner>,
}

struct ProfileFlowInner {
    store: Store,
    api: Arc<ApiClient>,
    username: String,
    state: Mutex<ProfileState>,
    state_tx: watch::Sender<ProfileState>,
    fetch: Mutex<Lineage>,
    follow: Mutex<Lineage>,
}

impl ProfileFlow {
    pub fn new(store: Store, api: Arc<ApiClient>, username: impl Into<String>) -> Self {
        let state = ProfileState::new();
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(ProfileFlowInner {
                store,
                api,
                username: username.into(),
                state: Mutex::new(state),
                state_tx,
                fetch: Mutex::new(Lineage::new()),
                follow: Mutex::new(Lineage::new()),
            }),
        }
    }

    pub fn state(&self) -> ProfileState {
        lock(&self.inner.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.inner.state_tx.subscribe()
    }

    fn session_token(&self) -> String {
        self.inner
            .store
            .state()
            .user
            .map(|u| u.token)
            .unwrap_or_default()
    }

    pub fn load(&self) {
        let api = Arc::clone(&self.inner.api);
        let username = self.inner.username.clone();
        let token = self.session_token();
        let flow = self.clone();
        lock(&self.inner.fetch).fire(
            move |cancel| async move { api.profile(&username, &token, &cancel).await },
            move |profile| {
                flow.update(|state| {
                    state.is_loading = false;
                    state.data = Some(profile);
                });
            },
        );
    }

    pub fn start_following(&self) {
        let proceed = {
            let mut state = lock(&self.inner.state);
            if state.follow_action_loading || state.data.is_none() {
                false
            } else {
                state.start_following_request_count += 1;
                state.follow_action_loading = true;
                true
            }
        };
        if !proceed {
            return;
        }
        self.publish();

        let api = Arc::clone(&self.inner.api);
        let username = self.inner.username.clone();
        let token = self.session_token();
        let flow = self.clone();
        lock(&self.inner.follow).fire(
            move |cancel| async move { api.add_follow(&username, &token, &cancel).await },
            move |()| {
                flow.update(|state| {
                    if let Some(data) = &mut state.data {
                        data.is_following = true;
                        data.counts.follower_count += 1;
                    }
                    state.follow_action_loading = false;
                });
            },
        );
    }

    pub fn stop_following(&self) {
        let proceed = {
            let mut state = lock(&self.inner.state);
            if state.follow_action_loading || state.data.is_none() {
                false
            } else {
                state.stop_following_request_count += 1;
                state.follow_action_loading = true;
                true
            }
        };
        if !proceed {
            return;
        }
        self.publish();

        let api = Arc::clone(&self.inner.api);
        let username = self.inner.username.clone();
        let token = self.session_token();
        let flow = self.clone();
        lock(&self.inner.follow).fire(
            move |cancel| async move { api.remove_follow(&username, &token, &cancel).await },
            move |()| {
                flow.update(|state| {
                    if let Some(data) = &mut state.data {
                        data.is_following = false;
                        data.counts.follower_count = data.counts.follower_count.saturating_sub(1);
                    }
                    state.follow_action_loading = false;
                });
            },
        );
    }

    pub fn detach(&self) {
        lock(&self.inner.fetch).cancel();
        lock(&self.inner.follow).cancel();
    }

    fn update(&self, mutate: impl FnOnce(&mut ProfileState)) {
        let snapshot = {
            let mut state = lock(&self.inner.state);
            mutate(&mut state);
            state.clone()
        };
        self.inner.state_tx.send_replace(snapshot);
    }

    fn publish(&self) {
        let snapshot = lock(&self.inner.state).clone();
        self.inner.state_tx.send_replace(snapshot);
    }
}
