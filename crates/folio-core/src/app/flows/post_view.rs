//! Single-post view flow: fetch with not-found handling, and the delete
//! path that resolves to a navigation target.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, ApiError, Post};
use crate::app::domain::Action;
use crate::app::flows::lock;
use crate::app::runtime::Lineage;
use crate::app::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum PostViewState {
    Loading,
    Loaded(Post),
    /// The lookup came back falsy. A dedicated view, not an error.
    NotFound,
}

#[derive(Clone)]
pub struct PostViewFlow {
    inner: Arc<PostViewFlowInner>,
}

struct PostViewFlowInner {
    store: Store,
    api: Arc<ApiClient>,
    post_id: String,
    state: Mutex<PostViewState>,
    state_tx: watch::Sender<PostViewState>,
    fetch: Mutex<Lineage>,
}

impl PostViewFlow {
    pub fn new(store: Store, api: Arc<ApiClient>, post_id: impl Into<String>) -> Self {
        let state = PostViewState::Loading;
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(PostViewFlowInner {
                store,
                api,
                post_id: post_id.into(),
                state: Mutex::new(state),
                state_tx,
                fetch: Mutex::new(Lineage::new()),
            }),
        }
    }

    pub fn state(&self) -> PostViewState {
        lock(&self.inner.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PostViewState> {
        self.inner.state_tx.subscribe()
    }

    pub fn load(&self) {
        let api = Arc::clone(&self.inner.api);
        let id = self.inner.post_id.clone();
        let flow = self.clone();
        lock(&self.inner.fetch).fire(
            move |cancel| async move { api.fetch_post(&id, &cancel).await },
            move |post| {
                let next = match post {
                    Some(post) => PostViewState::Loaded(post),
                    None => PostViewState::NotFound,
                };
                *lock(&flow.inner.state) = next.clone();
                flow.inner.state_tx.send_replace(next);
            },
        );
    }

    pub fn detach(&self) {
        lock(&self.inner.fetch).cancel();
    }

    /// Delete the post. On the server's success ack this appends a flash
    /// message and resolves to the acting user's profile path — the
    /// navigation target for the caller. Any other ack means the user lacks
    /// permission; that surfaces as a flash message, not a failure.
    pub async fn delete(&self, cancel: &CancellationToken) -> Result<Option<String>, ApiError> {
        let Some(user) = self.inner.store.state().user else {
            tracing::warn!("post delete requested while logged out");
            return Ok(None);
        };

        let deleted = self
            .inner
            .api
            .delete_post(&self.inner.post_id, &user.token, cancel)
            .await?;

        if deleted {
            self.inner.store.dispatch(Action::FlashMessage(
                "Post was successfully deleted.".to_string(),
            ));
            Ok(Some(format!("/profile/{}", user.username)))
        } else {
            self.inner.store.dispatch(Action::FlashMessage(
                "You do not have permission to perform that action.".to_string(),
            ));
            Ok(None)
        }
    }
}
