//! Post editor flow: load the post being edited, validate edits, save with
//! one in-flight request and a flash message on success.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::app::domain::Action;
use crate::app::flows::lock;
use crate::app::forms::post_editor::{self, PostEditorAction, PostEditorState};
use crate::app::runtime::Lineage;
use crate::app::store::Store;

#[derive(Clone)]
pub struct PostEditorFlow {
    inner: Arc<PostEditorFlowInner>,
}

struct PostEditorFlowInner {
    store: Store,
    api: Arc<ApiClient>,
    post_id: String,
    state: Mutex<PostEditorState>,
    state_tx: watch::Sender<PostEditorState>,
    fetch: Mutex<Lineage>,
    save: Mutex<Lineage>,
}

impl PostEditorFlow {
    pub fn new(store: Store, api: Arc<ApiClient>, post_id: impl Into<String>) -> Self {
        let state = PostEditorState::new();
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(PostEditorFlowInner {
                store,
                api,
                post_id: post_id.into(),
                state: Mutex::new(state),
                state_tx,
                fetch: Mutex::new(Lineage::new()),
                save: Mutex::new(Lineage::new()),
            }),
        }
    }

    pub fn state(&self) -> PostEditorState {
        lock(&self.inner.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PostEditorState> {
        self.inner.state_tx.subscribe()
    }

    /// Load the post into the editor. A falsy lookup resolves to the
    /// dedicated not-found state.
    pub fn load(&self) {
        let api = Arc::clone(&self.inner.api);
        let id = self.inner.post_id.clone();
        let flow = self.clone();
        lock(&self.inner.fetch).fire(
            move |cancel| async move { api.fetch_post(&id, &cancel).await },
            move |post| match post {
                Some(post) => flow.apply(PostEditorAction::FetchComplete {
                    title: post.title,
                    body: post.body,
                }),
                None => flow.apply(PostEditorAction::FetchMissing),
            },
        );
    }

    pub fn title_input(&self, value: &str) {
        self.apply(PostEditorAction::TitleUpdate(value.to_string()));
    }

    pub fn body_input(&self, value: &str) {
        self.apply(PostEditorAction::BodyUpdate(value.to_string()));
    }

    /// Blur handlers run the emptiness rules.
    pub fn title_blur(&self) {
        self.apply(PostEditorAction::TitleRules);
    }

    pub fn body_blur(&self) {
        self.apply(PostEditorAction::BodyRules);
    }

    pub fn submit(&self) {
        self.apply(PostEditorAction::TitleRules);
        self.apply(PostEditorAction::BodyRules);
        self.apply(PostEditorAction::SubmitRequest);
    }

    pub fn detach(&self) {
        lock(&self.inner.fetch).cancel();
        lock(&self.inner.save).cancel();
    }

    fn apply(&self, action: PostEditorAction) {
        let (snapshot, save_fired) = {
            let mut state = lock(&self.inner.state);
            let before = state.send_count;
            post_editor::reduce(&mut state, action);
            (state.clone(), state.send_count > before)
        };
        self.inner.state_tx.send_replace(snapshot.clone());
        if save_fired {
            self.fire_save(snapshot);
        }
    }

    fn fire_save(&self, snapshot: PostEditorState) {
        let Some(user) = self.inner.store.state().user else {
            tracing::warn!("post save requested while logged out");
            return;
        };

        self.apply(PostEditorAction::SaveRequestStarted);

        let api = Arc::clone(&self.inner.api);
        let id = self.inner.post_id.clone();
        let store = self.inner.store.clone();
        let flow = self.clone();
        lock(&self.inner.save).fire(
            move |cancel| async move {
                api.edit_post(
                    &id,
                    &snapshot.title.value,
                    &snapshot.body.value,
                    &user.token,
                    &cancel,
                )
                .await
            },
            move |()| {
                flow.apply(PostEditorAction::SaveRequestFinished);
                store.dispatch(Action::FlashMessage("Post was updated.".to_string()));
            },
        );
    }
}
