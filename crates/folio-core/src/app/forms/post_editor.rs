//! Post editor form reducer: load an existing post, validate edits, gate the
//! save request on error-free fields.

use crate::app::forms::field::FieldState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEditorState {
    pub title: FieldState,
    pub body: FieldState,
    pub is_loading: bool,
    /// The lookup came back falsy: render the dedicated not-found view, not
    /// a loading or error state.
    pub not_found: bool,
    pub is_saving: bool,
    /// Send counter for the save request.
    pub send_count: u64,
}

impl PostEditorState {
    pub fn new() -> Self {
        Self {
            title: FieldState::default(),
            body: FieldState::default(),
            is_loading: true,
            not_found: false,
            is_saving: false,
            send_count: 0,
        }
    }
}

impl Default for PostEditorState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostEditorAction {
    FetchComplete { title: String, body: String },
    FetchMissing,
    TitleUpdate(String),
    BodyUpdate(String),
    TitleRules,
    BodyRules,
    SubmitRequest,
    SaveRequestStarted,
    SaveRequestFinished,
}

pub fn reduce(state: &mut PostEditorState, action: PostEditorAction) {
    match action {
        PostEditorAction::FetchComplete { title, body } => {
            state.title.value = title;
            state.body.value = body;
            state.is_loading = false;
        }
        PostEditorAction::FetchMissing => {
            state.is_loading = false;
            state.not_found = true;
        }
        PostEditorAction::TitleUpdate(value) => {
            state.title.accept(value);
        }
        PostEditorAction::BodyUpdate(value) => {
            state.body.accept(value);
        }
        PostEditorAction::TitleRules => {
            if state.title.value.trim().is_empty() {
                state.title.fail("You must provide a title.");
            }
        }
        PostEditorAction::BodyRules => {
            if state.body.value.trim().is_empty() {
                state.body.fail("You must provide body content.");
            }
        }
        PostEditorAction::SubmitRequest => {
            if !state.title.has_errors && !state.body.has_errors {
                state.send_count += 1;
            }
        }
        PostEditorAction::SaveRequestStarted => {
            state.is_saving = true;
        }
        PostEditorAction::SaveRequestFinished => {
            state.is_saving = false;
        }
    }
}
