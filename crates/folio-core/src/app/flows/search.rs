//! Search overlay flow: keystrokes debounce into one request per stable
//! term, superseded searches are cancelled, results land back in the flow
//! state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::app::flows::lock;
use crate::app::forms::search::{self, SearchAction, SearchState};
use crate::app::runtime::{DebounceGate, Lineage};

#[derive(Clone)]
pub struct SearchFlow {
    inner: Arc<SearchFlowInner>,
}

struct SearchFlowInner {
    api: Arc<ApiClient>,
    state: Mutex<SearchState>,
    state_tx: watch::Sender<SearchState>,
    debounce: Mutex<DebounceGate>,
    lineage: Mutex<Lineage>,
}

impl SearchFlow {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self::with_quiet_period(api, crate::app::runtime::debounce::QUIET_PERIOD)
    }

    pub fn with_quiet_period(api: Arc<ApiClient>, quiet: Duration) -> Self {
        let state = SearchState::new();
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(SearchFlowInner {
                api,
                state: Mutex::new(state),
                state_tx,
                debounce: Mutex::new(DebounceGate::with_quiet_period(quiet)),
                lineage: Mutex::new(Lineage::new()),
            }),
        }
    }

    pub fn state(&self) -> SearchState {
        lock(&self.inner.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state_tx.subscribe()
    }

    /// Keystroke handler. A cleared term discards the pending trigger; a
    /// non-empty term restarts the quiet-period timer.
    pub fn term_input(&self, value: &str) {
        self.apply(SearchAction::TermUpdate(value.to_string()));

        let mut debounce = lock(&self.inner.debounce);
        if value.trim().is_empty() {
            debounce.cancel();
        } else {
            let flow = self.clone();
            debounce.input(move || flow.apply(SearchAction::RequestSearch));
        }
    }

    /// Consumer detach: overlay closed or unmounted. Nothing may fire after
    /// this.
    pub fn detach(&self) {
        lock(&self.inner.debounce).cancel();
        lock(&self.inner.lineage).cancel();
    }

    fn apply(&self, action: SearchAction) {
        let (snapshot, fired) = {
            let mut state = lock(&self.inner.state);
            let before = state.request_count;
            search::reduce(&mut state, action);
            (state.clone(), state.request_count > before)
        };
        self.inner.state_tx.send_replace(snapshot.clone());
        if fired {
            self.fire_search(snapshot.term);
        }
    }

    fn fire_search(&self, term: String) {
        let api = Arc::clone(&self.inner.api);
        let flow = self.clone();
        lock(&self.inner.lineage).fire(
            move |cancel| async move { api.search(&term, &cancel).await },
            move |results| flow.apply(SearchAction::ResultsArrived(results)),
        );
    }
}
