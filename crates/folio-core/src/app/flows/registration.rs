//! Registration flow: per-keystroke validation, debounced stable-value
//! validation, uniqueness probes keyed to check counters, and a submit path
//! gated on an error-free form.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::app::domain::Action;
use crate::app::flows::lock;
use crate::app::forms::registration::{self, RegistrationAction, RegistrationState};
use crate::app::runtime::{DebounceGate, Lineage};
use crate::app::store::Store;

#[derive(Clone)]
pub struct RegistrationFlow {
    inner: Arc<RegistrationFlowInner>,
}

struct RegistrationFlowInner {
    store: Store,
    api: Arc<ApiClient>,
    state: Mutex<RegistrationState>,
    state_tx: watch::Sender<RegistrationState>,
    username_debounce: Mutex<DebounceGate>,
    email_debounce: Mutex<DebounceGate>,
    password_debounce: Mutex<DebounceGate>,
    username_check: Mutex<Lineage>,
    email_check: Mutex<Lineage>,
    submit: Mutex<Lineage>,
}

impl RegistrationFlow {
    pub fn new(store: Store, api: Arc<ApiClient>) -> Self {
        Self::with_quiet_period(store, api, crate::app::runtime::debounce::QUIET_PERIOD)
    }

    pub fn with_quiet_period(store: Store, api: Arc<ApiClient>, quiet: Duration) -> Self {
        let state = RegistrationState::new();
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            inner: Arc::new(RegistrationFlowInner {
                store,
                api,
                state: Mutex::new(state),
                state_tx,
                username_debounce: Mutex::new(DebounceGate::with_quiet_period(quiet)),
                email_debounce: Mutex::new(DebounceGate::with_quiet_period(quiet)),
                password_debounce: Mutex::new(DebounceGate::with_quiet_period(quiet)),
                username_check: Mutex::new(Lineage::new()),
                email_check: Mutex::new(Lineage::new()),
                submit: Mutex::new(Lineage::new()),
            }),
        }
    }

    pub fn state(&self) -> RegistrationState {
        lock(&self.inner.state).clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrationState> {
        self.inner.state_tx.subscribe()
    }

    pub fn username_input(&self, value: &str) {
        self.apply(RegistrationAction::UsernameImmediately(value.to_string()));

        let mut debounce = lock(&self.inner.username_debounce);
        if value.is_empty() {
            debounce.cancel();
        } else {
            let flow = self.clone();
            debounce.input(move || {
                flow.apply(RegistrationAction::UsernameAfterDelay { no_request: false });
            });
        }
    }

    pub fn email_input(&self, value: &str) {
        self.apply(RegistrationAction::EmailImmediately(value.to_string()));

        let mut debounce = lock(&self.inner.email_debounce);
        if value.is_empty() {
            debounce.cancel();
        } else {
            let flow = self.clone();
            debounce.input(move || {
                flow.apply(RegistrationAction::EmailAfterDelay { no_request: false });
            });
        }
    }

    pub fn password_input(&self, value: &str) {
        self.apply(RegistrationAction::PasswordImmediately(value.to_string()));

        let mut debounce = lock(&self.inner.password_debounce);
        if value.is_empty() {
            debounce.cancel();
        } else {
            let flow = self.clone();
            debounce.input(move || flow.apply(RegistrationAction::PasswordAfterDelay));
        }
    }

    /// Submit: re-run every rule synchronously (without bumping the check
    /// counters), then let `SubmitForm` decide whether the send counter
    /// moves.
    pub fn submit(&self) {
        let current = self.state();
        self.apply(RegistrationAction::UsernameImmediately(
            current.username.value.clone(),
        ));
        self.apply(RegistrationAction::UsernameAfterDelay { no_request: true });
        self.apply(RegistrationAction::EmailImmediately(
            current.email.value.clone(),
        ));
        self.apply(RegistrationAction::EmailAfterDelay { no_request: true });
        self.apply(RegistrationAction::PasswordImmediately(
            current.password.value.clone(),
        ));
        self.apply(RegistrationAction::PasswordAfterDelay);
        self.apply(RegistrationAction::SubmitForm);
    }

    /// Consumer detach: cancels pending timers and in-flight checks.
    pub fn detach(&self) {
        lock(&self.inner.username_debounce).cancel();
        lock(&self.inner.email_debounce).cancel();
        lock(&self.inner.password_debounce).cancel();
        lock(&self.inner.username_check).cancel();
        lock(&self.inner.email_check).cancel();
        lock(&self.inner.submit).cancel();
    }

    fn apply(&self, action: RegistrationAction) {
        let (snapshot, username_fired, email_fired, submit_fired) = {
            let mut state = lock(&self.inner.state);
            let before = (
                state.username.check_count,
                state.email.check_count,
                state.submit_count,
            );
            registration::reduce(&mut state, action);
            (
                state.clone(),
                state.username.check_count > before.0,
                state.email.check_count > before.1,
                state.submit_count > before.2,
            )
        };
        self.inner.state_tx.send_replace(snapshot.clone());

        if username_fired {
            self.fire_username_check(snapshot.username.value.clone());
        }
        if email_fired {
            self.fire_email_check(snapshot.email.value.clone());
        }
        if submit_fired {
            self.fire_registration(snapshot);
        }
    }

    fn fire_username_check(&self, username: String) {
        let api = Arc::clone(&self.inner.api);
        let flow = self.clone();
        lock(&self.inner.username_check).fire(
            move |cancel| async move { api.does_username_exist(&username, &cancel).await },
            move |taken| flow.apply(RegistrationAction::UsernameUniqueResults { taken }),
        );
    }

    fn fire_email_check(&self, email: String) {
        let api = Arc::clone(&self.inner.api);
        let flow = self.clone();
        lock(&self.inner.email_check).fire(
            move |cancel| async move { api.does_email_exist(&email, &cancel).await },
            move |taken| flow.apply(RegistrationAction::EmailUniqueResults { taken }),
        );
    }

    fn fire_registration(&self, snapshot: RegistrationState) {
        let api = Arc::clone(&self.inner.api);
        let store = self.inner.store.clone();
        lock(&self.inner.submit).fire(
            move |cancel| async move {
                api.register(
                    &snapshot.username.value,
                    &snapshot.email.value,
                    &snapshot.password.value,
                    &cancel,
                )
                .await
            },
            move |user| {
                store.dispatch(Action::Login(user));
                store.dispatch(Action::FlashMessage(
                    "Congrats! You successfully registered your new account.".to_string(),
                ));
            },
        );
    }
}
