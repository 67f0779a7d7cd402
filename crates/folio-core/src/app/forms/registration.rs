//! Registration form reducer.
//!
//! Two-phase validation: `*Immediately` actions run on every keystroke and
//! check the cheap synchronous rules; `*AfterDelay` actions run once the
//! debounce gate settles, check the rules that need a stable value, and bump
//! the uniqueness-check counter when the field is clean. Submission bumps
//! `submit_count` only when every field is error-free and both uniqueness
//! verdicts are in, so a network mutation can never fire over known-bad
//! input.

use regex::Regex;

use crate::app::forms::field::FieldState;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const PASSWORD_MIN_LEN: usize = 12;
pub const PASSWORD_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationState {
    pub username: FieldState,
    pub email: FieldState,
    pub password: FieldState,
    /// Send counter for the registration request itself.
    pub submit_count: u64,
}

impl RegistrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field passes its client-side rules and both uniqueness checks
    /// came back clean.
    pub fn is_submittable(&self) -> bool {
        !self.username.has_errors
            && self.username.is_unique == Some(true)
            && !self.email.has_errors
            && self.email.is_unique == Some(true)
            && !self.password.has_errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationAction {
    UsernameImmediately(String),
    /// `no_request` applies the validation without bumping the check
    /// counter; the submit path uses it to re-validate synchronously.
    UsernameAfterDelay { no_request: bool },
    UsernameUniqueResults { taken: bool },
    EmailImmediately(String),
    EmailAfterDelay { no_request: bool },
    EmailUniqueResults { taken: bool },
    PasswordImmediately(String),
    PasswordAfterDelay,
    SubmitForm,
}

pub fn reduce(state: &mut RegistrationState, action: RegistrationAction) {
    match action {
        RegistrationAction::UsernameImmediately(value) => {
            state.username.accept(value);
            if state.username.value.chars().count() > USERNAME_MAX_LEN {
                state.username.fail("Username cannot exceed 30 characters");
            }
            if !state.username.value.is_empty()
                && let Ok(alphanumeric) = Regex::new(r"^[a-zA-Z0-9]+$")
                && !alphanumeric.is_match(&state.username.value)
            {
                state
                    .username
                    .fail("Username can only contain letters and numbers");
            }
        }
        RegistrationAction::UsernameAfterDelay { no_request } => {
            if state.username.value.chars().count() < USERNAME_MIN_LEN {
                state.username.fail("Username must be at least 3 characters");
            }
            if !state.username.has_errors && !no_request {
                state.username.check_count += 1;
            }
        }
        RegistrationAction::UsernameUniqueResults { taken } => {
            state
                .username
                .apply_uniqueness(taken, "That username is already taken");
        }
        RegistrationAction::EmailImmediately(value) => {
            state.email.accept(value);
        }
        RegistrationAction::EmailAfterDelay { no_request } => {
            if let Ok(email_shape) = Regex::new(r"^\S+@\S+\.\S+$")
                && !email_shape.is_match(&state.email.value)
            {
                state.email.fail("You must provide a valid email address");
            }
            if !state.email.has_errors && !no_request {
                state.email.check_count += 1;
            }
        }
        RegistrationAction::EmailUniqueResults { taken } => {
            state
                .email
                .apply_uniqueness(taken, "That email is already being used");
        }
        RegistrationAction::PasswordImmediately(value) => {
            state.password.accept(value);
            if state.password.value.chars().count() > PASSWORD_MAX_LEN {
                state
                    .password
                    .fail("Password cannot exceed 50 characters");
            }
        }
        RegistrationAction::PasswordAfterDelay => {
            if state.password.value.chars().count() < PASSWORD_MIN_LEN {
                state
                    .password
                    .fail("Password must be at least 12 characters");
            }
        }
        RegistrationAction::SubmitForm => {
            if state.is_submittable() {
                state.submit_count += 1;
            }
        }
    }
}
