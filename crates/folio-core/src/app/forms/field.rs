/// Validation state for one form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub value: String,
    pub has_errors: bool,
    /// Inline message shown beside the field while `has_errors` is set.
    pub message: String,
    /// Server verdict on uniqueness. Unset until the first check completes.
    pub is_unique: Option<bool>,
    /// Trigger counter: every increment is one intent to issue a
    /// uniqueness-check request. The orchestrator maps increments 1:1 to
    /// network calls.
    pub check_count: u64,
}

impl FieldState {
    /// Take a new value from a keystroke, clearing the previous error.
    pub fn accept(&mut self, value: String) {
        self.has_errors = false;
        self.value = value;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.has_errors = true;
        self.message = message.into();
    }

    /// Consume a server uniqueness verdict.
    pub fn apply_uniqueness(&mut self, taken: bool, taken_message: &str) {
        if taken {
            self.has_errors = true;
            self.is_unique = Some(false);
            self.message = taken_message.to_string();
        } else {
            self.is_unique = Some(true);
        }
    }
}
