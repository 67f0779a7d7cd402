//! Debounce gate: reacts to input only after it has been stable for a quiet
//! period.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Default quiet period between the last input and the downstream trigger.
pub const QUIET_PERIOD: Duration = Duration::from_millis(800);

/// Restartable quiet-period timer. Every `input` supersedes the pending one;
/// the closure runs only if no further input arrives within the quiet
/// period. `cancel` (or drop) guarantees nothing fires after teardown.
pub struct DebounceGate {
    quiet: Duration,
    pending: Option<CancellationToken>,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self::with_quiet_period(QUIET_PERIOD)
    }

    pub fn with_quiet_period(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Register an input. Restarts the timer; `fire` runs after a full quiet
    /// period with no further input.
    pub fn input<F>(&mut self, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let task_token = token.clone();
        let quiet = self.quiet;
        let _ = tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {}
                () = tokio::time::sleep(quiet) => fire(),
            }
        });
        self.pending = Some(token);
    }

    /// Discard the pending trigger, if any. Used when the input is cleared
    /// or the owning consumer detaches.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn() -> Vec<String>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let reader = {
            let fired = fired.clone();
            move || fired.lock().unwrap().clone()
        };
        (fired, reader)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_quiet_period() {
        let (fired, read) = recorder();
        let mut gate = DebounceGate::new();

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("a".to_string()));

        tokio::time::sleep(Duration::from_millis(799)).await;
        assert!(read().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(read(), vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_inputs_coalesce_to_the_final_value() {
        let (fired, read) = recorder();
        let mut gate = DebounceGate::new();

        // "ab" typed, then "abc" 300ms later: within one quiet period, so
        // only one trigger fires, for "abc".
        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("ab".to_string()));
        tokio::time::sleep(Duration::from_millis(300)).await;

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("abc".to_string()));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(read(), vec!["abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_trigger_per_stable_period() {
        let (fired, read) = recorder();
        let mut gate = DebounceGate::new();

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("first".to_string()));
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("second".to_string()));
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(read(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_trigger() {
        let (fired, read) = recorder();
        let mut gate = DebounceGate::new();

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("never".to_string()));
        gate.cancel();

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(read().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn never_fires_after_drop() {
        let (fired, read) = recorder();
        {
            let mut gate = DebounceGate::new();
            let sink = fired.clone();
            gate.input(move || sink.lock().unwrap().push("never".to_string()));
        }

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(read().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn custom_quiet_period_is_honored() {
        let (fired, read) = recorder();
        let mut gate = DebounceGate::with_quiet_period(Duration::from_millis(50));

        let sink = fired.clone();
        gate.input(move || sink.lock().unwrap().push("quick".to_string()));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(read(), vec!["quick"]);
    }
}
