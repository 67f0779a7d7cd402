//! Request orchestration: one outstanding request per trigger lineage.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

use crate::api::ApiError;

/// Owns the request slot for one trigger lineage.
///
/// `fire` supersedes whatever is in flight: the previous request's token is
/// cancelled and its completion can no longer reach the caller, even if its
/// response arrives later (an epoch recorded at fire time must still be
/// current when the completion runs). Failures are logged and swallowed;
/// cancellation is not an error at all.
///
/// Dropping the lineage cancels the outstanding request, so a consumer that
/// detaches cleans up on scope exit.
pub struct Lineage {
    epoch: Arc<AtomicU64>,
    current: Option<InFlight>,
}

struct InFlight {
    token: CancellationToken,
}

impl Lineage {
    pub fn new() -> Self {
        Self {
            epoch: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }

    /// Issue a request, superseding any outstanding one.
    ///
    /// `request` receives the cancellation token to thread into the network
    /// call. `complete` runs only for a successful response whose epoch is
    /// still current.
    pub fn fire<Fut, T, C>(&mut self, request: impl FnOnce(CancellationToken) -> Fut, complete: C)
    where
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.cancel();

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = Arc::clone(&self.epoch);
        let token = CancellationToken::new();
        let fut = request(token.clone());
        let task_token = token.clone();

        let _ = tokio::spawn(async move {
            let outcome = tokio::select! {
                () = task_token.cancelled() => {
                    tracing::debug!("request superseded or detached before completion");
                    return;
                }
                outcome = fut => outcome,
            };
            match outcome {
                Ok(value) => {
                    // A stale response must never reach the reducer, even if
                    // it slipped past the token race.
                    if latest.load(Ordering::SeqCst) == epoch && !task_token.is_cancelled() {
                        complete(value);
                    } else {
                        tracing::debug!("discarding completion of a superseded request");
                    }
                }
                Err(err) if err.is_cancelled() => {
                    tracing::debug!("request cancelled");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "request failed");
                }
            }
        });

        self.current = Some(InFlight { token });
    }

    /// Cancel the outstanding request, if any. Used when the owning consumer
    /// detaches.
    pub fn cancel(&mut self) {
        if let Some(in_flight) = self.current.take() {
            in_flight.token.cancel();
        }
    }
}

impl Default for Lineage {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Lineage {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    fn collector() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn() -> Vec<&'static str>) {
        let results = Arc::new(Mutex::new(Vec::new()));
        let reader = {
            let results = results.clone();
            move || results.lock().unwrap().clone()
        };
        (results, reader)
    }

    #[tokio::test(start_paused = true)]
    async fn completion_reaches_caller() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("v1")
            },
            move |v| sink.lock().unwrap().push(v),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(read(), vec!["v1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_request_never_completes() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        // v1 would resolve at t=100ms; v2 supersedes it immediately and
        // resolves at t=50ms. Only v2's completion may land.
        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok("v1")
            },
            move |v| sink.lock().unwrap().push(v),
        );

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok("v2")
            },
            move |v| sink.lock().unwrap().push(v),
        );

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(read(), vec!["v2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn detach_cancels_outstanding_request() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("v1")
            },
            move |v| sink.lock().unwrap().push(v),
        );
        lineage.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(read().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_outstanding_request() {
        let (results, read) = collector();
        {
            let mut lineage = Lineage::new();
            let sink = results.clone();
            lineage.fire(
                |_token| async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok("v1")
                },
                move |v| sink.lock().unwrap().push(v),
            );
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(read().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_request_does_not_complete() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<&str, _>(ApiError::Status { status: 500 })
            },
            move |v| sink.lock().unwrap().push(v),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(read().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_triggers_map_one_to_one() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("v1")
            },
            move |v| sink.lock().unwrap().push(v),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        let sink = results.clone();
        lineage.fire(
            |_token| async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok("v2")
            },
            move |v| sink.lock().unwrap().push(v),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(read(), vec!["v1", "v2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn request_observes_cancellation_token() {
        let (results, read) = collector();
        let mut lineage = Lineage::new();

        // A request that reports cancellation itself: the error path must
        // stay silent rather than surface as a failure.
        let sink = results.clone();
        lineage.fire(
            |token| async move {
                token.cancelled().await;
                Err::<&str, _>(ApiError::Cancelled)
            },
            move |v| sink.lock().unwrap().push(v),
        );
        lineage.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(read().is_empty());
    }
}
