//! Serialized verification worker
//!
//! `VerifierService` owns one bounded job channel and one dedicated worker
//! task. Requests run strictly sequentially on the worker, never on the
//! caller; completion resumes on the caller's own task. The service is the
//! only shared mutable state: the sender slot is populated at construction
//! and emptied exactly once by `shutdown`.

use std::future::Future;
use std::sync::Mutex;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{ErrorKind, VerificationOutcome};
use crate::verifier::{PinningVerifier, VerificationRequest};

const QUEUE_DEPTH: usize = 32;

struct Job {
    request: VerificationRequest,
    reply: oneshot::Sender<VerificationOutcome>,
}

/// Single-lane verification service.
///
/// When the lane is shut down (or the worker is gone), `submit` short-circuits
/// without touching the network. The short-circuit outcome is governed by the
/// fail-open policy: the default (`true`) reports `Secure`, degrading open
/// rather than blocking traffic. Callers who want a closed lane to reject
/// instead should construct with
/// [`VerifierService::with_fail_open`]`(false)`.
pub struct VerifierService {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    fail_open: bool,
}

impl VerifierService {
    /// Start a service with the degrade-open shutdown policy.
    pub fn new() -> Self {
        Self::with_fail_open(true)
    }

    /// Start a service with an explicit shutdown policy.
    pub fn with_fail_open(fail_open: bool) -> Self {
        Self::spawn(fail_open, |request| async move {
            PinningVerifier::verify(&request).await
        })
    }

    fn spawn<F, Fut>(fail_open: bool, mut run: F) -> Self
    where
        F: FnMut(VerificationRequest) -> Fut + Send + 'static,
        Fut: Future<Output = VerificationOutcome> + Send,
    {
        let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let outcome = run(job.request).await;
                // The caller may have gone away; the outcome is still final.
                let _ = job.reply.send(outcome);
            }
            debug!("verification worker drained, exiting");
        });
        Self {
            tx: Mutex::new(Some(tx)),
            fail_open,
        }
    }

    /// Enqueue a request and await its outcome.
    ///
    /// Exactly one outcome is resolved per call, including after shutdown.
    pub async fn submit(&self, request: VerificationRequest) -> VerificationOutcome {
        let sender = match self.tx.lock() {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        let Some(sender) = sender else {
            return self.degraded();
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let job = Job {
            request,
            reply: reply_tx,
        };
        if sender.send(job).await.is_err() {
            return self.degraded();
        }
        match reply_rx.await {
            Ok(outcome) => outcome,
            Err(_) => VerificationOutcome::failure(
                ErrorKind::UnknownError,
                "verification worker dropped the request",
            ),
        }
    }

    /// Stop accepting new work. Work already accepted is allowed to finish.
    /// Closing is terminal and calling this more than once is harmless.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.tx.lock() {
            if slot.take().is_some() {
                debug!("verifier service shut down");
            }
        }
    }

    pub fn is_shut_down(&self) -> bool {
        match self.tx.lock() {
            Ok(slot) => slot.is_none(),
            Err(_) => true,
        }
    }

    fn degraded(&self) -> VerificationOutcome {
        if self.fail_open {
            warn!("verifier service is shut down; reporting secure without verification");
            VerificationOutcome::Secure
        } else {
            VerificationOutcome::failure(ErrorKind::UnknownError, "verifier service is shut down")
        }
    }
}

impl Default for VerifierService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn request(url: &str) -> VerificationRequest {
        VerificationRequest {
            url: url.to_string(),
            fingerprints: vec![],
            headers: HashMap::new(),
            timeout: 1,
            algorithm: "SHA-256".to_string(),
        }
    }

    #[tokio::test]
    async fn test_executions_never_overlap() {
        let active = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));
        let service = VerifierService::spawn(true, {
            let active = active.clone();
            let overlapped = overlapped.clone();
            move |_request| {
                let active = active.clone();
                let overlapped = overlapped.clone();
                async move {
                    if active.fetch_add(1, Ordering::SeqCst) > 0 {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    VerificationOutcome::Secure
                }
            }
        });

        let (a, b, c, d) = tokio::join!(
            service.submit(request("https://one.example/")),
            service.submit(request("https://two.example/")),
            service.submit(request("https://three.example/")),
            service.submit(request("https://four.example/")),
        );
        assert!(a.is_secure() && b.is_secure() && c.is_secure() && d.is_secure());
        assert!(!overlapped.load(Ordering::SeqCst), "worker ran two jobs at once");
    }

    #[tokio::test]
    async fn test_requests_run_in_submission_order() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let service = VerifierService::spawn(true, {
            let seen = seen.clone();
            move |request: VerificationRequest| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(request.url);
                    VerificationOutcome::Secure
                }
            }
        });

        tokio::join!(
            service.submit(request("https://first.example/")),
            service.submit(request("https://second.example/")),
            service.submit(request("https://third.example/")),
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "https://first.example/".to_string(),
                "https://second.example/".to_string(),
                "https://third.example/".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails_open() {
        let ran = Arc::new(AtomicBool::new(false));
        let service = VerifierService::spawn(true, {
            let ran = ran.clone();
            move |_request| {
                let ran = ran.clone();
                async move {
                    ran.store(true, Ordering::SeqCst);
                    VerificationOutcome::Secure
                }
            }
        });

        service.shutdown();
        assert!(service.is_shut_down());

        let outcome = service.submit(request("https://example.com/")).await;
        assert_eq!(outcome, VerificationOutcome::Secure);
        assert!(!ran.load(Ordering::SeqCst), "no verification may run after shutdown");
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails_closed_when_configured() {
        let service = VerifierService::spawn(false, |_request| async move {
            VerificationOutcome::Secure
        });
        service.shutdown();

        let outcome = service.submit(request("https://example.com/")).await;
        assert_eq!(outcome.kind(), Some(ErrorKind::UnknownError));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let service = VerifierService::spawn(true, |_request| async move {
            VerificationOutcome::Secure
        });
        service.shutdown();
        service.shutdown();
        assert!(service.is_shut_down());
    }

    #[tokio::test]
    async fn test_accepted_work_finishes_after_shutdown() {
        let (started_tx, mut started_rx) = mpsc::unbounded_channel::<()>();
        let marker =
            VerificationOutcome::failure(ErrorKind::NetworkError, "marker outcome from worker");
        let service = Arc::new(VerifierService::spawn(true, {
            let marker = marker.clone();
            move |_request| {
                let _ = started_tx.send(());
                let marker = marker.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    marker
                }
            }
        }));

        let in_flight = tokio::spawn({
            let service = service.clone();
            async move { service.submit(request("https://example.com/")).await }
        });

        started_rx.recv().await.expect("worker picked up the job");
        service.shutdown();

        // The dequeued job still completes with the worker's outcome, not
        // the degrade-open shortcut.
        let outcome = in_flight.await.expect("submit task");
        assert_eq!(outcome, marker);
    }
}
