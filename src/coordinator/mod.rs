//! Request coalescing.
//!
//! A [`RequestCoordinator`] guarantees at most one in-flight call per
//! [`InFlightKey`]. Concurrent submissions with the same key wait on the
//! single underlying call and all observe its outcome. Interest is reference
//! counted: a caller that cancels (or drops its future) stops waiting, and
//! the underlying call is aborted only once nobody is left waiting for it.

use crate::error::AssistError;
use futures::future::{BoxFuture, FutureExt, Shared};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fingerprint of an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    method: &'static str,
    endpoint: String,
    fingerprint: String,
}

impl InFlightKey {
    /// Build a key from the method, endpoint and a SHA-256 of the trimmed content.
    pub fn new(method: &'static str, endpoint: &str, content: &str) -> Self {
        let digest = Sha256::digest(content.trim().as_bytes());
        Self {
            method,
            endpoint: endpoint.to_string(),
            fingerprint: format!("{:x}", digest),
        }
    }

    /// Build a key over raw bytes (uploads).
    pub fn for_bytes(method: &'static str, endpoint: &str, bytes: &[u8]) -> Self {
        Self {
            method,
            endpoint: endpoint.to_string(),
            fingerprint: format!("{:x}", Sha256::digest(bytes)),
        }
    }
}

impl fmt::Display for InFlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} #{}",
            self.method,
            self.endpoint,
            &self.fingerprint[..12.min(self.fingerprint.len())]
        )
    }
}

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, AssistError>>>;

struct InFlight<T: Clone> {
    id: u64,
    interest: usize,
    outcome: SharedOutcome<T>,
    abort: AbortHandle,
}

struct Inner<T: Clone> {
    next_id: AtomicU64,
    in_flight: Mutex<HashMap<InFlightKey, InFlight<T>>>,
}

impl<T: Clone> Inner<T> {
    fn entries(&self) -> MutexGuard<'_, HashMap<InFlightKey, InFlight<T>>> {
        // No lock is held across a panic point that could leave the map inconsistent
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by the request task itself once the call has finished.
    fn finish(&self, key: &InFlightKey, id: u64) {
        let mut entries = self.entries();
        if entries.get(key).is_some_and(|e| e.id == id) {
            entries.remove(key);
            debug!(key = %key, "request settled, key released");
        }
    }

    /// Called when a waiting caller goes away, whether it saw the outcome or not.
    fn withdraw(&self, key: &InFlightKey, id: u64) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(key).filter(|e| e.id == id) else {
            return;
        };

        entry.interest -= 1;
        if entry.interest == 0 {
            if let Some(entry) = entries.remove(key) {
                entry.abort.abort();
                debug!(key = %key, "last caller withdrew, aborting request");
            }
        }
    }
}

/// Drops one unit of interest when the waiting caller finishes or is dropped.
struct Interest<T: Clone> {
    inner: Arc<Inner<T>>,
    key: InFlightKey,
    id: u64,
}

impl<T: Clone> Drop for Interest<T> {
    fn drop(&mut self) {
        self.inner.withdraw(&self.key, self.id);
    }
}

/// Await `work` unless `cancel` fires first.
///
/// For calls that are not coalesced (history, health probes, local reads),
/// so that a cancellation still ends the wait promptly.
pub async fn until_canceled<F>(cancel: &CancellationToken, work: F) -> Result<F::Output, AssistError>
where
    F: Future,
{
    if cancel.is_cancelled() {
        return Err(AssistError::Canceled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AssistError::Canceled),
        output = work => Ok(output),
    }
}

/// Deduplicates concurrent calls that share an [`InFlightKey`].
pub struct RequestCoordinator<T: Clone> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone> Clone for RequestCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(0),
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of keys with a call currently in flight.
    #[allow(dead_code)] // Diagnostics
    pub fn in_flight(&self) -> usize {
        self.inner.entries().len()
    }

    /// Run `perform` for `key`, or join the call already in flight for it.
    ///
    /// `perform` is only invoked when no call is in flight for `key`. If
    /// `cancel` fires first this caller gets [`AssistError::Canceled`]; the
    /// underlying call keeps running for any other callers. No retries.
    pub async fn submit<F, Fut>(
        &self,
        key: InFlightKey,
        cancel: &CancellationToken,
        perform: F,
    ) -> Result<T, AssistError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AssistError>> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(AssistError::Canceled);
        }

        let (id, outcome) = self.join_or_start(&key, perform);
        let _interest = Interest {
            inner: Arc::clone(&self.inner),
            key,
            id,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(key = %_interest.key, "caller canceled");
                Err(AssistError::Canceled)
            }
            result = outcome => result,
        }
    }

    fn join_or_start<F, Fut>(&self, key: &InFlightKey, perform: F) -> (u64, SharedOutcome<T>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AssistError>> + Send + 'static,
    {
        let mut entries = self.inner.entries();

        if let Some(entry) = entries.get_mut(key) {
            entry.interest += 1;
            debug!(key = %key, waiting = entry.interest, "coalescing with in-flight request");
            return (entry.id, entry.outcome.clone());
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let request = perform();
        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();

        // The task cannot settle before the entry exists: finish() needs the lock held here.
        let handle = tokio::spawn(async move {
            let result = request.await;
            inner.finish(&task_key, id);
            result
        });
        let abort = handle.abort_handle();

        let outcome = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(AssistError::Canceled),
                Err(e) => Err(AssistError::transport(format!("request task failed: {}", e))),
            }
        }
        .boxed()
        .shared();

        debug!(key = %key, "starting request");
        entries.insert(
            key.clone(),
            InFlight {
                id,
                interest: 1,
                outcome: outcome.clone(),
                abort,
            },
        );

        (id, outcome)
    }
}
