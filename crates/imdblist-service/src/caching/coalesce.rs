//! Keyed single-flight execution.
//!
//! The [`Coalescer`] guarantees that at most one execution of a work future
//! is in flight per key. Callers that arrive while a matching execution is
//! running attach to it and receive a clone of its one result; callers that
//! arrive after it finished trigger a fresh execution. Results are not
//! cached here and failures are not remembered, both are the
//! [`CatalogCache`](super::CatalogCache)'s business.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::FutureExt as _;
use futures::channel::oneshot;
use futures::future::Shared;

use crate::fetch::FetchError;

// We want a shared future here because handing each waiter its own clone of
// the channel lets all of them await the same completion without holding the
// map lock.
type ResultChannel<T> = Shared<oneshot::Receiver<Result<T, FetchError>>>;

/// Deduplicates concurrent executions of a keyed asynchronous operation.
///
/// This component owns no business data; it is purely a concurrency
/// primitive over whatever work future the caller supplies.
pub struct Coalescer<K, T> {
    pending: Arc<Mutex<BTreeMap<K, ResultChannel<T>>>>,
}

impl<K, T> std::fmt::Debug for Coalescer<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let in_flight = self
            .pending
            .try_lock()
            .map(|p| p.len())
            .unwrap_or_default();
        f.debug_struct("Coalescer")
            .field("in-flight keys", &in_flight)
            .finish()
    }
}

impl<K, T> Default for Coalescer<K, T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl<K, T> Coalescer<K, T>
where
    K: Ord + Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` under `key`, or attaches to the in-flight execution for
    /// that key if there is one.
    ///
    /// Every caller coalesced onto one execution receives the identical
    /// result, success or failure. The work is spawned and runs to
    /// completion even if all callers stop waiting; it cannot be aborted.
    pub async fn coalesce<F>(&self, key: K, work: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let channel = {
            // Check-then-insert happens under this one guard, so two
            // concurrent executions for one key are impossible.
            let mut pending = self.pending.lock().unwrap();
            match pending.get(&key).cloned() {
                Some(channel) => channel,
                None => {
                    let (sender, receiver) = oneshot::channel();
                    let channel = receiver.shared();
                    pending.insert(key.clone(), channel.clone());

                    let pending = Arc::clone(&self.pending);
                    tokio::spawn(async move {
                        let result = work.await;
                        // Release the key before broadcasting: a caller that
                        // arrives from here on starts a fresh execution
                        // instead of observing this one.
                        pending.lock().unwrap().remove(&key);
                        sender.send(result).ok();
                    });

                    channel
                }
            }
        };

        // The sender is only ever dropped without a result when the work
        // task panicked.
        channel.await.unwrap_or(Err(FetchError::Internal))
    }
}
