//! Live local mirrors of remote data
//!
//! A [`LiveMirror`] owns the in-memory copy of one remote collection or
//! document. It consumes a [`Subscription`] on a background task, decodes each
//! snapshot, and publishes the result as an immutable `Arc<T>` to anyone who
//! called [`LiveMirror::subscribe_changes`].
//!
//! Only one listener is live at a time. Starting a new one cancels the old
//! one first, and every listener checks, under the state lock, that it is
//! still the current generation before applying anything. After
//! [`LiveMirror::stop`] returns, no snapshot from an earlier subscription can
//! reach the mirror.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::subscription::{CancelHandle, Subscription};
use super::{DocumentSnapshot, StoreEvent};
use crate::error::{ExpenseError, ExpenseResult};

/// Result of decoding one snapshot
#[derive(Debug, Clone)]
pub struct MirrorUpdate<T> {
    /// The decoded value
    pub value: T,
    /// Document ids that could not be decoded
    pub skipped: Vec<String>,
}

impl<T> MirrorUpdate<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            skipped: Vec::new(),
        }
    }
}

struct Listener {
    handle: CancelHandle,
    task: JoinHandle<()>,
}

struct MirrorState<T> {
    value: Arc<T>,
    skipped: Vec<String>,
    last_error: Option<String>,
    generation: u64,
    listener: Option<Listener>,
}

/// In-memory copy of remote data kept current by a subscription
pub struct LiveMirror<T> {
    name: &'static str,
    state: Arc<RwLock<MirrorState<T>>>,
    changes: Arc<watch::Sender<Arc<T>>>,
    /// Highest generation that has received its first event
    settled: Arc<watch::Sender<u64>>,
}

fn read<T>(lock: &RwLock<MirrorState<T>>) -> RwLockReadGuard<'_, MirrorState<T>> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<MirrorState<T>>) -> RwLockWriteGuard<'_, MirrorState<T>> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl<T> LiveMirror<T>
where
    T: Default + Send + Sync + 'static,
{
    /// Create an empty mirror; `name` labels log events
    pub fn new(name: &'static str) -> Self {
        let (changes, _) = watch::channel(Arc::new(T::default()));
        let (settled, _) = watch::channel(0);
        Self {
            name,
            state: Arc::new(RwLock::new(MirrorState {
                value: Arc::new(T::default()),
                skipped: Vec::new(),
                last_error: None,
                generation: 0,
                listener: None,
            })),
            changes: Arc::new(changes),
            settled: Arc::new(settled),
        }
    }

    /// Start applying events from `subscription`, replacing any previous listener
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(&self, subscription: Subscription, decode: F)
    where
        F: Fn(DocumentSnapshot) -> MirrorUpdate<T> + Send + 'static,
    {
        let handle = subscription.cancel_handle();
        let mut state = write(&self.state);
        if let Some(previous) = state.listener.take() {
            debug!(mirror = self.name, "replacing existing subscription");
            previous.handle.cancel();
            previous.task.abort();
        }
        state.generation += 1;
        state.last_error = None;
        let generation = state.generation;

        let shared = Arc::clone(&self.state);
        let changes = Arc::clone(&self.changes);
        let settled = Arc::clone(&self.settled);
        let name = self.name;
        let guard = handle.clone();

        let task = tokio::spawn(async move {
            let mut subscription = subscription;
            while let Some(event) = subscription.next().await {
                let mut state = write(&shared);
                if state.generation != generation || !guard.is_active() {
                    debug!(mirror = name, "dropping event for stale subscription");
                    break;
                }
                match event {
                    StoreEvent::Snapshot(documents) => {
                        let count = documents.len();
                        let update = decode(documents);
                        if !update.skipped.is_empty() {
                            warn!(
                                mirror = name,
                                skipped = update.skipped.len(),
                                "skipped undecodable records"
                            );
                        }
                        let value = Arc::new(update.value);
                        state.value = Arc::clone(&value);
                        state.skipped = update.skipped;
                        state.last_error = None;
                        changes.send_replace(value);
                        debug!(mirror = name, documents = count, "applied snapshot");
                    }
                    StoreEvent::Error(message) => {
                        error!(mirror = name, %message, "subscription error");
                        state.last_error = Some(message);
                    }
                }
                settled.send_if_modified(|seen| {
                    if *seen < generation {
                        *seen = generation;
                        true
                    } else {
                        false
                    }
                });
            }
        });

        state.listener = Some(Listener { handle, task });
    }

    /// Cancel the live subscription, if any; the current value is kept
    pub fn stop(&self) {
        let mut state = write(&self.state);
        if let Some(listener) = state.listener.take() {
            listener.handle.cancel();
            listener.task.abort();
            debug!(mirror = self.name, "stopped listening");
        }
        state.generation += 1;
    }

    /// Reset the mirror to its empty value
    pub fn clear(&self) {
        let mut state = write(&self.state);
        let empty = Arc::new(T::default());
        state.value = Arc::clone(&empty);
        state.skipped.clear();
        state.last_error = None;
        self.changes.send_replace(empty);
    }

    /// Whether a subscription is currently live
    pub fn is_listening(&self) -> bool {
        read(&self.state)
            .listener
            .as_ref()
            .is_some_and(|l| l.handle.is_active())
    }

    /// Immutable snapshot of the current value
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&read(&self.state).value)
    }

    /// Ids of records the last snapshot could not decode
    pub fn skipped(&self) -> Vec<String> {
        read(&self.state).skipped.clone()
    }

    /// Most recent subscription error, cleared by the next good snapshot
    pub fn last_error(&self) -> Option<String> {
        read(&self.state).last_error.clone()
    }

    /// Observe every applied snapshot
    pub fn subscribe_changes(&self) -> watch::Receiver<Arc<T>> {
        self.changes.subscribe()
    }

    /// Wait until the current subscription has delivered its first event
    ///
    /// Returns the subscription error if that first event was an error.
    pub async fn wait_until_synced(&self) -> ExpenseResult<()> {
        let generation = {
            let state = read(&self.state);
            if state.listener.is_none() {
                return Ok(());
            }
            state.generation
        };
        let mut settled = self.settled.subscribe();
        settled
            .wait_for(|seen| *seen >= generation)
            .await
            .map_err(|_| ExpenseError::Persistence(format!("{} mirror closed", self.name)))?;
        match self.last_error() {
            Some(message) => Err(ExpenseError::Persistence(message)),
            None => Ok(()),
        }
    }
}

impl<T> Drop for LiveMirror<T> {
    fn drop(&mut self) {
        let mut state = write(&self.state);
        if let Some(listener) = state.listener.take() {
            listener.handle.cancel();
            listener.task.abort();
        }
    }
}
