//! Asynchronous store updates
//!
//! [`Store::update_async`] drives a future on the Tokio runtime and
//! commits its payload to the store when it resolves. The returned
//! [`UpdateFuture`] is a cloneable observation handle: it exposes a
//! point-in-time [`FutureStatus`] snapshot, a one-shot settlement
//! listener registration, and an awaitable settlement.
//!
//! Rejected updates never commit. The optimistic variant applies a
//! mutation immediately and restores the captured pre-update state if
//! the future rejects. Dropping observation handles or settlement
//! subscriptions never cancels the in-flight work; the update runs to
//! completion regardless of who is still watching.

use slotmap::{new_key_type, SlotMap};
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::watch;

use crate::store::Store;
use crate::subscription::Subscription;

/// Rejection reason of an asynchronous update
///
/// Carries the message unchanged from the producer; no retry or
/// fallback is applied anywhere.
#[derive(Debug, Clone, Error)]
#[error("update rejected: {message}")]
pub struct UpdateError {
    message: Arc<str>,
}

impl UpdateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into().into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for UpdateError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for UpdateError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Point-in-time summary of an update's lifecycle
///
/// `value` is the store's current state at the moment of observation,
/// which may already reflect an optimistic mutation while `loading` is
/// still true.
#[derive(Debug, Clone)]
pub struct FutureStatus<S> {
    pub loading: bool,
    pub resolved: bool,
    pub rejected: bool,
    pub error: Option<UpdateError>,
    pub value: S,
}

#[derive(Debug, Clone)]
enum Phase {
    Pending,
    Resolved,
    Rejected(UpdateError),
}

new_key_type! {
    struct SettleKey;
}

type SettleListener<S> = Box<dyn Fn(&FutureStatus<S>) + Send + Sync>;

struct FutureInner<S> {
    store: Store<S>,
    phase: RwLock<Phase>,
    listeners: Mutex<SlotMap<SettleKey, SettleListener<S>>>,
    settled_tx: watch::Sender<bool>,
    settled_rx: watch::Receiver<bool>,
}

/// Handle to an in-flight asynchronous store update
///
/// Cheaply cloneable; clones observe the same update.
pub struct UpdateFuture<S> {
    inner: Arc<FutureInner<S>>,
}

impl<S> Clone for UpdateFuture<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> UpdateFuture<S> {
    fn pending(store: Store<S>) -> Self {
        let (settled_tx, settled_rx) = watch::channel(false);
        Self {
            inner: Arc::new(FutureInner {
                store,
                phase: RwLock::new(Phase::Pending),
                listeners: Mutex::new(SlotMap::with_key()),
                settled_tx,
                settled_rx,
            }),
        }
    }

    /// Snapshot the update's status and the store's current value
    pub fn status(&self) -> FutureStatus<S> {
        let phase = self.inner.phase.read().unwrap().clone();
        let value = self.inner.store.get();
        match phase {
            Phase::Pending => FutureStatus {
                loading: true,
                resolved: false,
                rejected: false,
                error: None,
                value,
            },
            Phase::Resolved => FutureStatus {
                loading: false,
                resolved: true,
                rejected: false,
                error: None,
                value,
            },
            Phase::Rejected(error) => FutureStatus {
                loading: false,
                resolved: false,
                rejected: true,
                error: Some(error),
                value,
            },
        }
    }

    /// Whether the update has resolved or rejected
    pub fn is_settled(&self) -> bool {
        !matches!(*self.inner.phase.read().unwrap(), Phase::Pending)
    }

    /// Whether the update has rejected
    pub fn is_rejected(&self) -> bool {
        matches!(*self.inner.phase.read().unwrap(), Phase::Rejected(_))
    }

    /// Register a listener invoked exactly once when the update settles
    ///
    /// If the update is already settled, the listener is invoked
    /// immediately with the terminal status. Dropping the subscription
    /// before settlement suppresses the invocation; it does not cancel
    /// the update itself.
    pub fn on_settle(
        &self,
        listener: impl Fn(&FutureStatus<S>) + Send + Sync + 'static,
    ) -> Subscription {
        {
            let mut listeners = self.inner.listeners.lock().unwrap();
            if matches!(*self.inner.phase.read().unwrap(), Phase::Pending) {
                let key = listeners.insert(Box::new(listener));
                let weak = Arc::downgrade(&self.inner);
                return Subscription::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.listeners.lock().unwrap().remove(key);
                    }
                });
            }
        }
        listener(&self.status());
        Subscription::empty()
    }

    /// Await settlement: the post-commit state on resolution, or the
    /// rejection reason
    pub async fn settled(&self) -> Result<S, UpdateError> {
        let mut rx = self.inner.settled_rx.clone();
        if rx.wait_for(|settled| *settled).await.is_err() {
            return Err(UpdateError::new("update abandoned"));
        }
        match self.inner.phase.read().unwrap().clone() {
            Phase::Resolved => Ok(self.inner.store.get()),
            Phase::Rejected(error) => Err(error),
            Phase::Pending => Err(UpdateError::new("update abandoned")),
        }
    }

    fn settle(&self, phase: Phase) {
        *self.inner.phase.write().unwrap() = phase;
        let status = self.status();
        let drained: Vec<SettleListener<S>> = {
            let mut listeners = self.inner.listeners.lock().unwrap();
            listeners.drain().map(|(_, listener)| listener).collect()
        };
        for listener in drained {
            listener(&status);
        }
        let _ = self.inner.settled_tx.send(true);
    }
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Drive `fut` on the Tokio runtime and commit its payload via
    /// `apply` when it resolves
    ///
    /// On rejection the store is left untouched. Must be called within
    /// a Tokio runtime.
    pub fn update_async<T, F, A>(&self, fut: F, apply: A) -> UpdateFuture<S>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, UpdateError>> + Send + 'static,
        A: FnOnce(&mut S, T) + Send + 'static,
    {
        let handle = UpdateFuture::pending(self.clone());
        let task = handle.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(payload) => {
                    task.inner.store.update(move |state| apply(state, payload));
                    task.settle(Phase::Resolved);
                }
                Err(error) => {
                    tracing::debug!(error = error.message(), "async update rejected");
                    task.settle(Phase::Rejected(error));
                }
            }
        });
        handle
    }

    /// Apply `optimistic` immediately, then drive `fut`; on rejection
    /// the store is rolled back to the pre-update state
    pub fn update_async_optimistic<T, F, A>(
        &self,
        optimistic: impl FnOnce(&mut S),
        fut: F,
        apply: A,
    ) -> UpdateFuture<S>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, UpdateError>> + Send + 'static,
        A: FnOnce(&mut S, T) + Send + 'static,
    {
        let previous = self.get();
        self.update(optimistic);

        let handle = UpdateFuture::pending(self.clone());
        let task = handle.clone();
        tokio::spawn(async move {
            match fut.await {
                Ok(payload) => {
                    task.inner.store.update(move |state| apply(state, payload));
                    task.settle(Phase::Resolved);
                }
                Err(error) => {
                    tracing::debug!(error = error.message(), "optimistic update rolled back");
                    task.inner.store.set(previous);
                    task.settle(Phase::Rejected(error));
                }
            }
        });
        handle
    }
}
