//! Ripple Store - single-value state container with change notification
//!
//! A [`Store`] owns one state value. Every mutation bumps a version
//! counter and synchronously notifies all change listeners with the new
//! state. Mutations are never coalesced: N mutations produce N
//! notifications, each carrying the state as of that mutation.
//!
//! A second, labeled side channel ([`Store::dispatch`] /
//! [`Store::on_dispatch`]) exists for host-framework integration: it
//! notifies dispatch listeners with a [`Dispatch`] record in addition to
//! the normal change notification.
//!
//! # Example
//!
//! ```rust
//! use ripple_core::Store;
//!
//! #[derive(Clone, Default)]
//! struct Counter {
//!     value: i32,
//! }
//!
//! let store = Store::new(Counter::default());
//!
//! let sub = store.subscribe(|state: &Counter| {
//!     println!("value: {}", state.value);
//! });
//!
//! store.update(|s| s.value += 1);
//! assert_eq!(store.get().value, 1);
//!
//! // Dropping the handle deregisters the listener
//! drop(sub);
//! ```
//!
//! Listener callbacks run synchronously on the mutating thread and must
//! not re-enter the subscription API of the same store.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::select::Selection;
use crate::subscription::Subscription;

new_key_type! {
    /// Key of a registered listener
    struct ListenerKey;
}

type ChangeListener<S> = Box<dyn Fn(&S) + Send + Sync>;
type DispatchListener = Box<dyn Fn(&Dispatch) + Send + Sync>;

/// Record of a labeled mutation, delivered to dispatch listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Caller-supplied label for the mutation
    pub label: String,
    /// Store version after the mutation
    pub version: u64,
}

pub(crate) struct StoreInner<S> {
    state: RwLock<S>,
    version: AtomicU64,
    changes: RwLock<SlotMap<ListenerKey, ChangeListener<S>>>,
    dispatches: RwLock<SlotMap<ListenerKey, DispatchListener>>,
}

/// A single-value state container
///
/// `Store` is a cheaply cloneable handle; clones share the same state
/// and listener registry.
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> Store<S> {
    /// Create a store with an initial state
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial),
                version: AtomicU64::new(0),
                changes: RwLock::new(SlotMap::with_key()),
                dispatches: RwLock::new(SlotMap::with_key()),
            }),
        }
    }

    /// Clone the current state
    pub fn get(&self) -> S {
        self.with(S::clone)
    }

    /// Read the current state without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.state.read().unwrap())
    }

    /// Store version, bumped on every mutation
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    /// Replace the state, notifying change listeners
    pub fn set(&self, next: S) {
        self.apply(move |state| *state = next, None);
    }

    /// Mutate the state in place, notifying change listeners
    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.apply(f, None);
    }

    /// Mutate the state with a label, notifying change listeners and
    /// then dispatch listeners
    pub fn dispatch(&self, label: impl Into<String>, f: impl FnOnce(&mut S)) {
        self.apply(f, Some(label.into()));
    }

    fn apply(&self, f: impl FnOnce(&mut S), label: Option<String>) {
        let (snapshot, version) = {
            let mut state = self.inner.state.write().unwrap();
            f(&mut state);
            let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
            (state.clone(), version)
        };

        {
            let listeners = self.inner.changes.read().unwrap();
            for (_, listener) in listeners.iter() {
                listener(&snapshot);
            }
        }

        if let Some(label) = label {
            let dispatch = Dispatch { label, version };
            tracing::trace!(label = dispatch.label.as_str(), version, "store dispatch");
            let listeners = self.inner.dispatches.read().unwrap();
            for (_, listener) in listeners.iter() {
                listener(&dispatch);
            }
        }
    }

    /// Register a change listener, invoked once per mutation with the
    /// new state
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        let key = self
            .inner
            .changes
            .write()
            .unwrap()
            .insert(Box::new(listener));
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || remove_listener(&weak, key, ListenerKind::Change))
    }

    /// Register a dispatch listener, invoked once per labeled mutation
    pub fn on_dispatch(
        &self,
        listener: impl Fn(&Dispatch) + Send + Sync + 'static,
    ) -> Subscription {
        let key = self
            .inner
            .dispatches
            .write()
            .unwrap()
            .insert(Box::new(listener));
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || remove_listener(&weak, key, ListenerKind::Dispatch))
    }

    /// Create a read path into this store
    pub fn select<T: Send + Sync + 'static>(
        &self,
        read: impl Fn(&S) -> T + Send + Sync + 'static,
    ) -> Selection<S, T> {
        Selection::new(self.clone(), Arc::new(read))
    }

    /// Counters for the store's registries
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            listeners: self.inner.changes.read().unwrap().len(),
            dispatch_listeners: self.inner.dispatches.read().unwrap().len(),
            version: self.version(),
        }
    }
}

enum ListenerKind {
    Change,
    Dispatch,
}

fn remove_listener<S>(inner: &Weak<StoreInner<S>>, key: ListenerKey, kind: ListenerKind) {
    if let Some(inner) = inner.upgrade() {
        match kind {
            ListenerKind::Change => {
                inner.changes.write().unwrap().remove(key);
            }
            ListenerKind::Dispatch => {
                inner.dispatches.write().unwrap().remove(key);
            }
        }
    }
}

/// Counters for a store's listener registries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub listeners: usize,
    pub dispatch_listeners: usize,
    pub version: u64,
}

// =============================================================================
// NAMED STORE REGISTRY
// =============================================================================

/// Global registry of stores by state type and name
static STORE_REGISTRY: std::sync::LazyLock<Mutex<FxHashMap<(TypeId, String), Box<dyn Any + Send + Sync>>>> =
    std::sync::LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Get or create a named store
///
/// Stores are lazily created and cached globally. Multiple calls with
/// the same state type and name return handles to the same store.
///
/// # Example
///
/// ```rust
/// #[derive(Clone, Default)]
/// struct Session {
///     user: Option<String>,
/// }
///
/// let a = ripple_core::named::<Session>("session");
/// let b = ripple_core::named::<Session>("session");
///
/// a.update(|s| s.user = Some("ada".into()));
/// assert_eq!(b.get().user.as_deref(), Some("ada"));
/// # ripple_core::remove_named::<Session>("session");
/// ```
pub fn named<S: Clone + Send + Sync + Default + 'static>(name: &str) -> Store<S> {
    let key = (TypeId::of::<S>(), name.to_string());
    let mut registry = STORE_REGISTRY.lock().unwrap();

    if let Some(existing) = registry.get(&key) {
        return existing
            .downcast_ref::<Store<S>>()
            .expect("store type mismatch")
            .clone();
    }

    tracing::debug!(name, "creating named store");
    let store = Store::new(S::default());
    registry.insert(key, Box::new(store.clone()));
    store
}

/// Remove a named store from the registry
///
/// Existing handles keep working; the next [`named`] call for this
/// type and name creates a fresh store.
pub fn remove_named<S: 'static>(name: &str) {
    let key = (TypeId::of::<S>(), name.to_string());
    STORE_REGISTRY.lock().unwrap().remove(&key);
}

/// Clear the named store registry
pub fn clear_named() {
    STORE_REGISTRY.lock().unwrap().clear();
}
