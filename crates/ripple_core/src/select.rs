//! Selections and derivations
//!
//! A [`Selection`] is a pure read path into a [`Store`]: a projection
//! function applied to the live state. A [`Derivation`] combines one or
//! more read paths through a pure combining function. Both implement
//! [`Watchable`], the seam the stream adapters build on: a current value
//! plus a change listener registration.
//!
//! Change listeners fire once per underlying change notification with
//! the freshly computed value. No equality check is applied; if the
//! store mutates N times, listeners fire N times.

use smallvec::SmallVec;
use std::sync::Arc;

use crate::store::Store;
use crate::subscription::Subscription;

/// A value that can be read now and observed for changes
///
/// This is the extension seam of the workspace: anything implementing
/// `Watchable` can be adapted to a push stream.
pub trait Watchable<T>: Send + Sync {
    /// Compute the current value
    fn current(&self) -> T;

    /// Register a change listener, invoked with each new value
    fn on_change(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription;
}

/// A pure read path into a store
pub struct Selection<S, T> {
    store: Store<S>,
    read: Arc<dyn Fn(&S) -> T + Send + Sync>,
}

impl<S, T> Clone for Selection<S, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            read: self.read.clone(),
        }
    }
}

impl<S, T> Selection<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    pub(crate) fn new(store: Store<S>, read: Arc<dyn Fn(&S) -> T + Send + Sync>) -> Self {
        Self { store, read }
    }

    /// Project the live state through the read path
    pub fn current(&self) -> T {
        let read = &self.read;
        self.store.with(|state| read(state))
    }

    /// Compose a further projection onto this read path
    pub fn map<U>(&self, f: impl Fn(&T) -> U + Send + Sync + 'static) -> Selection<S, U>
    where
        U: Send + Sync + 'static,
    {
        let read = self.read.clone();
        Selection {
            store: self.store.clone(),
            read: Arc::new(move |state| f(&read(state))),
        }
    }

    /// The store this selection reads from
    pub fn store(&self) -> &Store<S> {
        &self.store
    }
}

impl<S, T> Watchable<T> for Selection<S, T>
where
    S: Clone + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    fn current(&self) -> T {
        Selection::current(self)
    }

    fn on_change(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        let read = self.read.clone();
        self.store.subscribe(move |state| listener(&read(state)))
    }
}

/// Registers a raw "something changed" listener with one source
type SourceHook = Box<dyn Fn(Arc<dyn Fn() + Send + Sync>) -> Subscription + Send + Sync>;

/// A computed combination of one or more watchable reads
///
/// Derivations recompute on every read and on every source change
/// notification. Sources may live on different stores; a derivation
/// over two selections of the same store recomputes once per source
/// notification, so a single mutation of that store produces two
/// change callbacks.
pub struct Derivation<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    sources: Arc<SmallVec<[SourceHook; 2]>>,
}

impl<T> Clone for Derivation<T> {
    fn clone(&self) -> Self {
        Self {
            compute: self.compute.clone(),
            sources: self.sources.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Derivation<T> {
    /// Derive from a single source
    pub fn map<A, W, F>(source: W, f: F) -> Self
    where
        A: Send + Sync + 'static,
        W: Watchable<A> + 'static,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        let source = Arc::new(source);
        let compute = {
            let source = source.clone();
            Arc::new(move || f(&source.current()))
        };
        let mut sources: SmallVec<[SourceHook; 2]> = SmallVec::new();
        sources.push(hook(source));
        Self {
            compute,
            sources: Arc::new(sources),
        }
    }

    /// Derive from two sources
    pub fn zip2<A, B, WA, WB, F>(a: WA, b: WB, combine: F) -> Self
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        WA: Watchable<A> + 'static,
        WB: Watchable<B> + 'static,
        F: Fn(&A, &B) -> T + Send + Sync + 'static,
    {
        let a = Arc::new(a);
        let b = Arc::new(b);
        let compute = {
            let (a, b) = (a.clone(), b.clone());
            Arc::new(move || combine(&a.current(), &b.current()))
        };
        let mut sources: SmallVec<[SourceHook; 2]> = SmallVec::new();
        sources.push(hook(a));
        sources.push(hook(b));
        Self {
            compute,
            sources: Arc::new(sources),
        }
    }

    /// Derive from three sources
    pub fn zip3<A, B, C, WA, WB, WC, F>(a: WA, b: WB, c: WC, combine: F) -> Self
    where
        A: Send + Sync + 'static,
        B: Send + Sync + 'static,
        C: Send + Sync + 'static,
        WA: Watchable<A> + 'static,
        WB: Watchable<B> + 'static,
        WC: Watchable<C> + 'static,
        F: Fn(&A, &B, &C) -> T + Send + Sync + 'static,
    {
        let a = Arc::new(a);
        let b = Arc::new(b);
        let c = Arc::new(c);
        let compute = {
            let (a, b, c) = (a.clone(), b.clone(), c.clone());
            Arc::new(move || combine(&a.current(), &b.current(), &c.current()))
        };
        let mut sources: SmallVec<[SourceHook; 2]> = SmallVec::new();
        sources.push(hook(a));
        sources.push(hook(b));
        sources.push(hook(c));
        Self {
            compute,
            sources: Arc::new(sources),
        }
    }

    /// Recompute the current value from the sources
    pub fn current(&self) -> T {
        (self.compute)()
    }
}

fn hook<A, W>(source: Arc<W>) -> SourceHook
where
    A: Send + Sync + 'static,
    W: Watchable<A> + 'static,
{
    Box::new(move |notify: Arc<dyn Fn() + Send + Sync>| {
        source.on_change(Box::new(move |_| notify()))
    })
}

impl<T: Send + Sync + 'static> Watchable<T> for Derivation<T> {
    fn current(&self) -> T {
        Derivation::current(self)
    }

    fn on_change(&self, listener: Box<dyn Fn(&T) + Send + Sync>) -> Subscription {
        let listener: Arc<dyn Fn(&T) + Send + Sync> = Arc::from(listener);
        let compute = self.compute.clone();
        let notify: Arc<dyn Fn() + Send + Sync> = Arc::new(move || listener(&compute()));
        Subscription::join(self.sources.iter().map(|source| source(notify.clone())))
    }
}
