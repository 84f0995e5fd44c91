//! Watch streams over selections and derivations
//!
//! [`ObserveExt::observe`] adapts any [`Watchable`] into a push stream.
//! Each call is an independent subscription: the stream queues the
//! current value synchronously at construction, then yields one item
//! per change notification. The stream never ends and never errors on
//! its own; dropping it deregisters the change listener.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use ripple_core::{Subscription, Watchable};

/// Stream of values from a [`Watchable`]
pub struct WatchStream<T> {
    rx: UnboundedReceiver<T>,
    _subscription: Subscription,
}

impl<T> Stream for WatchStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Stream adaptation for watchable values
pub trait ObserveExt<T>: Watchable<T> {
    /// Subscribe as a stream: current value first, then every change
    fn observe(&self) -> WatchStream<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.current());
        let subscription = self.on_change(Box::new(move |value: &T| {
            let _ = tx.send(value.clone());
        }));
        WatchStream {
            rx,
            _subscription: subscription,
        }
    }
}

impl<T, W: Watchable<T> + ?Sized> ObserveExt<T> for W {}
