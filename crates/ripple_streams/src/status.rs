//! Status and value streams over update futures
//!
//! [`ObserveUpdateExt::observe_status`] yields the status snapshot taken
//! at subscription time, then exactly one terminal snapshot when the
//! update settles, then completes. The order is fixed: initial first,
//! terminal second, completion strictly after the terminal item. An
//! already-settled update still produces both snapshots, even though
//! the terminal one duplicates the initial.
//!
//! [`ObserveUpdateExt::observe_value`] skips the intermediate status
//! and yields a single `Result`: the post-commit state on resolution or
//! the rejection reason.
//!
//! Dropping either stream before settlement suppresses all further
//! items; it never cancels the in-flight update.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use ripple_core::{FutureStatus, Subscription, UpdateError, UpdateFuture};

/// Two-item stream of status snapshots
pub struct StatusStream<S> {
    rx: UnboundedReceiver<FutureStatus<S>>,
    remaining: u8,
    subscription: Option<Subscription>,
}

impl<S> Stream for StatusStream<S> {
    type Item = FutureStatus<S>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.remaining == 0 {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(status)) => {
                this.remaining -= 1;
                if this.remaining == 0 {
                    this.subscription = None;
                }
                Poll::Ready(Some(status))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// One-item stream of the settled value
pub struct ValueStream<S> {
    rx: UnboundedReceiver<Result<S, UpdateError>>,
    done: bool,
    subscription: Option<Subscription>,
}

impl<S> Stream for ValueStream<S> {
    type Item = Result<S, UpdateError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(item)) => {
                this.done = true;
                this.subscription = None;
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Stream adaptation for update futures
pub trait ObserveUpdateExt<S> {
    /// Observe the update as status snapshots: initial, terminal, done
    fn observe_status(&self) -> StatusStream<S>;

    /// Observe only the settled outcome
    fn observe_value(&self) -> ValueStream<S>;
}

impl<S: Clone + Send + Sync + 'static> ObserveUpdateExt<S> for UpdateFuture<S> {
    fn observe_status(&self) -> StatusStream<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.status());
        let subscription = self.on_settle(move |status: &FutureStatus<S>| {
            let _ = tx.send(status.clone());
        });
        StatusStream {
            rx,
            remaining: 2,
            subscription: Some(subscription),
        }
    }

    fn observe_value(&self) -> ValueStream<S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.on_settle(move |status: &FutureStatus<S>| {
            let item = match &status.error {
                Some(error) => Err(error.clone()),
                None => Ok(status.value.clone()),
            };
            let _ = tx.send(item);
        });
        ValueStream {
            rx,
            done: false,
            subscription: Some(subscription),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{FutureExt, StreamExt};
    use ripple_core::Store;
    use tokio::sync::oneshot;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct TestState {
        total: i64,
    }

    fn gated_update(
        store: &Store<TestState>,
    ) -> (oneshot::Sender<Result<i64, UpdateError>>, UpdateFuture<TestState>) {
        let (tx, rx) = oneshot::channel();
        let update = store.update_async(
            async move {
                match rx.await {
                    Ok(result) => result,
                    Err(e) => Err(UpdateError::new(e.to_string())),
                }
            },
            |state, amount| state.total += amount,
        );
        (tx, update)
    }

    #[tokio::test]
    async fn test_status_stream_resolution() {
        let store = Store::new(TestState::default());
        let (gate, update) = gated_update(&store);
        let mut statuses = update.observe_status();

        let first = statuses.next().await.unwrap();
        assert!(first.loading);
        assert!(!first.resolved);
        assert!(!first.rejected);
        assert!(first.error.is_none());

        gate.send(Ok(41)).unwrap();
        update.settled().await.unwrap();

        let second = statuses.next().await.unwrap();
        assert!(!second.loading);
        assert!(second.resolved);
        assert!(!second.rejected);
        assert!(second.error.is_none());
        assert_eq!(second.value.total, 41);

        // Exactly two snapshots, then completion.
        assert_eq!(statuses.next().await.map(|s| s.resolved), None);
    }

    #[tokio::test]
    async fn test_status_stream_rejection() {
        let store = Store::new(TestState { total: 10 });
        let (gate, update) = gated_update(&store);
        let mut statuses = update.observe_status();

        gate.send(Err(UpdateError::new("nope"))).unwrap();
        let _ = update.settled().await;

        let first = statuses.next().await.unwrap();
        assert!(first.loading);

        let second = statuses.next().await.unwrap();
        assert!(second.rejected);
        assert!(!second.resolved);
        assert_eq!(second.error.as_ref().map(UpdateError::message), Some("nope"));
        // The update did not commit; the value is the pre-update state.
        assert_eq!(second.value.total, 10);

        assert!(statuses.next().await.is_none());
    }

    #[tokio::test]
    async fn test_status_stream_after_settlement() {
        let store = Store::new(TestState::default());
        let (gate, update) = gated_update(&store);
        gate.send(Ok(5)).unwrap();
        update.settled().await.unwrap();

        // Subscribing after settlement still yields both snapshots;
        // the terminal one duplicates the initial.
        let mut statuses = update.observe_status();
        let first = statuses.next().await.unwrap();
        let second = statuses.next().await.unwrap();
        assert!(first.resolved && second.resolved);
        assert_eq!(first.value.total, 5);
        assert_eq!(second.value.total, 5);
        assert!(statuses.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_before_settlement_suppresses_observation() {
        let store = Store::new(TestState::default());
        let (gate, update) = gated_update(&store);

        let statuses = update.observe_status();
        drop(statuses);

        gate.send(Ok(3)).unwrap();
        update.settled().await.unwrap();

        // The update still ran to completion.
        assert_eq!(store.get().total, 3);
    }

    #[tokio::test]
    async fn test_value_stream_resolution() {
        let store = Store::new(TestState::default());
        let (gate, update) = gated_update(&store);
        let mut values = update.observe_value();

        // Nothing before settlement.
        assert!(values.next().now_or_never().is_none());

        gate.send(Ok(8)).unwrap();
        update.settled().await.unwrap();

        let settled = values.next().await.unwrap().unwrap();
        assert_eq!(settled.total, 8);
        assert!(values.next().await.is_none());
    }

    #[tokio::test]
    async fn test_value_stream_rejection() {
        let store = Store::new(TestState::default());
        let (gate, update) = gated_update(&store);
        let mut values = update.observe_value();

        gate.send(Err(UpdateError::new("offline"))).unwrap();
        let _ = update.settled().await;

        let err = values.next().await.unwrap().unwrap_err();
        assert_eq!(err.message(), "offline");
        assert!(values.next().await.is_none());
    }
}
