//! Bridging stream producers into the async-update pathway
//!
//! The store's async-update pathway awaits a single value. Producers
//! that hand back a stream instead are normalized with [`first_value`]:
//! the first emission resolves the bridge, everything after it is
//! ignored. Future-based producers need no bridging at all, so the two
//! producer shapes are interchangeable at the call site.

use futures::{Stream, StreamExt};
use thiserror::Error;

use ripple_core::{Store, UpdateError, UpdateFuture};

/// Failure of a stream-to-value bridge
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The producer stream ended without emitting
    #[error("stream ended before producing a value")]
    EmptyStream,
}

/// Resolve to the first emission of `stream`
pub async fn first_value<St>(stream: St) -> Result<St::Item, BridgeError>
where
    St: Stream,
{
    futures::pin_mut!(stream);
    stream.next().await.ok_or(BridgeError::EmptyStream)
}

/// Stream-producer entry into the async-update pathway
pub trait StoreStreamExt<S> {
    /// Commit the first emission of `stream` via `apply`
    ///
    /// An empty stream rejects the update with the bridge error as the
    /// rejection reason.
    fn update_from_stream<St, A>(&self, stream: St, apply: A) -> UpdateFuture<S>
    where
        St: Stream + Send + 'static,
        St::Item: Send + 'static,
        A: FnOnce(&mut S, St::Item) + Send + 'static;
}

impl<S: Clone + Send + Sync + 'static> StoreStreamExt<S> for Store<S> {
    fn update_from_stream<St, A>(&self, stream: St, apply: A) -> UpdateFuture<S>
    where
        St: Stream + Send + 'static,
        St::Item: Send + 'static,
        A: FnOnce(&mut S, St::Item) + Send + 'static,
    {
        self.update_async(
            async move {
                first_value(stream)
                    .await
                    .map_err(|error| UpdateError::new(error.to_string()))
            },
            apply,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_first_value_takes_first_emission() {
        let value = first_value(stream::iter([10, 20, 30])).await.unwrap();
        assert_eq!(value, 10);
    }

    #[tokio::test]
    async fn test_first_value_empty_stream() {
        let result = first_value(stream::iter(Vec::<i32>::new())).await;
        assert_eq!(result, Err(BridgeError::EmptyStream));
    }

    #[tokio::test]
    async fn test_update_from_stream_commits_first_value() {
        let store = Store::new(0i64);
        let update = store.update_from_stream(stream::iter([7i64, 99]), |state, value| {
            *state += value;
        });

        assert_eq!(update.settled().await.unwrap(), 7);
        assert_eq!(store.get(), 7);
    }

    #[tokio::test]
    async fn test_update_from_empty_stream_rejects() {
        let store = Store::new(0i64);
        let update = store.update_from_stream(stream::iter(Vec::<i64>::new()), |state, value| {
            *state += value;
        });

        let err = update.settled().await.unwrap_err();
        assert!(err.message().contains("stream ended"));
        assert_eq!(store.get(), 0);
    }
}
