//! Combine-latest over named field streams
//!
//! [`CombineBuilder`] collects a component's observable fields by name
//! and builds one [`Combined`] stream. The combined stream yields a
//! fresh [`Snapshot`] on every constituent emission, carrying each
//! field's latest value. Without a seed it stays silent until every
//! field has emitted at least once; with [`CombineBuilder::seed`] each
//! field starts from the placeholder and the first constituent emission
//! already produces a snapshot.
//!
//! With zero declared fields the combined stream yields exactly one
//! empty snapshot and completes. When every constituent stream has
//! completed, the combined stream completes as well.
//!
//! Each `build()` subscribes independently; combining the same sources
//! twice produces two unrelated combined streams.

use futures::stream::{BoxStream, SelectAll, Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};

use ripple_core::EventSink;

use crate::snapshot::{SharedSnapshot, Snapshot, SnapshotReader};

/// Classification of a component field
///
/// Only streams participate in combination. Event sinks carry outbound
/// UI events, not displayable state, and plain values have no change
/// notification to observe; both are dropped by [`combine_fields`].
pub enum Field<V> {
    /// An observable field; participates in combination
    Stream(BoxStream<'static, V>),
    /// An outbound event channel; never combined
    Event,
    /// A plain, non-observable value; never combined
    Value(V),
}

impl<V> Field<V> {
    /// Declare an observable field
    pub fn stream(stream: impl Stream<Item = V> + Send + 'static) -> Self {
        Field::Stream(stream.boxed())
    }

    /// Declare an outbound event channel
    pub fn event<E>(_sink: &EventSink<E>) -> Self {
        Field::Event
    }

    /// Declare a plain value
    pub fn value(value: V) -> Self {
        Field::Value(value)
    }

    /// Whether this field participates in combination
    pub fn is_stream(&self) -> bool {
        matches!(self, Field::Stream(_))
    }
}

impl<V> std::fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Stream(_) => f.write_str("Field::Stream"),
            Field::Event => f.write_str("Field::Event"),
            Field::Value(_) => f.write_str("Field::Value"),
        }
    }
}

/// Collect a component's field declarations, dropping the
/// non-observable ones
pub fn combine_fields<V, N>(fields: impl IntoIterator<Item = (N, Field<V>)>) -> CombineBuilder<V>
where
    V: Clone + Send + 'static,
    N: Into<String>,
{
    let mut builder = CombineBuilder::new();
    let mut skipped = 0usize;
    for (name, field) in fields {
        match field {
            Field::Stream(stream) => builder = builder.field(name, stream),
            Field::Event | Field::Value(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::trace!(skipped, "dropped non-observable fields");
    }
    builder
}

/// Builder for a [`Combined`] stream
pub struct CombineBuilder<V> {
    fields: Vec<(String, BoxStream<'static, V>)>,
    seed: Option<V>,
}

impl<V: Clone + Send + 'static> Default for CombineBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + 'static> CombineBuilder<V> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            seed: None,
        }
    }

    /// Declare an observable field by name
    pub fn field(
        mut self,
        name: impl Into<String>,
        stream: impl Stream<Item = V> + Send + 'static,
    ) -> Self {
        self.fields.push((name.into(), stream.boxed()));
        self
    }

    /// Seed every field with a placeholder so the combined stream
    /// emits on the very first constituent emission
    pub fn seed(mut self, placeholder: V) -> Self {
        self.seed = Some(placeholder);
        self
    }

    /// Subscribe to every declared field and build the combined stream
    pub fn build(self) -> Combined<V> {
        let names: Vec<String> = self.fields.iter().map(|(name, _)| name.clone()).collect();
        let latest: Vec<Option<V>> = match &self.seed {
            Some(placeholder) => vec![Some(placeholder.clone()); names.len()],
            None => vec![None; names.len()],
        };

        let mut merged: SelectAll<BoxStream<'static, (usize, V)>> = SelectAll::new();
        for (index, (_, stream)) in self.fields.into_iter().enumerate() {
            merged.push(stream.map(move |value| (index, value)).boxed());
        }

        let state = if names.is_empty() {
            CombinedState::EmptyPending
        } else {
            CombinedState::Running
        };

        Combined {
            names,
            merged,
            latest,
            cell: Arc::new(RwLock::new(None)),
            state,
        }
    }
}

enum CombinedState {
    /// No fields declared; one empty snapshot is still owed
    EmptyPending,
    Running,
    Done,
}

/// Combined stream of per-emission snapshots
pub struct Combined<V> {
    names: Vec<String>,
    merged: SelectAll<BoxStream<'static, (usize, V)>>,
    latest: Vec<Option<V>>,
    cell: SharedSnapshot<V>,
    state: CombinedState,
}

impl<V: Clone> Combined<V> {
    /// Synchronous access to the latest snapshot
    pub fn reader(&self) -> SnapshotReader<V> {
        SnapshotReader::new(self.cell.clone())
    }

    /// Declared field names, in declaration order
    pub fn field_names(&self) -> &[String] {
        &self.names
    }

    fn publish(&self, snapshot: &Snapshot<V>) {
        *self.cell.write().unwrap() = Some(snapshot.clone());
    }
}

impl<V: Clone + Send + Unpin + 'static> Stream for Combined<V> {
    type Item = Snapshot<V>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.state {
            CombinedState::Done => return Poll::Ready(None),
            CombinedState::EmptyPending => {
                let snapshot = Snapshot::new();
                this.publish(&snapshot);
                this.state = CombinedState::Done;
                return Poll::Ready(Some(snapshot));
            }
            CombinedState::Running => {}
        }

        loop {
            match Pin::new(&mut this.merged).poll_next(cx) {
                Poll::Ready(Some((index, value))) => {
                    this.latest[index] = Some(value);
                    if this.latest.iter().all(Option::is_some) {
                        let snapshot: Snapshot<V> = this
                            .names
                            .iter()
                            .cloned()
                            .zip(this.latest.iter().filter_map(|slot| slot.clone()))
                            .collect();
                        this.publish(&snapshot);
                        return Poll::Ready(Some(snapshot));
                    }
                    // Some field has not emitted yet; keep draining.
                }
                Poll::Ready(None) => {
                    this.state = CombinedState::Done;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use ripple_core::{event_channel, Store};
    use ripple_streams::ObserveExt;

    #[derive(Clone, Default)]
    struct TestState {
        letter: &'static str,
    }

    fn letters(store: &Store<TestState>) -> impl Stream<Item = &'static str> + Send {
        store.select(|s: &TestState| s.letter).observe()
    }

    #[tokio::test]
    async fn test_combined_sequence_and_reader() {
        let left = Store::new(TestState { letter: "a" });
        let right = Store::new(TestState { letter: "b" });

        let mut combined = CombineBuilder::new()
            .field("left", letters(&left))
            .field("right", letters(&right))
            .build();
        let reader = combined.reader();
        assert_eq!(reader.latest(), None);

        // Both seeds are queued; the first snapshot appears once both
        // have been drained.
        let first = combined.next().await.unwrap();
        assert_eq!(first["left"], "a");
        assert_eq!(first["right"], "b");
        assert_eq!(reader.latest(), Some(first.clone()));

        left.update(|s| s.letter = "b");
        let second = combined.next().await.unwrap();
        assert_eq!(second["left"], "b");
        assert_eq!(second["right"], "b");
        assert_eq!(reader.latest(), Some(second));
    }

    #[tokio::test]
    async fn test_one_snapshot_per_constituent_emission() {
        let left = Store::new(TestState { letter: "a" });
        let right = Store::new(TestState { letter: "x" });

        let mut combined = CombineBuilder::new()
            .field("left", letters(&left))
            .field("right", letters(&right))
            .build();

        let _ = combined.next().await.unwrap();

        // Three emissions, three snapshots, no coalescing.
        left.update(|s| s.letter = "b");
        let snapshot = combined.next().await.unwrap();
        assert_eq!((snapshot["left"], snapshot["right"]), ("b", "x"));

        left.update(|s| s.letter = "c");
        let snapshot = combined.next().await.unwrap();
        assert_eq!((snapshot["left"], snapshot["right"]), ("c", "x"));

        right.update(|s| s.letter = "y");
        let snapshot = combined.next().await.unwrap();
        assert_eq!((snapshot["left"], snapshot["right"]), ("c", "y"));
    }

    #[tokio::test]
    async fn test_silent_until_all_fields_emit() {
        let ready = Store::new(TestState { letter: "a" });
        let (pending_tx, pending_rx) = futures::channel::mpsc::unbounded::<&'static str>();

        let mut combined = CombineBuilder::new()
            .field("ready", letters(&ready))
            .field("pending", pending_rx)
            .build();
        let reader = combined.reader();

        // One field has never emitted; no snapshot yet.
        assert!(combined.next().now_or_never().is_none());
        assert_eq!(reader.latest(), None);

        pending_tx.unbounded_send("p").unwrap();
        let snapshot = combined.next().await.unwrap();
        assert_eq!(snapshot["ready"], "a");
        assert_eq!(snapshot["pending"], "p");
    }

    #[tokio::test]
    async fn test_seed_emits_on_first_emission() {
        let ready = Store::new(TestState { letter: "a" });
        let silent = futures::stream::pending::<&'static str>();

        let mut combined = CombineBuilder::new()
            .seed("")
            .field("ready", letters(&ready))
            .field("silent", silent)
            .build();

        let snapshot = combined.next().await.unwrap();
        assert_eq!(snapshot["ready"], "a");
        // The silent field carries the placeholder.
        assert_eq!(snapshot["silent"], "");
    }

    #[tokio::test]
    async fn test_event_sinks_and_plain_values_excluded() {
        let store = Store::new(TestState { letter: "a" });
        let other = Store::new(TestState { letter: "b" });
        let (sink, _events) = event_channel::<&'static str>();

        let mut combined = combine_fields([
            ("letters", Field::stream(letters(&store))),
            ("more", Field::stream(letters(&other))),
            ("clicks", Field::event(&sink)),
            ("title", Field::value("plain")),
        ])
        .build();

        let snapshot = combined.next().await.unwrap();
        let keys: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        // Exactly the observable fields, in declaration order.
        assert_eq!(keys, vec!["letters", "more"]);
    }

    #[tokio::test]
    async fn test_zero_fields_emits_one_empty_snapshot() {
        let mut combined = CombineBuilder::<&'static str>::new().build();
        let reader = combined.reader();

        let snapshot = combined.next().await.unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(reader.latest(), Some(Snapshot::new()));
        assert!(combined.next().await.is_none());
    }

    #[tokio::test]
    async fn test_completes_when_constituents_complete() {
        let combined = CombineBuilder::new()
            .field("a", futures::stream::iter(["1"]))
            .field("b", futures::stream::iter(["2"]))
            .build();

        let snapshots: Vec<Snapshot<&'static str>> = combined.collect().await;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0]["a"], "1");
        assert_eq!(snapshots[0]["b"], "2");
    }

    #[tokio::test]
    async fn test_rebuilding_combines_independently() {
        let store = Store::new(TestState { letter: "a" });

        let mut first = CombineBuilder::new().field("f", letters(&store)).build();
        let mut second = CombineBuilder::new().field("f", letters(&store)).build();

        store.update(|s| s.letter = "b");

        // Each combined stream has its own subscription and sees the
        // full sequence.
        assert_eq!(first.next().await.unwrap()["f"], "a");
        assert_eq!(first.next().await.unwrap()["f"], "b");
        assert_eq!(second.next().await.unwrap()["f"], "a");
        assert_eq!(second.next().await.unwrap()["f"], "b");
    }
}
