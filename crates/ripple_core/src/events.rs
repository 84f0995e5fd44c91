//! Outbound UI event channels
//!
//! An [`EventSink`] carries events *out* of a component (clicks,
//! submissions) toward whoever drains the paired [`Events`] receiver.
//! Event sinks are not state: the snapshot combiner in
//! `ripple_combine` explicitly excludes them from combination.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Create a connected sink/receiver pair
pub fn event_channel<E>() -> (EventSink<E>, Events<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, Events { rx })
}

/// Emitting end of an event channel
pub struct EventSink<E> {
    tx: UnboundedSender<E>,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E> EventSink<E> {
    /// Emit an event
    ///
    /// Events emitted after the receiver is dropped are discarded.
    pub fn emit(&self, event: E) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped, receiver gone");
        }
    }

    /// Whether the receiving end is still alive
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Receiving end of an event channel
pub struct Events<E> {
    rx: UnboundedReceiver<E>,
}

impl<E> Events<E> {
    /// Take the next queued event, if any
    pub fn try_next(&mut self) -> Option<E> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next event; `None` once every sink is dropped
    pub async fn next(&mut self) -> Option<E> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum UiEvent {
        Clicked,
        Submitted(String),
    }

    #[test]
    fn test_emit_and_drain() {
        let (sink, mut events) = event_channel();

        sink.emit(UiEvent::Clicked);
        sink.emit(UiEvent::Submitted("form".into()));

        assert_eq!(events.try_next(), Some(UiEvent::Clicked));
        assert_eq!(events.try_next(), Some(UiEvent::Submitted("form".into())));
        assert_eq!(events.try_next(), None);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (sink, events) = event_channel();
        drop(events);

        assert!(!sink.is_open());
        // Does not panic.
        sink.emit(UiEvent::Clicked);
    }

    #[tokio::test]
    async fn test_async_next() {
        let (sink, mut events) = event_channel();

        sink.emit(UiEvent::Clicked);
        assert_eq!(events.next().await, Some(UiEvent::Clicked));

        drop(sink);
        assert_eq!(events.next().await, None);
    }
}
