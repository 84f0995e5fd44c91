//! Ripple Core
//!
//! This crate provides the state primitives the Ripple adapters observe:
//!
//! - **Store**: a single-value state container with synchronous change
//!   notification and a labeled dispatch side channel
//! - **Selections**: pure read paths into a store
//! - **Derivations**: computed combinations of one or more read paths
//! - **Update Futures**: handles to in-flight asynchronous state updates,
//!   with status snapshots and settlement listeners
//! - **Event Sinks**: outbound UI event channels (never treated as state)
//!
//! # Example
//!
//! ```rust
//! use ripple_core::Store;
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     count: i32,
//! }
//!
//! let store = Store::new(AppState::default());
//!
//! // Create a read path
//! let count = store.select(|s: &AppState| s.count);
//!
//! // Observe changes
//! let _sub = store.subscribe(|s| {
//!     println!("count is now {}", s.count);
//! });
//!
//! // Update the store
//! store.update(|s| s.count += 1);
//! assert_eq!(count.current(), 1);
//! ```

pub mod events;
pub mod future;
pub mod select;
pub mod store;
pub mod subscription;

pub use events::{event_channel, EventSink, Events};
pub use future::{FutureStatus, UpdateError, UpdateFuture};
pub use select::{Derivation, Selection, Watchable};
pub use store::{clear_named, named, remove_named, Dispatch, Store, StoreStats};
pub use subscription::Subscription;
