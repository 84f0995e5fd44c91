//! Ripple Streams
//!
//! Push-stream adapters over the `ripple_core` primitives:
//!
//! - **Watch Streams**: any [`Watchable`](ripple_core::Watchable)
//!   becomes an infinite stream that yields the current value first,
//!   then one item per change notification
//! - **Status Streams**: an update future becomes a two-item stream of
//!   status snapshots (initial, then terminal), or a one-item stream of
//!   the settled value
//! - **Async Bridge**: stream-based producers are normalized into the
//!   single value the store's async-update pathway expects
//! - **Host Adapter**: one-time registration of host-framework hooks
//!   and dispatch forwarding into the host's change-detection tick
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use ripple_core::Store;
//! use ripple_streams::ObserveExt;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store = Store::new(0i32);
//! let mut counts = store.select(|n: &i32| *n).observe();
//!
//! // The current value arrives before any mutation.
//! assert_eq!(counts.next().await, Some(0));
//!
//! store.set(5);
//! assert_eq!(counts.next().await, Some(5));
//! # });
//! ```

pub mod adapter;
pub mod bridge;
pub mod status;
pub mod watch;

pub use adapter::{HostAdapter, HostHooks};
pub use bridge::{first_value, BridgeError, StoreStreamExt};
pub use status::{ObserveUpdateExt, StatusStream, ValueStream};
pub use watch::{ObserveExt, WatchStream};
