//! Ripple Combine
//!
//! Combine-latest snapshots over a component's observable fields:
//!
//! - **Fields**: explicit classification of a component's fields:
//!   streams participate, event sinks and plain values are excluded
//! - **Combined**: one stream that yields a fresh name → value snapshot
//!   on every constituent emission
//! - **Readers**: synchronous access to the latest snapshot for
//!   template binding
//!
//! # Example
//!
//! ```rust
//! use futures::StreamExt;
//! use ripple_combine::CombineBuilder;
//! use ripple_core::Store;
//! use ripple_streams::ObserveExt;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let title = Store::new("untitled".to_string());
//! let body = Store::new("".to_string());
//!
//! let mut combined = CombineBuilder::new()
//!     .field("title", title.select(|t: &String| t.clone()).observe())
//!     .field("body", body.select(|b: &String| b.clone()).observe())
//!     .build();
//! let reader = combined.reader();
//!
//! let snapshot = combined.next().await.unwrap();
//! assert_eq!(snapshot["title"], "untitled");
//! assert_eq!(reader.latest(), Some(snapshot));
//! # });
//! ```

pub mod combine;
pub mod snapshot;

pub use combine::{combine_fields, CombineBuilder, Combined, Field};
pub use snapshot::{Snapshot, SnapshotReader};
