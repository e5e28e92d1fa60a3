//! Globally unique 64-bit ids without per-id coordination.
//!
//! A [`Wuid`] composes each id from an epoch handed out by an external
//! coordinator (for instance a counter row in a database) and a 40-bit local
//! counter. Issuing an id is one atomic increment. When the counter has
//! consumed 80% of its space the generator fetches a new epoch in the
//! background, so callers never block on the coordinator.
//!
//! ```
//! use wuid::{MemoryEpochSource, Wuid};
//!
//! let wuid = Wuid::builder("invoices").shard(2).build().unwrap();
//! wuid.load_h24_and_renew(MemoryEpochSource::new(41)).unwrap();
//!
//! let id = wuid.next();
//! let parts = wuid.decompose(id);
//! assert_eq!(parts.shard, Some(2));
//! assert_eq!(parts.epoch, 42);
//! assert_eq!(parts.counter, 1);
//! ```
//!
//! ## Features
//! - `parking-lot`: guard the renewal callback with a `parking_lot` mutex
//! - `cache-padded`: pad the counter to a cache line
//! - `tracing`: spans on the generator plus [`TracingLogger`]
//! - `async-tokio`: [`TokioExecutor`] for running renewals on a Tokio runtime
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod executor;
mod generator;
mod layout;
mod logger;
mod renew;
mod source;

pub use crate::error::*;
pub use crate::executor::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::logger::*;
pub use crate::renew::RenewFn;
pub use crate::source::*;
