//! # campus-store
//!
//! Document-store capability consumed by the campus social layer.
//!
//! The crate defines the [`DocumentStore`] trait (get / set / update /
//! delete by path, ordered and limited queries, all-or-nothing batched
//! writes, a server timestamp sentinel) together with the value model every
//! backend speaks.  [`MemoryStore`] is an embedded backend used for local
//! runs and tests; [`TimeoutStore`] wraps any backend with an explicit
//! per-call deadline.

pub mod batch;
pub mod memory;
pub mod query;
pub mod store;
pub mod timeout;
pub mod value;

mod error;

pub use batch::{WriteBatch, WriteOp};
pub use error::{ErrorCode, Result, StoreError};
pub use memory::{FaultScope, MemoryStore};
pub use query::{Direction, Filter, OrderBy, Query};
pub use store::DocumentStore;
pub use timeout::TimeoutStore;
pub use value::{Document, FieldValue, Fields, GeoPoint};
