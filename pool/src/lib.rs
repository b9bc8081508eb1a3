//! Pool reusable I/O contexts backed by an arena of fixed-size network buffers.
//!
//! # Overview
//!
//! A socket server issuing many concurrent accept/send/receive operations
//! needs a buffer and a bundle of per-operation metadata for each one.
//! Allocating these per operation churns the heap and fragments memory; this
//! crate instead pre-allocates everything once and recycles it:
//!
//! - [`BufferArena`]: one large contiguous byte region, carved into
//!   fixed-length, pairwise-disjoint slices.
//! - [`ContextPool`]: a thread-safe LIFO free list of [`IoContext`] objects,
//!   each owning one arena slice for its entire lifetime.
//!
//! Callers [`acquire`](ContextPool::acquire) a context before issuing an
//! operation and [`release`](ContextPool::release) it once the operation's
//! completion is observed. The pool does not interpret buffer contents,
//! manage socket lifetimes, or impose backpressure: when the free list runs
//! dry, `acquire` synthesizes a new context (growing the arena as needed)
//! rather than blocking or failing.
//!
//! # Thread Safety
//!
//! [`ContextPool`] is `Send + Sync` and cheap to clone; all clones share the
//! same free list under a single mutex. An acquired context is moved out of
//! the pool, so the holder has exclusive access to its buffer and metadata
//! until release.
//!
//! # Example
//!
//! ```
//! use prometheus_client::registry::Registry;
//! use sockpool::{ContextPool, PoolConfig, SocketHandle};
//!
//! let mut registry = Registry::default();
//! let pool = ContextPool::new(PoolConfig::new(64), None, &mut registry);
//! assert_eq!(pool.count(), 64);
//!
//! // Borrow a context for one in-flight operation.
//! let mut context = pool.acquire();
//! context.socket = Some(SocketHandle::new(7));
//! context.buffer_mut().as_mut()[..5].copy_from_slice(b"hello");
//!
//! // ... issue the operation, observe its completion ...
//!
//! // Return it; transient fields are cleared for the next borrower.
//! pool.release(Some(context)).unwrap();
//! assert_eq!(pool.count(), 64);
//! ```

mod arena;
pub use arena::{BufferArena, BufferSlice};
mod context;
pub use context::{CompletionHandler, IoContext, SocketHandle};
mod error;
pub use error::Error;
mod pool;
pub use pool::{ContextPool, PoolConfig, DEFAULT_SLICE_SIZE};
