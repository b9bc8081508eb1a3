//! Thread-safe free list of reusable I/O contexts.
//!
//! The pool eagerly creates a configured number of contexts at construction,
//! each bound to one arena slice, and recycles them through a LIFO free list:
//! [`ContextPool::acquire`] pops the most recently released context (favoring
//! cache recency over fairness) and [`ContextPool::release`] resets and pushes
//! it back. When the free list is empty, `acquire` synthesizes a new context
//! on the spot instead of blocking or failing: the pool trades unbounded
//! memory growth for availability.
//!
//! # Thread Safety
//!
//! [`ContextPool`] is `Send + Sync` and cheap to clone; all clones share one
//! pool. A single mutex covers the free list, the created counter, and the
//! arena-growth path. The critical section is a stack push/pop plus optional
//! context construction: neither operation ever waits for another thread to
//! release a context.

use crate::{BufferArena, CompletionHandler, Error, IoContext};
use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Default per-context buffer length (32 KiB).
pub const DEFAULT_SLICE_SIZE: usize = 32 * 1024;

/// Configuration for a context pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of contexts created eagerly at construction.
    pub capacity: usize,
    /// Fixed buffer length of every context.
    pub slice_size: usize,
}

impl PoolConfig {
    /// Creates a configuration with the given capacity and the default
    /// 32 KiB slice size.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slice_size: DEFAULT_SLICE_SIZE,
        }
    }

    /// Validates the configuration, panicking on invalid values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity * slice_size` overflows `usize`.
    fn validate(&self) {
        assert!(
            self.capacity.checked_mul(self.slice_size).is_some(),
            "capacity ({}) * slice_size ({}) overflows usize",
            self.capacity,
            self.slice_size
        );
    }
}

/// Metrics for the context pool.
struct Metrics {
    /// Total contexts ever created.
    created: Gauge,
    /// Contexts currently on the free list.
    free: Gauge,
    /// Arena regions allocated.
    arena_regions: Gauge,
    /// Total acquire calls.
    acquires_total: Counter,
    /// Total successful release calls.
    releases_total: Counter,
    /// Total on-demand syntheses past the initial capacity.
    growth_total: Counter,
    /// Total release calls rejected with an absent context.
    release_errors_total: Counter,
}

impl Metrics {
    fn new(registry: &mut Registry) -> Self {
        let metrics = Self {
            created: Gauge::default(),
            free: Gauge::default(),
            arena_regions: Gauge::default(),
            acquires_total: Counter::default(),
            releases_total: Counter::default(),
            growth_total: Counter::default(),
            release_errors_total: Counter::default(),
        };
        registry.register(
            "context_pool_created",
            "Total number of contexts ever created by the pool",
            metrics.created.clone(),
        );
        registry.register(
            "context_pool_free",
            "Number of contexts currently on the free list",
            metrics.free.clone(),
        );
        registry.register(
            "context_pool_arena_regions",
            "Number of backing arena regions allocated",
            metrics.arena_regions.clone(),
        );
        registry.register(
            "context_pool_acquires_total",
            "Total number of context acquisitions",
            metrics.acquires_total.clone(),
        );
        registry.register(
            "context_pool_releases_total",
            "Total number of contexts returned to the free list",
            metrics.releases_total.clone(),
        );
        registry.register(
            "context_pool_growth_total",
            "Total number of contexts synthesized beyond the initial capacity",
            metrics.growth_total.clone(),
        );
        registry.register(
            "context_pool_release_errors_total",
            "Total number of release calls rejected with an absent context",
            metrics.release_errors_total.clone(),
        );
        metrics
    }
}

/// Shared mutable state, guarded by the pool's single mutex.
struct State {
    /// LIFO free list: most recently released context on top.
    free: Vec<IoContext>,
    arena: BufferArena,
    /// Monotonically non-decreasing count of contexts ever created.
    created: usize,
}

struct Inner {
    slice_size: usize,
    completion: Option<CompletionHandler>,
    metrics: Metrics,
    state: Mutex<State>,
}

impl Inner {
    /// Creates a fresh context bound to a new arena slice and to the pool's
    /// completion handler.
    fn synthesize(&self, state: &mut State) -> IoContext {
        // The request is exactly slice_size, so it can never exceed the
        // arena's limit; exhaustion resolves by region growth inside take_slice.
        let slice = state
            .arena
            .take_slice(self.slice_size)
            .expect("slice request within arena limit");
        state.created += 1;
        IoContext::new(slice, self.completion.clone())
    }
}

/// A bounded, growable pool of reusable I/O contexts.
///
/// Callers acquire a context before issuing an accept/send/receive operation
/// and release it back once the operation's completion is observed. The pool
/// guarantees no two `acquire` calls return the same context before a
/// matching `release`, and that every released context reaches the next
/// borrower with its transient fields cleared.
#[derive(Clone)]
pub struct ContextPool {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("slice_size", &self.inner.slice_size)
            .field("bound", &self.inner.completion.is_some())
            .finish()
    }
}

impl ContextPool {
    /// Creates a pool with exactly `config.capacity` ready contexts, each
    /// bound to one fresh arena slice and to a clone of `completion` (when
    /// provided). Pass `None` to create contexts without a completion
    /// binding: callers either bind one per context before use or use the
    /// pool purely as a buffer source.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid.
    pub fn new(
        config: PoolConfig,
        completion: Option<CompletionHandler>,
        registry: &mut Registry,
    ) -> Self {
        config.validate();
        let metrics = Metrics::new(registry);

        // Eager fill: the arena is pre-sized for exactly `capacity` slices,
        // so none of these requests trigger growth. Contexts are pushed in
        // slice order and popped LIFO, so a fresh pool hands out slices in
        // reverse-creation order; no ordering is promised beyond
        // most-recently-released-first.
        let mut arena = BufferArena::new(config.capacity, config.slice_size);
        let mut free = Vec::with_capacity(config.capacity);
        for _ in 0..config.capacity {
            let slice = arena
                .take_slice(config.slice_size)
                .expect("slice request within arena limit");
            free.push(IoContext::new(slice, completion.clone()));
        }
        metrics.created.set(config.capacity as i64);
        metrics.free.set(free.len() as i64);
        metrics.arena_regions.set(arena.regions() as i64);

        debug!(
            capacity = config.capacity,
            slice_size = config.slice_size,
            "initialized context pool"
        );
        Self {
            inner: Arc::new(Inner {
                slice_size: config.slice_size,
                completion,
                metrics,
                state: Mutex::new(State {
                    free,
                    arena,
                    created: config.capacity,
                }),
            }),
        }
    }

    /// Takes a ready context off the free list, or synthesizes a new one when
    /// the list is empty. Never blocks and never fails; exhaustion always
    /// resolves by allocating, never by waiting.
    pub fn acquire(&self) -> IoContext {
        let mut state = self.inner.state.lock().unwrap();
        self.inner.metrics.acquires_total.inc();
        let context = match state.free.pop() {
            Some(context) => context,
            None => {
                let context = self.inner.synthesize(&mut state);
                debug!(created = state.created, "free list empty, created context");
                self.inner.metrics.growth_total.inc();
                self.inner.metrics.created.set(state.created as i64);
                self.inner
                    .metrics
                    .arena_regions
                    .set(state.arena.regions() as i64);
                context
            }
        };
        self.inner.metrics.free.set(state.free.len() as i64);
        context
    }

    /// Returns a context to the free list, clearing its transient fields
    /// (`socket`, `peer`, `token`) and resetting `reuse_socket` to its
    /// default. The buffer slice and completion binding are untouched. The
    /// reset is unconditional: a caller can never leak a stale handle or
    /// token into the next borrower.
    ///
    /// # Errors
    ///
    /// [`Error::NullContext`] if `context` is `None` (a caller double-return
    /// or dispatch bug, surfaced fail-fast). The free list is unaffected.
    pub fn release(&self, context: Option<IoContext>) -> Result<(), Error> {
        let Some(mut context) = context else {
            self.inner.metrics.release_errors_total.inc();
            return Err(Error::NullContext);
        };

        // The caller owns the context exclusively at this point, so the reset
        // can happen outside the critical section.
        context.reset();

        let mut state = self.inner.state.lock().unwrap();
        state.free.push(context);
        self.inner.metrics.releases_total.inc();
        self.inner.metrics.free.set(state.free.len() as i64);
        Ok(())
    }

    /// Returns the current free-list size. Observability only: the value is
    /// stale the moment the lock is dropped and is never used for admission.
    pub fn count(&self) -> usize {
        self.inner.state.lock().unwrap().free.len()
    }

    /// Returns the total number of contexts ever created. Monotonically
    /// non-decreasing; always `>= count()`.
    pub fn created(&self) -> usize {
        self.inner.state.lock().unwrap().created
    }
}
