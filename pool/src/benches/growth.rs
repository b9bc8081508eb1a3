use criterion::{criterion_group, BatchSize, Criterion};
use prometheus_client::registry::Registry;
use sockpool::{ContextPool, PoolConfig};

/// Growth path: every acquire finds the free list empty and synthesizes a new
/// context, periodically paying for a fresh arena region.
fn bench_acquire_exhausted(c: &mut Criterion) {
    for slice_size in [4096, 32 * 1024] {
        c.bench_function(&format!("acquire_exhausted/slice_size={slice_size}"), |b| {
            b.iter_batched(
                || {
                    let mut registry = Registry::default();
                    ContextPool::new(
                        PoolConfig {
                            capacity: 0,
                            slice_size,
                        },
                        None,
                        &mut registry,
                    )
                },
                |pool| {
                    let mut contexts = Vec::with_capacity(64);
                    for _ in 0..64 {
                        contexts.push(pool.acquire());
                    }
                    (pool, contexts)
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_acquire_exhausted
}
