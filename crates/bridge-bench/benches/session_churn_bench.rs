//! Session Registry open/close throughput.
//!
//! Measures the cost of the free-index scan on `open` and the matching
//! lock acquisition on `close`, both with and without a registry that has
//! already grown past its first five-slot batch.

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use bridge_core::session_registry::SessionRegistry;

fn bench_open_close_cold(c: &mut Criterion) {
    c.bench_function("open_close_cold_registry", |b| {
        b.iter(|| {
            let registry = SessionRegistry::new();
            let handle = registry.open(0, true, None, Arc::new(vec![])).unwrap();
            registry.close(handle).unwrap();
        });
    });
}

fn bench_open_into_grown_registry(c: &mut Criterion) {
    let registry = SessionRegistry::new();
    for _ in 0..64 {
        registry.open(0, true, None, Arc::new(vec![])).unwrap();
    }
    c.bench_function("open_into_64_session_registry", |b| {
        b.iter(|| {
            let handle = registry.open(0, true, None, Arc::new(vec![])).unwrap();
            registry.close(handle).unwrap();
        });
    });
}

fn bench_with_session(c: &mut Criterion) {
    let registry = SessionRegistry::new();
    let handle = registry.open(0, true, None, Arc::new(vec![])).unwrap();
    c.bench_function("with_session_lookup", |b| {
        b.iter(|| {
            registry
                .with_session(handle, |session| Ok(session.slot_id))
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_open_close_cold,
    bench_open_into_grown_registry,
    bench_with_session
);
criterion_main!(benches);
