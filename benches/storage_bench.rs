//! Benchmarks for hostkv storage operations

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use hostkv::host::MemoryStorage;
use hostkv::{codec, KeyCodec, KvBackend};

fn memory_backend() -> KvBackend {
    KvBackend::new(
        KeyCodec::default(),
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryStorage::new()),
        64 * 1024,
    )
}

fn storage_benchmarks(c: &mut Criterion) {
    let keys = KeyCodec::default();
    c.bench_function("derive_key", |b| {
        b.iter(|| keys.derive(black_box("local"), black_box("page-00000042")))
    });

    let kv = memory_backend();
    let value = vec![b'x'; 4096];
    c.bench_function("kv_write_4k", |b| {
        b.iter(|| kv.write("local", black_box("bench"), &value))
    });

    let mut buf = vec![0u8; 4097];
    c.bench_function("kv_read_4k", |b| {
        b.iter(|| kv.read("local", black_box("bench"), &mut buf))
    });

    let page: Vec<u8> = (0..4096u32).map(|i| if i % 7 == 0 { 0 } else { i as u8 }).collect();
    c.bench_function("text_encode_page", |b| b.iter(|| codec::encode(black_box(&page))));
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
