//! Criterion micro-benchmarks for record construction and enumeration.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use reap_core::RecordLimits;
use reap_record::{Record, RecordBuf};
use reap_test_utils::ForeignBuffer;

/// Build a foreign record of `n` short subscriber names.
fn make_buffer(n: usize) -> ForeignBuffer {
    let names: Vec<String> = (0..n).map(|i| format!("subscriber-{i}")).collect();
    ForeignBuffer::new(&names)
}

fn bench_from_ptr(c: &mut Criterion) {
    let buffer = make_buffer(1_000);
    let limits = RecordLimits::default();
    c.bench_function("record_from_ptr", |b| {
        b.iter(|| {
            // SAFETY: the buffer outlives the view.
            let record = unsafe { Record::from_ptr(buffer.as_ptr(), &limits) }.unwrap();
            black_box(record);
        });
    });
}

fn bench_enumerate_1k(c: &mut Criterion) {
    let buffer = make_buffer(1_000);
    // SAFETY: the buffer outlives the view.
    let record = unsafe { Record::from_ptr(buffer.as_ptr(), &RecordLimits::default()) }.unwrap();
    c.bench_function("enumerate_1k", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            for entry in record.entries().flatten() {
                bytes += entry.len();
            }
            black_box(bytes);
        });
    });
}

fn bench_nth_last(c: &mut Criterion) {
    let buffer = make_buffer(10_000);
    // SAFETY: the buffer outlives the view.
    let record = unsafe { Record::from_ptr(buffer.as_ptr(), &RecordLimits::default()) }.unwrap();
    c.bench_function("enumerate_nth_last_10k", |b| {
        b.iter(|| black_box(record.entries().nth(9_999)));
    });
}

fn bench_owned_fill_1k(c: &mut Criterion) {
    let name = c"subscriber";
    c.bench_function("owned_fill_1k", |b| {
        b.iter(|| {
            let mut buf = RecordBuf::with_capacity(1_000).unwrap();
            for i in 0..1_000 {
                // SAFETY: `name` is a 'static NUL-terminated string.
                unsafe { buf.set_entry(i, name.as_ptr()) }.unwrap();
            }
            black_box(buf);
        });
    });
}

criterion_group!(
    benches,
    bench_from_ptr,
    bench_enumerate_1k,
    bench_nth_last,
    bench_owned_fill_1k
);
criterion_main!(benches);
