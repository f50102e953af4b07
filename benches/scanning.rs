use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use memedit::core::types::{ScanValue, ValueType};
use memedit::memory::scanner::scan_chunk;

fn chunk_with_hits(size: usize, pattern: &[u8], spacing: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    let mut offset = spacing;
    while offset + pattern.len() <= size {
        data[offset..offset + pattern.len()].copy_from_slice(pattern);
        offset += spacing;
    }
    data
}

fn bench_scan_chunk(c: &mut Criterion) {
    let pattern = 123_456_789i32.to_le_bytes();
    let mut group = c.benchmark_group("scan_chunk");

    for &size in &[64 * 1024usize, 1024 * 1024] {
        let sparse = chunk_with_hits(size, &pattern, size / 4);
        let dense = chunk_with_hits(size, &pattern, 64);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("sparse_{}k", size / 1024), |b| {
            b.iter(|| scan_chunk(black_box(&sparse), black_box(&pattern), 4))
        });
        group.bench_function(format!("dense_{}k", size / 1024), |b| {
            b.iter(|| scan_chunk(black_box(&dense), black_box(&pattern), 4))
        });
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    c.bench_function("parse_int32", |b| {
        b.iter(|| ScanValue::parse(black_box("123456789"), ValueType::Int32))
    });
    c.bench_function("decode_float64", |b| {
        let bytes = std::f64::consts::PI.to_le_bytes();
        b.iter(|| ScanValue::from_bytes(black_box(&bytes), ValueType::Float64))
    });
}

criterion_group!(benches, bench_scan_chunk, bench_codec);
criterion_main!(benches);
