use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use kingvault::{ByteArray, CompressionType, Database, DbOptions, WriteOptions};

fn bench_put_chunk(c: &mut Criterion) {
    const VALUE_SIZE: usize = 256 * 1024;
    let value = vec![7u8; VALUE_SIZE];

    let mut group = c.benchmark_group("put_chunk");
    group.throughput(Throughput::Bytes(VALUE_SIZE as u64));

    for compression in [CompressionType::None, CompressionType::Lz4, CompressionType::Zstd] {
        group.bench_function(format!("{compression:?}"), |b| {
            b.iter(|| {
                let db = Database::open(
                    DbOptions::new("/tmp/kingvault-bench")
                        .maximum_chunk_size(64 * 1024)
                        .compression(compression),
                )
                .unwrap();
                db.put(&WriteOptions::default(), b"bench-key", &value).unwrap();
                std::hint::black_box(
                    db.get(&Default::default(), b"bench-key").unwrap(),
                );
            });
        });
    }

    group.finish();
}

fn bench_oversized_put_split(c: &mut Criterion) {
    const VALUE_SIZE: usize = 4 * 1024 * 1024;
    let value = vec![9u8; VALUE_SIZE];

    let mut group = c.benchmark_group("put_chunk_split");
    group.throughput(Throughput::Bytes(VALUE_SIZE as u64));
    group.bench_function("uncompressed_64kib_chunks", |b| {
        b.iter(|| {
            let db = Database::open(
                DbOptions::new("/tmp/kingvault-bench-split").maximum_chunk_size(64 * 1024),
            )
            .unwrap();
            db.put_chunk(
                &WriteOptions::default(),
                b"bench-key",
                ByteArray::borrowed(&value),
                0,
                value.len() as u64,
            )
            .unwrap();
        });
    });
    group.finish();
}

criterion_group!(benches, bench_put_chunk, bench_oversized_put_split);
criterion_main!(benches);
