use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use space::ByteSpace;
use tempfile::tempdir;

const N_BYTES: usize = 256 * 1024;

/// A space with `N_BYTES` defined bytes in 32-byte records, with a 32-byte
/// hole after every record.
fn build_space() -> ByteSpace {
    let mut space = ByteSpace::new();
    let chunk = [0xA5u8; 32];
    for i in 0..N_BYTES / 32 {
        space.update_bytes((i * 64) as i64, &chunk).unwrap();
    }
    space
}

fn read_benchmark(c: &mut Criterion) {
    let mut space = build_space();
    space.refresh_index().unwrap();
    c.bench_function("read_bytes_4k_across_holes", |b| {
        let mut address = 0i64;
        b.iter(|| {
            let bytes = space.read_bytes(black_box(address), 4096).unwrap();
            address = (address + 4096) % (N_BYTES as i64 * 2);
            bytes
        });
    });
}

fn gap_fill_benchmark(c: &mut Criterion) {
    c.bench_function("update_bytes_fill_64k_gap", |b| {
        b.iter_batched(
            || ByteSpace::parse(":020000040001F9\n:00000001FF\n"),
            |mut space| {
                space.update_bytes(0x1_0000, &[0x5A; 64 * 1024]).unwrap();
                space
            },
            BatchSize::SmallInput,
        );
    });
}

fn parse_serialize_benchmark(c: &mut Criterion) {
    let text = build_space().to_hex_string();
    c.bench_function("parse_8k_records", |b| {
        b.iter(|| ByteSpace::parse(black_box(&text)));
    });

    let space = ByteSpace::parse(&text);
    c.bench_function("save_8k_records", |b| {
        b.iter_batched(
            || tempdir().unwrap(),
            |dir| space.save(dir.path().join("bench.hex")).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    read_benchmark,
    gap_fill_benchmark,
    parse_serialize_benchmark
);
criterion_main!(benches);
