use criterion::{black_box, criterion_group, criterion_main, Criterion};
use packable::io::Cursor;
use packable::varint::{read_varint32, write_varint32};

fn bench_encode(c: &mut Criterion) {
    c.bench_function("varint32_encode", |b| {
        b.iter_batched(
            || {
                let buf = [0u8; 8];
                let value: i32 = rand::random();
                (buf, value)
            },
            |(mut buf, value)| {
                let mut cursor = Cursor::new(&mut buf[..]);
                black_box(write_varint32(&mut cursor, value).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("varint32_decode", |b| {
        b.iter_batched(
            || {
                let mut buf = [0u8; 8];
                let value: i32 = rand::random();
                let n = {
                    let mut cursor = Cursor::new(&mut buf[..]);
                    write_varint32(&mut cursor, value).unwrap()
                };
                (buf, n)
            },
            |(buf, n)| {
                let mut cursor = Cursor::new(&buf[..n]);
                black_box(read_varint32(&mut cursor).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
