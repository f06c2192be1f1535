use criterion::{black_box, criterion_group, criterion_main, Criterion};
use packable::{Decoder, Encoder, Packable, Result};

struct Sample {
    id: i64,
    name: String,
    score: f64,
    tags: Vec<i32>,
}

impl Packable for Sample {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.put_i64(0, self.id)?;
        encoder.put_string(1, &self.name)?;
        encoder.put_cf64(2, self.score)?;
        encoder.put_i32_array(3, &self.tags)?;
        Ok(())
    }

    fn decode(decoder: &Decoder) -> Result<Self> {
        Ok(Sample {
            id: decoder.get_i64(0)?,
            name: decoder.get_string(1)?,
            score: decoder.get_cf64(2)?,
            tags: decoder.get_i32_array(3)?,
        })
    }
}

fn sample() -> Sample {
    Sample {
        id: 123_456_789,
        name: "packable-bench-sample".into(),
        score: 98.6,
        tags: vec![1, 2, 3, 4, 5],
    }
}

fn bench_encode(c: &mut Criterion) {
    c.bench_function("packable_encode_sample", |b| {
        b.iter_batched(sample, |value| black_box(value.encode(&mut Encoder::new())), criterion::BatchSize::SmallInput)
    });
}

fn bench_decode(c: &mut Criterion) {
    c.bench_function("packable_decode_sample", |b| {
        b.iter_batched(
            || {
                let mut encoder = Encoder::new();
                sample().encode(&mut encoder).unwrap();
                encoder.finish()
            },
            |bytes| {
                let decoder = Decoder::new(&bytes).unwrap();
                black_box(Sample::decode(&decoder).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
