use criterion::{black_box, criterion_group, criterion_main, Criterion};
use datapak::codec::{new_decoder, new_encoder, CompMethod, StreamDecoder, StreamEncoder};

fn roundtrip(method: CompMethod, data: &[u8]) -> Vec<u8> {
    let mut enc = new_encoder(method, 3, None).unwrap();
    let mut compressed = enc.feed(data).unwrap();
    compressed.extend(enc.finish().unwrap());

    let mut dec = new_decoder(method, None).unwrap();
    let mut out = dec.feed(&compressed).unwrap();
    out.extend(dec.finish().unwrap());
    out
}

fn bench_compression(c: &mut Criterion) {
    let data = vec![0u8; 1024 * 1024];

    c.bench_function("zstd_compress_1mb", |b| {
        b.iter(|| {
            let mut enc = new_encoder(CompMethod::Zstd, 3, None).unwrap();
            black_box(enc.feed(black_box(&data)).unwrap());
            black_box(enc.finish().unwrap());
        })
    });

    c.bench_function("lz4_compress_1mb", |b| {
        b.iter(|| {
            let mut enc = new_encoder(CompMethod::Lz4, 0, None).unwrap();
            black_box(enc.feed(black_box(&data)).unwrap());
            black_box(enc.finish().unwrap());
        })
    });

    c.bench_function("zlib_roundtrip_1mb", |b| b.iter(|| black_box(roundtrip(CompMethod::Zlib, black_box(&data)))));
}

criterion_group!(benches, bench_compression);
criterion_main!(benches);
