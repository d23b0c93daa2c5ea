// Key material codec benchmarks.
//
// Covers key pair generation per curve, public key parsing with and without
// hints (auto-detection is the expensive path), and JSON round trips.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use chargemesh_protocol::crypto::{
    Algorithm, Encoding, KeyPair, ParseOptions, PublicKey, Serialization,
};

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("keypair/generate");
    for alg in Algorithm::SUPPORTED {
        group.bench_with_input(BenchmarkId::from_parameter(alg), &alg, |b, &alg| {
            b.iter(|| KeyPair::generate(alg).unwrap());
        });
    }
    group.finish();
}

fn bench_parse_public_key(c: &mut Criterion) {
    let pair = KeyPair::generate(Algorithm::Secp256r1).unwrap();
    let raw_hex = hex::encode(pair.public_key_bytes());
    let der_b64 = pair
        .clone()
        .with_serialization(Serialization::AsnDer)
        .public_key()
        .encoded_value();

    c.bench_function("public_key/parse_hinted_hex", |b| {
        let options = ParseOptions::new()
            .algorithm(Algorithm::Secp256r1)
            .encoding(Encoding::Hex);
        b.iter(|| PublicKey::try_parse(&raw_hex, options).unwrap());
    });

    c.bench_function("public_key/parse_auto_asn1", |b| {
        b.iter(|| PublicKey::try_parse(&der_b64, ParseOptions::new()).unwrap());
    });

    c.bench_function("public_key/parse_auto_curve", |b| {
        let options = ParseOptions::new().auto_detect_algorithm();
        b.iter(|| PublicKey::try_parse(&raw_hex, options).unwrap());
    });
}

fn bench_json(c: &mut Criterion) {
    let pair = KeyPair::generate(Algorithm::Secp384r1)
        .unwrap()
        .with_encoding(Encoding::Hex);
    let json = pair.to_json();

    c.bench_function("keypair/to_json", |b| {
        b.iter(|| pair.to_json());
    });

    c.bench_function("keypair/from_json", |b| {
        b.iter(|| KeyPair::from_json(&json).unwrap());
    });
}

criterion_group!(benches, bench_generate, bench_parse_public_key, bench_json);
criterion_main!(benches);
