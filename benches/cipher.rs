//! Benchmarks for the cipher hot paths: word sampling, encryption, and the
//! backtracking decoder.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fsmcrypt::prelude::*;

/// First engine at or after `base_seed` that generates and pools cleanly.
fn working_engine(base_seed: u64) -> (CipherEngine, CipherConfig) {
    for seed in base_seed..base_seed + 64 {
        let config = CipherConfig {
            seed: Some(seed),
            ..CipherConfig::default()
        };
        let Ok(machines) = Generator::from_config(&config).generate(
            &config.source_alphabet,
            &config.cipher_alphabet,
            config.num_states,
        ) else {
            continue;
        };
        if let Ok(engine) = CipherEngine::new(machines, &config) {
            return (engine, config);
        }
    }
    panic!("no seed in {base_seed}.. produced a working engine");
}

fn bench_sampling(c: &mut Criterion) {
    let (engine, config) = working_engine(1);
    let machine = engine.machines().iter().next().unwrap().clone();
    let mut sampler = WordSampler::from_config(&config);

    c.bench_function("sample_balanced", |b| {
        b.iter(|| black_box(sampler.sample_balanced(black_box(&machine)).unwrap()))
    });
}

fn bench_encrypt(c: &mut Criterion) {
    let (mut engine, _) = working_engine(100);

    c.bench_function("encrypt_7_letters", |b| {
        b.iter(|| black_box(engine.encrypt(black_box("abc def")).unwrap()))
    });
}

fn bench_decrypt(c: &mut Criterion) {
    let (mut engine, _) = working_engine(200);
    let ciphertext = engine.encrypt("abc def").unwrap();

    c.bench_function("decrypt_7_letters", |b| {
        b.iter(|| black_box(engine.decrypt(black_box(&ciphertext)).unwrap()))
    });
}

criterion_group!(benches, bench_sampling, bench_encrypt, bench_decrypt);
criterion_main!(benches);
