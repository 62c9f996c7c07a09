use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fss::{eval_all_sum, Bgi1};
use rand::thread_rng;

const LOG_DOMAIN_SIZES: [u32; 4] = [8, 12, 16, 20];
const RANGE_BITS: u32 = 32;

fn bench_bgi1_keygen(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bgi1-keygen");
    let beta = 0x1337_4247;
    for log_domain_size in LOG_DOMAIN_SIZES.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(log_domain_size),
            log_domain_size,
            |b, &log_domain_size| {
                let scheme = Bgi1::new(log_domain_size, RANGE_BITS).unwrap();
                b.iter(|| {
                    let (_key_0, _key_1) = scheme.gen_random(42, beta, &mut thread_rng()).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_bgi1_eval_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bgi1-eval_all");
    let beta = 0x1337_4247;
    for log_domain_size in LOG_DOMAIN_SIZES.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(log_domain_size),
            log_domain_size,
            |b, &log_domain_size| {
                let scheme = Bgi1::new(log_domain_size, RANGE_BITS).unwrap();
                let (key_0, _key_1) = scheme.gen_random(42, beta, &mut thread_rng()).unwrap();
                let mut out = vec![0u64; 1 << log_domain_size];
                b.iter(|| {
                    scheme.eval_all(&key_0, &mut out).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_bgi1_eval_all_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("Bgi1-eval_all_sum-4-threads");
    let beta = 0x1337_4247;
    for log_domain_size in LOG_DOMAIN_SIZES.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(log_domain_size),
            log_domain_size,
            |b, &log_domain_size| {
                let scheme = Bgi1::new(log_domain_size, RANGE_BITS).unwrap();
                let (key_0, key_1) = scheme.gen_random(42, beta, &mut thread_rng()).unwrap();
                let keys = [key_0, key_1];
                let mut out = vec![0u64; 1 << log_domain_size];
                b.iter(|| {
                    eval_all_sum(&scheme, &keys, 4, &mut out).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_all_bgi1(c: &mut Criterion) {
    bench_bgi1_keygen(c);
    bench_bgi1_eval_all(c);
    bench_bgi1_eval_all_sum(c);
}

criterion_group!(
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_all_bgi1
);
criterion_main!(benches);
