use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use rand_distr::{Distribution, Zipf};

use dacdict::Dict;

use criterion::{
    criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, Criterion, SamplingMode,
};

const SAMPLE_SIZE: usize = 30;
const WARM_UP_TIME: Duration = Duration::from_secs(5);
const MEASURE_TIME: Duration = Duration::from_secs(10);

const SEED_VALUES: u64 = 334;
const SEED_QUERIES: u64 = 114514;
const NUM_VALUES: usize = 1 << 20;
const NUM_QUERIES: usize = 1000;

fn gen_zipf_values(len: usize, seed: u64) -> Vec<u64> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    let zipf = Zipf::new(u64::MAX, 1.15).unwrap();
    (0..len).map(|_| zipf.sample(&mut rng) as u64 - 1).collect()
}

fn gen_random_positions(len: usize, max: usize, seed: u64) -> Vec<usize> {
    let mut rng = ChaChaRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0..max)).collect()
}

fn criterion_dict_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("timing_dict_access_zipf_1M");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP_TIME);
    group.measurement_time(MEASURE_TIME);
    group.sampling_mode(SamplingMode::Flat);

    let dict = Dict::from_slice(&gen_zipf_values(NUM_VALUES, SEED_VALUES)).unwrap();
    perform_access(&mut group, &dict);
}

fn criterion_dict_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("timing_dict_iterate_zipf_1M");
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(WARM_UP_TIME);
    group.measurement_time(MEASURE_TIME);
    group.sampling_mode(SamplingMode::Flat);

    let dict = Dict::from_slice(&gen_zipf_values(NUM_VALUES, SEED_VALUES)).unwrap();

    group.bench_function("iter", |b| {
        b.iter(|| dict.iter().fold(0u64, |acc, (_, v)| acc.wrapping_add(v)))
    });

    let mut out = Vec::new();
    group.bench_function("read_into", |b| {
        b.iter(|| {
            dict.read_into(&mut out);
            out.last().copied()
        })
    });
}

fn perform_access(group: &mut BenchmarkGroup<WallTime>, dict: &Dict) {
    let queries = gen_random_positions(NUM_QUERIES, dict.len(), SEED_QUERIES);
    group.bench_function("get_u64", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &pos in &queries {
                sum = sum.wrapping_add(dict.get_u64(pos).unwrap());
            }
            sum
        })
    });
}

criterion_group!(benches, criterion_dict_access, criterion_dict_iterate);
criterion_main!(benches);
