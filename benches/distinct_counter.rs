#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::hash::BuildHasherDefault;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput,
};
use distinct_counter::{threshold, DistinctCounter};
use hyperloglogplus::HyperLogLog as HyperLogLogTrait;
use pprof::criterion::{Output, PProfProfiler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabled::settings::{Settings, Style};
use tabled::{Table, Tabled};
use wyhash::WyHash;

/// Insert and estimate operations are benchmarked against cardinalities ranging from 0 to
/// `DEFAULT_MAX_CARDINALITY` or environment variable `N` (if defined) with cardinality doubled
/// with every iteration as [0, 1, 2, ..., N].
const DEFAULT_MAX_CARDINALITY: usize = 65536;
/// Stream length every counter is sized for
const STREAM_LEN: usize = 1 << 20;

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf));
    targets = benchmark
}
criterion_main!(benches);

fn benchmark(c: &mut Criterion) {
    let bench_results_path = std::env::var("BENCH_RESULTS_PATH").unwrap();
    let max_cardinality = std::env::var("N")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CARDINALITY);

    let cardinalities: Vec<usize> = std::iter::once(0)
        .chain((0..).map(|c| 1 << c))
        .take_while(|&c| c <= max_cardinality)
        .collect();

    let mut group = c.benchmark_group("insert");
    for &cardinality in &cardinalities {
        group.throughput(Throughput::Elements(cardinality.max(1) as u64));
        bench_insert::<Counter10>(&mut group, cardinality);
        bench_insert::<Counter5>(&mut group, cardinality);
        bench_insert::<ProbabilisticCollections>(&mut group, cardinality);
        bench_insert::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let mut group = c.benchmark_group("estimate");
    group.throughput(Throughput::Elements(1));
    for &cardinality in &cardinalities {
        bench_estimate::<Counter10>(&mut group, cardinality);
        bench_estimate::<Counter5>(&mut group, cardinality);
        bench_estimate::<ProbabilisticCollections>(&mut group, cardinality);
        bench_estimate::<HyperLogLogPlus>(&mut group, cardinality);
    }
    group.finish();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            distinct_counter_10: measure_allocations::<Counter10>(cardinality),
            distinct_counter_5: measure_allocations::<Counter5>(cardinality),
            probabilistic_collections: measure_allocations::<ProbabilisticCollections>(cardinality),
            hyperloglogplus: measure_allocations::<HyperLogLogPlus>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    std::fs::write(
        format!("{}/memory_usage.md", bench_results_path),
        Table::new(results).with(table_config).to_string(),
    )
    .unwrap();

    let results: Vec<StatRecord> = cardinalities
        .iter()
        .map(|&cardinality| StatRecord {
            cardinality,
            distinct_counter_10: measure_error::<Counter10>(cardinality),
            distinct_counter_5: measure_error::<Counter5>(cardinality),
            probabilistic_collections: measure_error::<ProbabilisticCollections>(cardinality),
            hyperloglogplus: measure_error::<HyperLogLogPlus>(cardinality),
        })
        .collect();

    let table_config = Settings::default().with(Style::markdown());
    std::fs::write(
        format!("{}/relative_error.md", bench_results_path),
        Table::new(results).with(table_config).to_string(),
    )
    .unwrap();
}

/// Distinct count estimator operations shared by all benchmarked implementations.
trait DistinctCountTrait {
    fn new() -> Self;
    fn insert(&mut self, item: usize);
    fn estimate(&mut self) -> usize;
    fn name() -> String;
}

fn bench_insert<E: DistinctCountTrait>(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            b.iter(|| {
                let mut estimator = E::new();
                for i in 0..black_box(cardinality) {
                    estimator.insert(black_box(i));
                }
            });
        },
    );
}

fn bench_estimate<E: DistinctCountTrait>(group: &mut BenchmarkGroup<WallTime>, cardinality: usize) {
    group.bench_with_input(
        BenchmarkId::new(E::name(), cardinality),
        &cardinality,
        |b, &cardinality| {
            let mut estimator = E::new();
            for i in 0..black_box(cardinality) {
                estimator.insert(black_box(i));
            }
            b.iter(|| estimator.estimate());
        },
    );
}

fn measure_allocations<E: DistinctCountTrait>(cardinality: usize) -> String {
    let _profiler = dhat::Profiler::builder().testing().build();
    let mut estimator = E::new();
    for i in 0..cardinality {
        estimator.insert(i);
    }
    let stats = dhat::HeapStats::get();
    format!(
        "{} / {} / {}",
        std::mem::size_of::<E>(),
        stats.total_bytes,
        stats.max_bytes,
    )
}

fn measure_error<E: DistinctCountTrait>(cardinality: usize) -> String {
    let n = 100;
    let mut total_relative_error: f64 = 0.0;
    let mut rng = StdRng::seed_from_u64(12345);
    for _ in 0..n {
        let mut estimator = E::new();
        for _ in 0..cardinality {
            estimator.insert(rng.gen());
        }
        let relative_error = if cardinality == 0 {
            0.0
        } else {
            (estimator.estimate() as f64 - cardinality as f64).abs() / cardinality as f64
        };
        total_relative_error += relative_error;
    }
    let avg_relative_error = total_relative_error / (n as f64);

    if avg_relative_error < 1.0 {
        format!("{:.4}", avg_relative_error)
    } else {
        format!("{:.2e}", avg_relative_error)
    }
}

#[derive(Tabled)]
struct StatRecord {
    cardinality: usize,
    distinct_counter_10: String,
    distinct_counter_5: String,
    probabilistic_collections: String,
    hyperloglogplus: String,
}

/// `DistinctCounter` sized for `EPSILON_PCT`% relative error with 99% confidence
struct DistinctCounterBench<const EPSILON_PCT: usize>(DistinctCounter<usize>);

type Counter10 = DistinctCounterBench<10>;
type Counter5 = DistinctCounterBench<5>;

impl<const EPSILON_PCT: usize> DistinctCountTrait for DistinctCounterBench<EPSILON_PCT> {
    fn new() -> Self {
        let epsilon = EPSILON_PCT as f64 / 100.0;
        let thresh = threshold(epsilon, 0.01, STREAM_LEN).unwrap();
        Self(DistinctCounter::new(thresh, StdRng::seed_from_u64(0)).unwrap())
    }

    fn insert(&mut self, item: usize) {
        self.0.insert(item).unwrap();
    }

    fn estimate(&mut self) -> usize {
        self.0.estimate() as usize
    }

    fn name() -> String {
        format!("distinct-counter-eps{}", EPSILON_PCT)
    }
}

struct ProbabilisticCollections(probabilistic_collections::hyperloglog::HyperLogLog<usize>);

impl DistinctCountTrait for ProbabilisticCollections {
    fn new() -> Self {
        Self(probabilistic_collections::hyperloglog::HyperLogLog::new(
            0.004,
        ))
    }

    fn insert(&mut self, item: usize) {
        self.0.insert(&item);
    }

    fn estimate(&mut self) -> usize {
        self.0.len() as usize
    }

    fn name() -> String {
        "probabilistic-collections".to_string()
    }
}

struct HyperLogLogPlus(hyperloglogplus::HyperLogLogPlus<usize, BuildHasherDefault<WyHash>>);

impl DistinctCountTrait for HyperLogLogPlus {
    fn new() -> Self {
        Self(
            hyperloglogplus::HyperLogLogPlus::new(12, BuildHasherDefault::<WyHash>::default())
                .unwrap(),
        )
    }

    fn insert(&mut self, item: usize) {
        self.0.insert(&item);
    }

    fn estimate(&mut self) -> usize {
        self.0.count() as usize
    }

    fn name() -> String {
        "hyperloglogplus".to_string()
    }
}
