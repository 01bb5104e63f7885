//! Benchmarks for layout decoding, fitness evaluation and search.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use ranch_layout::{
    compute::{
        decode,
        evolution::{FitnessEvaluator, GenomeRng, optimize},
    },
    schema::{Catalogs, OptimizerConfig, PopulationConfig, RanchConfig},
};

fn bench_decode(c: &mut Criterion) {
    let catalogs = Catalogs::default();
    let ranch = RanchConfig::default();
    let mut rng = GenomeRng::new(42);
    let genomes: Vec<_> = (0..64).map(|_| rng.random_genome()).collect();

    c.bench_function("decode_layout", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % genomes.len();
            decode(black_box(&genomes[i]), &ranch, &catalogs.species)
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let catalogs = Catalogs::default();
    let mut rng = GenomeRng::new(7);
    let genome = rng.random_genome();

    for (width, height) in [(40.0, 30.0), (80.0, 60.0), (160.0, 120.0)] {
        let ranch = RanchConfig {
            plot_width: width,
            plot_height: height,
            ..Default::default()
        };
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &genome,
            |b, genome| {
                b.iter(|| evaluator.evaluate(black_box(genome)));
            },
        );
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    let catalogs = Catalogs::default();

    for size in [20, 50, 100] {
        let config = OptimizerConfig {
            population: PopulationConfig {
                size,
                max_generations: 10,
                ..Default::default()
            },
            random_seed: Some(1),
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &config, |b, config| {
            b.iter(|| optimize(black_box(config.clone()), &catalogs, |_| {}));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_evaluate, bench_search);
criterion_main!(benches);
