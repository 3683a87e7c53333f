// Performance benchmarks for the build phase and per-request operations
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand::rngs::StdRng;
use rankx_attribution::AttributionCache;
use rankx_core::{
    CounterfactualEvaluator, Entity, EntityId, EntityStore, FeatureSchema, LinearModel, RankIndex,
};
use rankx_similarity::SimilarityEngine;
use std::sync::Arc;

const FEATURES: usize = 40;

fn generate_store(size: usize, rng: &mut StdRng) -> EntityStore {
    let names: Vec<String> = (0..FEATURES).map(|f| format!("feature_{}", f)).collect();
    let schema = FeatureSchema::new(names).unwrap();
    let entities = (0..size)
        .map(|i| {
            let values: Vec<f64> = (0..FEATURES).map(|_| rng.random_range(0.0..100.0)).collect();
            Entity::from_values(i as u64, &values).with_outcome(rng.random_range(0.0..10.0))
        })
        .collect();
    EntityStore::new(schema, entities).unwrap()
}

fn generate_model(rng: &mut StdRng) -> LinearModel {
    let names = (0..FEATURES).map(|f| format!("feature_{}", f)).collect();
    let coefficients = (0..FEATURES).map(|_| rng.random_range(-1.0..1.0)).collect();
    LinearModel::new(names, 1.0, coefficients).with_baseline(vec![50.0; FEATURES])
}

fn benchmark_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    let mut rng = StdRng::seed_from_u64(42);

    for size in [1_000, 10_000].iter() {
        let store = generate_store(*size, &mut rng);
        let model = generate_model(&mut rng);

        group.bench_with_input(BenchmarkId::new("rank_index", size), size, |b, _| {
            b.iter(|| RankIndex::build(black_box(&store)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("attribution_cache", size), size, |b, _| {
            b.iter(|| AttributionCache::build(black_box(&store), &model).unwrap());
        });
    }

    group.finish();
}

fn benchmark_find_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_nearest");
    let mut rng = StdRng::seed_from_u64(7);

    for size in [1_000, 10_000, 50_000].iter() {
        let store = Arc::new(generate_store(*size, &mut rng));
        let engine = SimilarityEngine::new(store.clone(), &[]).unwrap();
        let query: Vec<f64> = (0..FEATURES).map(|_| rng.random_range(0.0..100.0)).collect();
        let subset: Vec<usize> = (0..FEATURES).step_by(4).collect();

        group.bench_with_input(BenchmarkId::new("all_features", size), size, |b, _| {
            b.iter(|| engine.find_nearest(black_box(&query), 8, None, &[]).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("feature_subset", size), size, |b, _| {
            b.iter(|| {
                engine
                    .find_nearest(black_box(&query), 8, Some(subset.as_slice()), &[])
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn benchmark_counterfactual(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let store = Arc::new(generate_store(1_000, &mut rng));
    let model = Arc::new(generate_model(&mut rng));
    let evaluator = CounterfactualEvaluator::new(store, model);
    let id = EntityId::from(500);
    let overrides = [(0, 12.0), (5, 80.0), (17, 3.5)];

    c.bench_function("counterfactual", |b| {
        b.iter(|| evaluator.simulate(black_box(&id), &overrides).unwrap());
    });
}

criterion_group!(benches, benchmark_build, benchmark_find_nearest, benchmark_counterfactual);
criterion_main!(benches);
