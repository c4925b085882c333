//! Stat and damage pipeline throughput on the sample build.
//!
//! Run with: `cargo bench --bench pipeline`

use std::path::Path;

use buildcalc::damage::{compute_damage, Target};
use buildcalc::data::loader::{load_build, load_catalogs};
use buildcalc::formula::map_variables;
use buildcalc::stats::compute_stats;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn bench_pipeline(c: &mut Criterion) {
    let catalogs = load_catalogs(Path::new("data/catalog")).expect("sample catalogs should load");
    let build = load_build(Path::new("data/builds/sample.yaml")).expect("sample build should load");
    let target = Target::new(120.0, 10.0, 20.0).with_hp(50_000.0);

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(1));

    group.bench_function("stats", |b| {
        b.iter(|| black_box(compute_stats(&build, &catalogs)))
    });

    let stats = compute_stats(&build, &catalogs).expect("sample build should compute");
    group.bench_function("damage_normal_attack", |b| {
        b.iter(|| black_box(compute_damage(&build, &stats, None, &target, &catalogs)))
    });
    group.bench_function("damage_skill", |b| {
        b.iter(|| {
            black_box(compute_damage(
                &build,
                &stats,
                Some("Shield Bash"),
                &target,
                &catalogs,
            ))
        })
    });

    // Compiled once, served from the cache afterwards.
    let variables = map_variables(&stats.final_stats);
    group.bench_function("formula_cached", |b| {
        b.iter(|| {
            black_box(
                catalogs
                    .cache()
                    .evaluate("(Power * 2 + AttackPower) * (1 + Critical / 200)", &variables),
            )
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
