use criterion::{black_box, criterion_group, criterion_main, Criterion};

use noah_ops::core::data::synthetic_dataset;
use noah_ops::core::{build_snapshot, generate_alerts, occupancy_heatmap};

fn bench_derivations(c: &mut Criterion) {
    let dataset = synthetic_dataset(42, 48);

    c.bench_function("snapshot_hour_36", |b| {
        b.iter(|| build_snapshot(black_box(&dataset), black_box(36), 24))
    });
    c.bench_function("alerts_hour_36", |b| {
        b.iter(|| generate_alerts(black_box(&dataset), black_box(36)))
    });
    c.bench_function("heatmap_full_range", |b| {
        b.iter(|| occupancy_heatmap(black_box(&dataset), 0, 47))
    });
}

criterion_group!(benches, bench_derivations);
criterion_main!(benches);
