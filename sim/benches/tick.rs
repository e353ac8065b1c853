use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use swarm_sim::{ParticleId, Particles, SimulationConfig, SpatialEntry, SpatialIndex};

fn bench_tick(c: &mut Criterion) {
    let mut sim = Particles::new(SimulationConfig {
        seed: Some(1),
        ..Default::default()
    })
    .expect("default config is valid");
    // Warm up past the initial fill.
    for _ in 0..10 {
        sim.tick();
    }

    c.bench_function("tick_default_region", |b| b.iter(|| sim.tick()));
}

fn bench_nearest(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut index = SpatialIndex::new(5.0);
    index.rebuild((0..2000).map(|i| SpatialEntry {
        id: ParticleId(i),
        x: rng.gen_range(-50.0..50.0),
        y: rng.gen_range(-50.0..50.0),
    }));

    c.bench_function("nearest_within_radius", |b| {
        b.iter(|| {
            index
                .nearest(black_box(3.0), black_box(-7.0))
                .take_while(|e| (e.x - 3.0).powi(2) + (e.y + 7.0).powi(2) <= 25.0)
                .count()
        })
    });
}

criterion_group!(benches, bench_tick, bench_nearest);
criterion_main!(benches);
