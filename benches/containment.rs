use criterion::{black_box, criterion_group, criterion_main, Criterion};

use glam::Vec3;

use zonic::engine::{Engine, EngineConfig};
use zonic::group::{GroupConfig, PositionProbe};
use zonic::observer::ObserverConfig;
use zonic::shape::{ShapeKind, Transform};
use zonic::zone::ZoneConfig;

fn scattered_zones(engine: &mut Engine, count: u32, dynamic: bool) -> Vec<zonic::zone::ZoneId> {
    (0..count)
        .map(|i| {
            // Deterministic scatter over a 1km cube
            let x = (i.wrapping_mul(2654435761) % 1000) as f32;
            let y = (i.wrapping_mul(40503) % 1000) as f32;
            let z = (i.wrapping_mul(9973) % 1000) as f32;
            let mut config = ZoneConfig::new(
                Transform::from_origin(Vec3::new(x, y, z)),
                Vec3::splat(12.0),
                ShapeKind::Block,
            );
            config.dynamic = dynamic;
            engine.create_zone(config).unwrap()
        })
        .collect()
}

fn bench_tree_build_10k(c: &mut Criterion) {
    c.bench_function("tree_build_10k", |b| {
        b.iter(|| {
            let mut engine = Engine::new(EngineConfig::default()).unwrap();
            scattered_zones(&mut engine, 10_000, false);
            engine.tick();
            black_box(engine.zone_count())
        });
    });
}

fn bench_zones_at_point(c: &mut Criterion) {
    let mut engine = Engine::new(EngineConfig::default()).unwrap();
    scattered_zones(&mut engine, 10_000, false);
    engine.tick();

    c.bench_function("zones_at_point_10k", |b| {
        b.iter(|| {
            let hits = engine.zones_at_point(black_box(Vec3::new(500.0, 500.0, 500.0)));
            black_box(hits)
        });
    });
}

fn bench_tick_1k_entities(c: &mut Criterion) {
    let mut engine = Engine::new(EngineConfig { frame_budget_ms: 16.0 }).unwrap();
    scattered_zones(&mut engine, 2_000, false);

    let group = engine
        .create_group(GroupConfig { update_rate: 60.0, precision: 0.0 })
        .unwrap();
    let observer = engine.create_observer(ObserverConfig::default());
    engine.subscribe(observer, group).unwrap();

    for handle in 0..1_000u64 {
        let x = (handle % 1000) as f32;
        let probe: PositionProbe = Box::new(move || Vec3::new(x, 500.0, 500.0));
        engine.add_entity(group, handle, probe, None).unwrap();
    }
    engine.tick();

    c.bench_function("tick_1k_entities_2k_zones", |b| {
        b.iter(|| {
            engine.tick();
            black_box(engine.stats().tick_count)
        });
    });
}

fn bench_dynamic_refit(c: &mut Criterion) {
    let mut engine = Engine::new(EngineConfig { frame_budget_ms: 16.0 }).unwrap();
    let zones = scattered_zones(&mut engine, 4_096, true);
    engine.tick();

    let mut offset = 0.0f32;
    c.bench_function("dynamic_refit_2_of_4096", |b| {
        b.iter(|| {
            offset += 0.25;
            engine
                .set_zone_position(zones[17], Vec3::new(offset, 0.0, 0.0))
                .unwrap();
            engine
                .set_zone_position(zones[4000], Vec3::new(0.0, offset, 0.0))
                .unwrap();
            engine.tick();
        });
    });
}

criterion_group!(
    benches,
    bench_tree_build_10k,
    bench_zones_at_point,
    bench_tick_1k_entities,
    bench_dynamic_refit
);
criterion_main!(benches);
