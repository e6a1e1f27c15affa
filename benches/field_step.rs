//! Benchmarks for the per-frame CPU work.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Vec2, Vec3};

use driftfield::config::{FieldConfig, SceneConfig};
use driftfield::displacement::displace;
use driftfield::field::ParticleField;
use driftfield::mesh::icosphere;
use driftfield::{HeadlessBackend, PointerState, SceneComposer, SmoothingMode};

fn bench_field_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_step");

    for count in [40usize, 400, 4000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let config = FieldConfig {
                count,
                seed: Some(1),
                ..FieldConfig::default()
            };
            let mut field = ParticleField::new(&config, SmoothingMode::default());
            let mut elapsed = 0.0f32;
            b.iter(|| {
                elapsed += 1.0 / 60.0;
                field.step(black_box(elapsed), 1.0 / 60.0, black_box(Vec3::new(1.0, -2.0, 0.0)));
            })
        });
    }

    group.finish();
}

fn bench_scene_tick(c: &mut Criterion) {
    let mut config = SceneConfig::default();
    config.field.seed = Some(1);
    config.cloud.seed = Some(2);
    let mut scene = SceneComposer::new(&config).expect("default config is valid");
    let mut backend = HeadlessBackend::new(config.field.count as u32);
    let pointer = PointerState::new(Vec2::new(0.3, -0.1), Vec2::new(1920.0, 1080.0));

    let mut elapsed = 0.0f32;
    c.bench_function("scene_tick", |b| {
        b.iter(|| {
            elapsed += 1.0 / 60.0;
            black_box(scene.tick(elapsed, 1.0 / 60.0, pointer, &mut backend))
        })
    });
}

fn bench_displacement_reference(c: &mut Criterion) {
    let mesh = icosphere(1.5, 15);
    c.bench_function("displace_full_sphere", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for v in &mesh.vertices {
                let out = displace(
                    Vec3::from_array(v.position),
                    Vec3::from_array(v.normal),
                    black_box(1.25),
                    black_box(Vec2::new(0.2, 0.4)),
                );
                sum += out.distortion;
            }
            black_box(sum)
        })
    });
}

criterion_group!(benches, bench_field_step, bench_scene_tick, bench_displacement_reference);
criterion_main!(benches);
