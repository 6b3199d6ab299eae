use criterion::{Criterion, black_box, criterion_group, criterion_main};

use verdant_core::math::Vec3;
use verdant_core::{Color, Light, find_nearby_light};

// ---------------------------------------------------------------------------
// Nearby light search
// ---------------------------------------------------------------------------

fn scattered_lights(count: usize) -> Vec<Light> {
    (0..count)
        .map(|i| {
            let f = i as f32;
            match i % 3 {
                0 => Light::point(Vec3::new(f, 0.0, -f), 8.0, Color::WHITE, 1.0 + f * 0.1),
                1 => Light::spot(
                    Vec3::new(-f, 2.0, f),
                    Vec3::new(0.0, -1.0, 0.0),
                    12.0,
                    0.8,
                    Color::rgb(1.0, 0.8, 0.6),
                    2.0,
                ),
                _ => Light::directional(Vec3::new(0.0, -1.0, 0.0), Color::rgb(0.2, 0.2, 0.3), 0.5),
            }
        })
        .collect()
}

fn bench_nearby_light_small_scene(c: &mut Criterion) {
    let lights = scattered_lights(8);
    c.bench_function("find_nearby_light_8", |b| {
        b.iter(|| find_nearby_light(black_box(&lights), black_box(Vec3::new(1.0, 0.0, 1.0))));
    });
}

fn bench_nearby_light_large_scene(c: &mut Criterion) {
    let lights = scattered_lights(256);
    c.bench_function("find_nearby_light_256", |b| {
        b.iter(|| find_nearby_light(black_box(&lights), black_box(Vec3::new(1.0, 0.0, 1.0))));
    });
}

criterion_group!(
    benches,
    bench_nearby_light_small_scene,
    bench_nearby_light_large_scene
);
criterion_main!(benches);
