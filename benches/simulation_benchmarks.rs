//! 模拟内核性能基准测试
//!
//! 测试 CPU 参考内核、粒子生成和输入桥接的性能

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::Vec2;
use gpu_particles::platform::SurfaceEvent;
use gpu_particles::simulation::kernel::simulate;
use gpu_particles::simulation::{spawn_particles, InputBridge, SimulationParams};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_reference_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_kernel");
    let params = SimulationParams::new(0.016, 1.0, Vec2::new(0.5, 0.5));

    for count in [16_384u32, 131_072, 750_000] {
        let mut rng = StdRng::seed_from_u64(1);
        let mut particles = spawn_particles(count, 0.85, &mut rng);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| simulate(black_box(&mut particles), black_box(&params)));
        });
    }

    group.finish();
}

fn bench_spawn(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn_particles");

    for count in [16_384u32, 750_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut rng = StdRng::seed_from_u64(2);
            b.iter(|| black_box(spawn_particles(count, 0.85, &mut rng)));
        });
    }

    group.finish();
}

fn bench_bridge(c: &mut Criterion) {
    let mut bridge = InputBridge::new((1100, 800), true);
    let mut x = 0.0f32;

    c.bench_function("bridge_move_and_params", |b| {
        b.iter(|| {
            x = (x + 1.0) % 1100.0;
            bridge.handle(&SurfaceEvent::MouseMove {
                position: Vec2::new(x, 400.0),
            });
            black_box(bridge.simulation_params(0.016, 1100, 800))
        });
    });
}

criterion_group!(benches, bench_reference_kernel, bench_spawn, bench_bridge);
criterion_main!(benches);
