//! Projection benchmarks for the host backends
//!
//! Covers forward and back-projection of a centred disc with
//! `raycast_cpu` and `radon` over increasing image sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::{Arc, Once};
use tomo_raytrafo::backends::{RadonProjector, RaycastCpuProjector};
use tomo_raytrafo::{
    BackendId, BackendRegistry, DiscretizedSpace, Dtype, Element, Operator, Parallel2dGeometry, RayTransform,
};
use tomo_tracing::{TracingConfig, TracingWriter};

static TRACING: Once = Once::new();

/// Subscriber from `TOMO_TRACING_*`, written to stderr next to the criterion report.
fn init_tracing() {
    TRACING.call_once(|| {
        let config = TracingConfig {
            writer: TracingWriter::Stderr,
            ..TracingConfig::from_env()
        };
        if let Err(err) = tomo_tracing::init_global_tracing(&config) {
            eprintln!("tracing disabled: {err}");
        }
    });
}

fn registry() -> Arc<BackendRegistry> {
    Arc::new(
        BackendRegistry::empty()
            .with_stateless(BackendId::RaycastCpu, Arc::new(RaycastCpuProjector::new()))
            .with_stateless(BackendId::Radon, Arc::new(RadonProjector::new())),
    )
}

fn setup(backend: &str, n: usize) -> (RayTransform, Element) {
    init_tracing();
    let half = n as f64 / 2.0;
    let reco = DiscretizedSpace::uniform([-half, -half], [half, half], [n, n], Dtype::Float32).unwrap();
    let geometry = Parallel2dGeometry::uniform(n * 3 / 2, -half * 1.5, half * 1.5, n * 3 / 2).unwrap();
    let op = RayTransform::builder(reco, geometry)
        .backend(backend)
        .registry(registry())
        .build()
        .unwrap();
    let radius2 = (half * 0.6).powi(2);
    let disc = op
        .domain()
        .element_from_fn(|p| if p[0] * p[0] + p[1] * p[1] < radius2 { 1.0 } else { 0.0 })
        .unwrap();
    (op, disc)
}

fn benchmark_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    group.sample_size(20);

    for n in [32, 64, 128] {
        for backend in ["raycast_cpu", "radon"] {
            let (op, disc) = setup(backend, n);
            group.bench_with_input(BenchmarkId::new(backend, n), &n, |b, _| {
                b.iter(|| black_box(op.apply(&disc).unwrap()));
            });
        }
    }

    group.finish();
}

fn benchmark_backward(c: &mut Criterion) {
    let mut group = c.benchmark_group("backward");
    group.sample_size(20);

    for n in [32, 64, 128] {
        for backend in ["raycast_cpu", "radon"] {
            let (op, disc) = setup(backend, n);
            let sinogram = op.apply(&disc).unwrap();
            let adj = op.adjoint();
            group.bench_with_input(BenchmarkId::new(backend, n), &n, |b, _| {
                b.iter(|| black_box(adj.apply(&sinogram).unwrap()));
            });
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_forward, benchmark_backward);
criterion_main!(benches);
