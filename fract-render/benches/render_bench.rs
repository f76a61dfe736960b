use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use fract_core::{evaluate, BigComplex, FractalParams, Viewport};
use fract_render::{color_of, render_to_completion, Gradient, PassContext, PixelBuffer, WorkerPool};

fn pass(width: u32, height: u32, params: FractalParams) -> Arc<PassContext> {
    let gradient = Arc::new(Gradient::linear(0xff00_0000, 0xffff_ffff, 256).unwrap());
    let buffer = Arc::new(PixelBuffer::new(width, height).unwrap());
    Arc::new(PassContext::new(0, Viewport::initial(params), gradient, buffer))
}

fn bench_full_frame_render(c: &mut Criterion) {
    let pool = WorkerPool::new(WorkerPool::default_size()).unwrap();
    let pass = pass(320, 240, FractalParams::new(64, 64).unwrap());

    c.bench_function("full_frame_320x240", |b| {
        b.iter(|| render_to_completion(&pass, &pool, 64));
    });
}

fn bench_precision_cost(c: &mut Criterion) {
    let point = BigComplex::with_val(512, -0.743_643_887, 0.131_825_904);

    c.bench_function("evaluate_1000iter_64bit", |b| {
        b.iter(|| evaluate(&point, 1000, 64));
    });
    c.bench_function("evaluate_1000iter_512bit", |b| {
        b.iter(|| evaluate(&point, 1000, 512));
    });
}

fn bench_colour_lookup(c: &mut Criterion) {
    let gradient = Gradient::linear(0xff00_0000, 0xffff_ffff, 1024).unwrap();
    let values: Vec<f64> = (0..4096).map(|i| i as f64 / 4095.0).collect();

    c.bench_function("color_of_4096", |b| {
        b.iter(|| values.iter().map(|&v| color_of(v, &gradient)).fold(0u32, u32::wrapping_add));
    });
}

criterion_group!(
    benches,
    bench_full_frame_render,
    bench_precision_cost,
    bench_colour_lookup
);
criterion_main!(benches);
