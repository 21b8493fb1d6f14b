use criterion::{black_box, criterion_group, criterion_main, Criterion};
use field_kernel::prelude::*;

const WIDTH: u32 = 1024;
const HEIGHT: u32 = 1024;

fn field_benchmark(c: &mut Criterion) {
    let params = SceneParameters::new(WIDTH, HEIGHT)
        .with_freq(43000.0)
        .with_count(8);

    let kernel = FieldKernel::default();
    let dispatch = DispatchSize::covering(FIELD_WORKGROUP, WIDTH, HEIGHT);
    let mut output = vec![0.0; params.cell_count()];
    c.bench_function("constant field 1024x1024 CPU", |b| {
        b.iter(|| kernel.dispatch_cpu(black_box(&params), dispatch, &mut output))
    });

    // Machines without an adapter only get the CPU numbers.
    let Ok(gpu) = GpuCompute::new() else { return };
    let mut pipeline = match gpu.field_pipeline(ConstantField::default(), params.cell_count()) {
        Ok(pipeline) => pipeline,
        Err(_) => return,
    };
    c.bench_function("constant field 1024x1024 GPU", |b| {
        b.iter(|| pipeline.run_blocking(black_box(&params), |cells| cells[0]))
    });
}

criterion_group!(benches, field_benchmark);
criterion_main!(benches);
