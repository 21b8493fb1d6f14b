use crate::*;

/// Blocking handle over [`GpuComputeAsync`].
pub struct GpuCompute(GpuComputeAsync);

impl GpuCompute {
    pub fn new() -> Result<Self> {
        pollster::block_on(GpuComputeAsync::new()).map(Self)
    }

    pub fn with_options(options: ComputeOptions) -> Result<Self> {
        pollster::block_on(GpuComputeAsync::with_options(options)).map(Self)
    }

    pub fn inner(&self) -> &GpuComputeAsync {
        &self.0
    }

    pub fn field_pipeline<F: FieldFunction>(
        &self,
        field: F,
        capacity: usize,
    ) -> Result<FieldPipeline<'_, F>> {
        pollster::block_on(self.0.field_pipeline(field, capacity))
    }
}

impl<'a, F: FieldFunction> FieldPipeline<'a, F> {
    pub fn run_blocking<T>(
        &mut self,
        params: &SceneParameters,
        callback: impl FnOnce(&[f32]) -> T,
    ) -> Result<T> {
        pollster::block_on(self.run(params, callback))
    }

    pub fn read_output_blocking(&mut self, params: &SceneParameters) -> Result<Vec<f32>> {
        pollster::block_on(self.read_output(params))
    }

    pub fn seed_output_blocking(&mut self, values: &[f32]) -> Result<()> {
        pollster::block_on(self.seed_output(values))
    }
}
