//! Per-cell scalar field evaluation on the GPU.
//!
//! A [`FieldPipeline`] binds a [`SceneParameters`] uniform at binding 0 and a
//! flat `f32` output at binding 1, dispatches `shaders/field.wgsl` over groups
//! of 8×8×4 invocations covering `width × height` cells and reads the output
//! back. Each in-range cell `(x, y)` receives the field value at
//! `output[x + y * width]`; padded invocations write nothing.
//!
//! [`FieldKernel::dispatch_cpu`] runs the same contract on the CPU and is the
//! reference the GPU results are checked against.

use std::{borrow::Cow, mem::size_of};

use tracing::{debug, info, instrument, trace};
use wgpu::{Device, Queue};

#[cfg(feature = "blocking")]
pub mod blocking;
pub mod config;
mod error;
#[cfg(feature = "image")]
pub mod export;
pub mod field;
pub mod kernel;
mod params;
pub mod prelude;
pub mod workgroup;

pub use config::ComputeOptions;
pub use error::{FieldError, Result};
pub use field::{ConstantField, FieldFunction, WgslField};
pub use kernel::{DispatchStats, FieldKernel};
pub use params::SceneParameters;
pub use workgroup::{DispatchSize, WorkgroupShape, FIELD_WORKGROUP};

/// Run a device operation inside a validation error scope.
macro_rules! checked {
    ($ctx:literal, $device:expr, $op:block) => {{
        $device.push_error_scope(wgpu::ErrorFilter::Validation);
        let r = $op;
        match $device.pop_error_scope().await {
            None => r,
            Some(err) => return Err($crate::FieldError::validation($ctx, err)),
        }
    }};
}

const CELL_SIZE: u64 = size_of::<f32>() as u64;
// Uniform bindings are allocated in 16-byte steps.
const UNIFORM_SIZE: u64 = (size_of::<SceneParameters>() as u64).next_multiple_of(16);

pub struct GpuComputeAsync {
    device: Device,
    queue: Queue,
    info: wgpu::AdapterInfo,
}

impl GpuComputeAsync {
    pub async fn new() -> Result<Self> {
        Self::with_options(ComputeOptions::default()).await
    }

    #[instrument(skip_all)]
    pub async fn with_options(options: ComputeOptions) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: options.backends,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: options.power_preference,
                compatible_surface: None,
                force_fallback_adapter: options.force_fallback_adapter,
            })
            .await
            .ok_or(FieldError::NoAdapter)?;

        let info = adapter.get_info();
        info!("adapter {}", info.name);
        info!("  device type {:?}", info.device_type);
        info!("  backend {:?}", info.backend);
        info!("  driver info {:?}", info.driver_info);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: options.label,
                    required_features: wgpu::Features::empty(),
                    required_limits: options.limits,
                },
                None,
            )
            .await?;

        let limits = device.limits();
        info!(
            "  max workgroup size ({}, {}, {}), {} invocations",
            limits.max_compute_workgroup_size_x,
            limits.max_compute_workgroup_size_y,
            limits.max_compute_workgroup_size_z,
            limits.max_compute_invocations_per_workgroup
        );

        Ok(Self {
            device,
            queue,
            info,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.info
    }

    /// Build the kernel pipeline for `field` with room for `capacity` output cells.
    #[instrument(skip(self, field))]
    pub async fn field_pipeline<F: FieldFunction>(
        &self,
        field: F,
        capacity: usize,
    ) -> Result<FieldPipeline<'_, F>> {
        FieldKernel::<F>::SHAPE.validate(&self.device.limits())?;
        let kernel = FieldKernel::new(field);

        let shader = checked!("create field shader", self.device, {
            self.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("field.wgsl"),
                    source: wgpu::ShaderSource::Wgsl(Cow::Owned(kernel.shader_source())),
                })
        });

        let layout = checked!("create bind group layout", self.device, {
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("field:bind:layout"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Storage { read_only: false },
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                })
        });

        let pipeline = checked!("create field pipeline", self.device, {
            let pipeline_layout =
                self.device
                    .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("field:pipe:layout"),
                        bind_group_layouts: &[&layout],
                        push_constant_ranges: &[],
                    });
            self.device
                .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some("field:step:pipe"),
                    layout: Some(&pipeline_layout),
                    module: &shader,
                    entry_point: crate::kernel::ENTRY_POINT,
                })
        });

        let uniform = checked!("create uniform buffer", self.device, {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("field:bind:scene"),
                size: UNIFORM_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let buffers = OutputBuffers::new(self, &layout, &uniform, capacity).await?;
        debug!(capacity, "field pipeline ready");

        Ok(FieldPipeline {
            gpu: self,
            kernel,
            pipeline,
            layout,
            uniform,
            buffers,
        })
    }
}

/// Output storage, its staging copy and the bind group that references them.
struct OutputBuffers {
    capacity: usize,
    output: wgpu::Buffer,
    staging: wgpu::Buffer,
    bindgroup: wgpu::BindGroup,
}

impl OutputBuffers {
    async fn new(
        gpu: &GpuComputeAsync,
        layout: &wgpu::BindGroupLayout,
        uniform: &wgpu::Buffer,
        capacity: usize,
    ) -> Result<Self> {
        // Zero-sized bindings are invalid; an empty domain still gets one cell.
        let size = capacity.max(1) as u64 * CELL_SIZE;
        let limits = gpu.device.limits();
        let limit = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
        if size > limit {
            return Err(FieldError::BufferTooLarge { size, limit });
        }

        let output = checked!("create output buffer", gpu.device, {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("field:bind:output:storage"),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let staging = checked!("create staging buffer", gpu.device, {
            gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("field:extract:stage"),
                size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let bindgroup = checked!("create bind group", gpu.device, {
            gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("field:pipe:bind"),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: output.as_entire_binding(),
                    },
                ],
            })
        });

        Ok(Self {
            capacity,
            output,
            staging,
            bindgroup,
        })
    }
}

pub struct FieldPipeline<'a, F: FieldFunction = ConstantField> {
    gpu: &'a GpuComputeAsync,
    kernel: FieldKernel<F>,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    uniform: wgpu::Buffer,
    buffers: OutputBuffers,
}

impl<'a, F: FieldFunction> FieldPipeline<'a, F> {
    /// Output cells currently allocated.
    pub fn capacity(&self) -> usize {
        self.buffers.capacity
    }

    pub fn kernel(&self) -> &FieldKernel<F> {
        &self.kernel
    }

    pub fn write_uniform(&self, params: &SceneParameters) {
        self.gpu
            .queue
            .write_buffer(&self.uniform, 0, bytemuck::bytes_of(params));
    }

    /// Make room for at least `cells` output cells. Growing reallocates the
    /// output, so previous contents are lost.
    pub async fn reserve(&mut self, cells: usize) -> Result<()> {
        if cells <= self.buffers.capacity {
            return Ok(());
        }
        debug!(from = self.buffers.capacity, to = cells, "grow output buffer");
        self.buffers = OutputBuffers::new(self.gpu, &self.layout, &self.uniform, cells).await?;
        Ok(())
    }

    /// Upload existing content into the output, growing it if needed.
    pub async fn seed_output(&mut self, values: &[f32]) -> Result<()> {
        self.reserve(values.len()).await?;
        if !values.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.buffers.output, 0, bytemuck::cast_slice(values));
        }
        Ok(())
    }

    /// Dispatch the kernel for `params` and hand the whole output, `capacity`
    /// cells long, to `callback`.
    #[instrument(skip_all, fields(width = params.width, height = params.height))]
    pub async fn run<T>(
        &mut self,
        params: &SceneParameters,
        callback: impl FnOnce(&[f32]) -> T,
    ) -> Result<T> {
        let dispatch = DispatchSize::covering(FieldKernel::<F>::SHAPE, params.width, params.height);
        dispatch.validate(&self.gpu.device.limits())?;
        self.reserve(params.cell_count()).await?;
        self.write_uniform(params);

        let device = &self.gpu.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("field:step:encoder"),
        });
        if !dispatch.is_empty() {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("field:step:pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.buffers.bindgroup, &[]);
            pass.insert_debug_marker("field-step");
            pass.dispatch_workgroups(dispatch.x, dispatch.y, dispatch.z);
        }
        encoder.copy_buffer_to_buffer(
            &self.buffers.output,
            0,
            &self.buffers.staging,
            0,
            self.buffers.staging.size(),
        );
        checked!("submit field dispatch", device, {
            self.gpu.queue.submit(Some(encoder.finish()))
        });
        debug!(?dispatch, "field dispatch submitted");

        let slice = self.buffers.staging.slice(..);
        let (sender, receiver) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            trace!(?result, "staging mapped");
            // The receiver only disappears if `run` was dropped mid-flight.
            let _ = sender.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        receiver
            .recv_async()
            .await
            .map_err(|_| FieldError::MapCallbackDropped)??;

        let res = {
            let view = slice.get_mapped_range();
            let cells: &[f32] = bytemuck::cast_slice(&view);
            callback(&cells[..self.buffers.capacity])
        };
        self.buffers.staging.unmap();
        Ok(res)
    }

    /// Dispatch and copy the whole output out.
    pub async fn read_output(&mut self, params: &SceneParameters) -> Result<Vec<f32>> {
        self.run(params, |cells| cells.to_vec()).await
    }
}
