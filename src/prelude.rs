//! Common re-exports for the crate.

#[cfg(feature = "blocking")]
pub use crate::blocking::GpuCompute;

pub use crate::{
    ComputeOptions, ConstantField, DispatchSize, FieldError, FieldFunction, FieldKernel,
    FieldPipeline, GpuComputeAsync, SceneParameters, WgslField, FIELD_WORKGROUP,
};
