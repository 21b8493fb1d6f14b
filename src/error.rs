//! Error types for field evaluation.

use thiserror::Error;

/// Result type for field evaluation.
pub type Result<T> = std::result::Result<T, FieldError>;

/// Errors raised by the host side of a dispatch. The kernel itself cannot fail.
#[derive(Error, Debug)]
pub enum FieldError {
    /// No adapter matched the requested options.
    #[error("no GPU adapter found")]
    NoAdapter,

    /// The adapter refused the device request.
    #[error("request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// A device operation raised a validation error.
    #[error("{context}: {message}")]
    Validation {
        context: &'static str,
        message: String,
    },

    /// The staging buffer could not be mapped.
    #[error("map output buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// The map callback was dropped before reporting.
    #[error("map callback dropped before completion")]
    MapCallbackDropped,

    /// The output slice cannot hold `width * height` cells.
    #[error("output holds {actual} cells but the domain needs {required}")]
    OutputTooSmall { required: usize, actual: usize },

    /// More groups along one axis than the device accepts.
    #[error("dispatch of {groups} groups along {axis} exceeds device limit {limit}")]
    DispatchTooLarge {
        axis: char,
        groups: u32,
        limit: u32,
    },

    /// The output buffer would exceed the device's binding or buffer size.
    #[error("output buffer of {size} bytes exceeds device limit {limit}")]
    BufferTooLarge { size: u64, limit: u64 },

    /// The device cannot run groups of this shape.
    #[error("workgroup shape {shape} unsupported: {reason}")]
    UnsupportedWorkgroup { shape: String, reason: String },
}

impl FieldError {
    pub(crate) fn validation(context: &'static str, err: wgpu::Error) -> Self {
        Self::Validation {
            context,
            message: err.to_string(),
        }
    }
}
