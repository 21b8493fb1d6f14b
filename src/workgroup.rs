//! Workgroup shape and dispatch sizing.

use std::fmt;

use crate::{FieldError, Result};

/// Invocations per group along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupShape {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// The shape declared by `@workgroup_size` in the field kernel.
pub const FIELD_WORKGROUP: WorkgroupShape = WorkgroupShape { x: 8, y: 8, z: 4 };

impl WorkgroupShape {
    pub fn invocations(&self) -> u32 {
        self.x * self.y * self.z
    }

    /// Check the shape against the limits the device was created with.
    pub fn validate(&self, limits: &wgpu::Limits) -> Result<()> {
        let checks = [
            ('x', self.x, limits.max_compute_workgroup_size_x),
            ('y', self.y, limits.max_compute_workgroup_size_y),
            ('z', self.z, limits.max_compute_workgroup_size_z),
        ];
        for (axis, size, limit) in checks {
            if size > limit {
                return Err(FieldError::UnsupportedWorkgroup {
                    shape: self.to_string(),
                    reason: format!("{axis} size {size} above limit {limit}"),
                });
            }
        }
        if self.invocations() > limits.max_compute_invocations_per_workgroup {
            return Err(FieldError::UnsupportedWorkgroup {
                shape: self.to_string(),
                reason: format!(
                    "{} invocations above limit {}",
                    self.invocations(),
                    limits.max_compute_invocations_per_workgroup
                ),
            });
        }
        Ok(())
    }
}

impl fmt::Display for WorkgroupShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Number of groups along each axis of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSize {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchSize {
    /// Smallest dispatch of `shape` groups covering `width × height` cells.
    /// One group along z; the index mapping never uses z.
    pub fn covering(shape: WorkgroupShape, width: u32, height: u32) -> Self {
        Self {
            x: width.div_ceil(shape.x),
            y: height.div_ceil(shape.y),
            z: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }

    pub fn groups(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Global invocation extent after padding to whole groups.
    pub fn extent(&self, shape: WorkgroupShape) -> [u32; 3] {
        [self.x * shape.x, self.y * shape.y, self.z * shape.z]
    }

    pub fn covers(&self, shape: WorkgroupShape, width: u32, height: u32) -> bool {
        let [ex, ey, _] = self.extent(shape);
        ex >= width && ey >= height
    }

    pub fn validate(&self, limits: &wgpu::Limits) -> Result<()> {
        let limit = limits.max_compute_workgroups_per_dimension;
        for (axis, groups) in [('x', self.x), ('y', self.y), ('z', self.z)] {
            if groups > limit {
                return Err(FieldError::DispatchTooLarge {
                    axis,
                    groups,
                    limit,
                });
            }
        }
        Ok(())
    }
}
