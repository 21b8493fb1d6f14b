//! The per-invocation field kernel and its CPU dispatcher.
//!
//! `FieldKernel` states the contract shared with `shaders/field.wgsl`: an
//! invocation at global id `(x, y, z)` writes `field(x, y)` to
//! `output[x + y * width]` when `x < width`, `y < height` and `z == 0`, and
//! writes nothing otherwise. Slots are disjoint between writers, so invocations
//! need no ordering.

use rayon::prelude::*;
use tracing::debug;

use crate::{
    field::{ConstantField, FieldFunction},
    workgroup::{DispatchSize, WorkgroupShape, FIELD_WORKGROUP},
    FieldError, Result, SceneParameters,
};

const KERNEL_WGSL: &str = include_str!("shaders/field.wgsl");

/// WGSL entry point of the kernel.
pub const ENTRY_POINT: &str = "main";

pub struct FieldKernel<F = ConstantField> {
    field: F,
}

/// Invocation counts of one CPU dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    pub invocations: usize,
    pub writes: usize,
    pub skipped: usize,
}

impl Default for FieldKernel {
    fn default() -> Self {
        Self::new(ConstantField::default())
    }
}

impl<F: FieldFunction> FieldKernel<F> {
    pub const SHAPE: WorkgroupShape = FIELD_WORKGROUP;

    pub fn new(field: F) -> Self {
        Self { field }
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// Kernel source with the field function linked in.
    pub fn shader_source(&self) -> String {
        format!("{}\n{}", KERNEL_WGSL, self.field.wgsl())
    }

    /// Output slot owned by the invocation at `global_id`, if any.
    pub fn target(global_id: [u32; 3], params: &SceneParameters) -> Option<usize> {
        let [x, y, z] = global_id;
        if z != 0 {
            return None;
        }
        params.linear_index(x, y)
    }

    /// The slot and value the invocation at `global_id` would write.
    pub fn evaluate(&self, global_id: [u32; 3], params: &SceneParameters) -> Option<(usize, f32)> {
        let index = Self::target(global_id, params)?;
        let pos = [global_id[0] as f32, global_id[1] as f32];
        Some((index, self.field.evaluate(pos, params)))
    }

    /// Run one invocation against `output`. Returns whether a slot was written.
    pub fn invoke(&self, global_id: [u32; 3], params: &SceneParameters, output: &mut [f32]) -> bool {
        match self.evaluate(global_id, params) {
            Some((index, value)) => match output.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Emulate `dispatch` on the CPU: every group, every local invocation,
    /// padding and z layers included.
    pub fn dispatch_cpu(
        &self,
        params: &SceneParameters,
        dispatch: DispatchSize,
        output: &mut [f32],
    ) -> Result<DispatchStats> {
        let required = params.cell_count();
        if output.len() < required {
            return Err(FieldError::OutputTooSmall {
                required,
                actual: output.len(),
            });
        }

        let shape = Self::SHAPE;
        let invocations = dispatch.groups() * shape.invocations() as usize;
        debug!(
            width = params.width,
            height = params.height,
            ?dispatch,
            invocations,
            "cpu dispatch"
        );

        let writes = (0..dispatch.groups())
            .into_par_iter()
            .flat_map_iter(|group| {
                let group = group_id(dispatch, group);
                local_ids(shape).filter_map(move |local| {
                    let global = [
                        group[0] * shape.x + local[0],
                        group[1] * shape.y + local[1],
                        group[2] * shape.z + local[2],
                    ];
                    self.evaluate(global, params)
                })
            })
            .collect::<Vec<_>>();

        for &(index, value) in &writes {
            output[index] = value;
        }

        Ok(DispatchStats {
            invocations,
            writes: writes.len(),
            skipped: invocations - writes.len(),
        })
    }
}

fn group_id(dispatch: DispatchSize, linear: usize) -> [u32; 3] {
    let per_layer = dispatch.x as usize * dispatch.y as usize;
    [
        (linear % dispatch.x as usize) as u32,
        (linear / dispatch.x as usize % dispatch.y as usize) as u32,
        (linear / per_layer) as u32,
    ]
}

fn local_ids(shape: WorkgroupShape) -> impl Iterator<Item = [u32; 3]> {
    (0..shape.z).flat_map(move |z| {
        (0..shape.y).flat_map(move |y| (0..shape.x).map(move |x| [x, y, z]))
    })
}
