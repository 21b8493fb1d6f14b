//! Field functions: the per-cell value computed from a position and the scene.
//!
//! Every field has two renditions that must agree bit for bit: `evaluate` for
//! the CPU dispatcher and `wgsl` for the GPU kernel. The WGSL source defines
//!
//! ```wgsl
//! fn field(pos: vec2<f32>, scene: Scene) -> f32
//! ```
//!
//! and is linked after the kernel in `shaders/field.wgsl`, so it may use the
//! `Scene` struct declared there.

use std::borrow::Cow;

use crate::SceneParameters;

pub trait FieldFunction: Send + Sync {
    fn evaluate(&self, pos: [f32; 2], params: &SceneParameters) -> f32;

    fn wgsl(&self) -> Cow<'static, str>;
}

/// A field with the same value everywhere, independent of position and scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantField(pub f32);

impl Default for ConstantField {
    fn default() -> Self {
        Self(0.5)
    }
}

impl FieldFunction for ConstantField {
    fn evaluate(&self, _pos: [f32; 2], _params: &SceneParameters) -> f32 {
        self.0
    }

    // Emitted as raw bits so NaN, infinities and every mantissa survive.
    fn wgsl(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "fn field(pos: vec2<f32>, scene: Scene) -> f32 {{\n    return bitcast<f32>({:#010x}u);\n}}\n",
            self.0.to_bits()
        ))
    }
}

/// A field given as WGSL source plus its CPU counterpart.
pub struct WgslField<F> {
    source: Cow<'static, str>,
    cpu: F,
}

impl<F> WgslField<F>
where
    F: Fn([f32; 2], &SceneParameters) -> f32 + Send + Sync,
{
    pub fn new(source: impl Into<Cow<'static, str>>, cpu: F) -> Self {
        Self {
            source: source.into(),
            cpu,
        }
    }
}

impl<F> FieldFunction for WgslField<F>
where
    F: Fn([f32; 2], &SceneParameters) -> f32 + Send + Sync,
{
    fn evaluate(&self, pos: [f32; 2], params: &SceneParameters) -> f32 {
        (self.cpu)(pos, params)
    }

    fn wgsl(&self) -> Cow<'static, str> {
        self.source.clone()
    }
}

impl<T: FieldFunction + ?Sized> FieldFunction for &T {
    fn evaluate(&self, pos: [f32; 2], params: &SceneParameters) -> f32 {
        (**self).evaluate(pos, params)
    }

    fn wgsl(&self) -> Cow<'static, str> {
        (**self).wgsl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_field_is_one_half() {
        let params = SceneParameters::new(4, 4).with_time(12.0).with_count(3);
        let field = ConstantField::default();
        assert_eq!(field.evaluate([0.0, 0.0], &params), 0.5);
        assert_eq!(field.evaluate([3.0, 2.0], &params.with_freq(-1.0)), 0.5);
    }

    #[test]
    fn constant_wgsl_carries_exact_bits() {
        let source = ConstantField::default().wgsl();
        assert!(source.contains("fn field(pos: vec2<f32>, scene: Scene) -> f32"));
        assert!(source.contains("bitcast<f32>(0x3f000000u)"));
    }

    #[test]
    fn wgsl_field_uses_its_closure() {
        let field = WgslField::new(
            "fn field(pos: vec2<f32>, scene: Scene) -> f32 { return pos.x; }",
            |pos: [f32; 2], _: &SceneParameters| pos[0],
        );
        assert_eq!(field.evaluate([7.0, 1.0], &SceneParameters::new(8, 8)), 7.0);
        assert!(field.wgsl().contains("return pos.x"));
    }
}
