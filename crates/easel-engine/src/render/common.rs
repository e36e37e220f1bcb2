//! Shared GPU helpers used by every shape program.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat3;

// ── blend ─────────────────────────────────────────────────────────────────

/// Colors are premultiplied end to end.
pub(crate) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── view uniform ──────────────────────────────────────────────────────────

/// `uniform View { mat3 viewTransform; }`
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ViewUniform {
    pub transform: [[f32; 4]; 3],
}

impl ViewUniform {
    pub(crate) fn new(transform: Mat3) -> Self {
        Self { transform: std140_mat3(transform) }
    }
}

/// A `mat3` as std140 stores it: three columns, each padded to a vec4.
pub(crate) fn std140_mat3(m: Mat3) -> [[f32; 4]; 3] {
    let [c0, c1, c2] = m.to_cols_array_2d();
    [
        [c0[0], c0[1], c0[2], 0.0],
        [c1[0], c1[1], c1[2], 0.0],
        [c2[0], c2[1], c2[2], 0.0],
    ]
}

/// `min_binding_size` for a uniform block of `size` bytes. `None` (no check)
/// when the parsed size is zero.
#[inline]
pub(crate) fn uniform_min_binding_size(size: u32) -> Option<NonZeroU64> {
    NonZeroU64::new(u64::from(size))
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    #[test]
    fn mat3_columns_are_padded() {
        let m = Mat3::from_translation(Vec2::new(3.0, 4.0));
        assert_eq!(
            std140_mat3(m),
            [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [3.0, 4.0, 1.0, 0.0]]
        );
        assert_eq!(std::mem::size_of::<ViewUniform>(), 48);
    }
}
