//! Per-vertex geometry shared by every instance of a shape program.

use crate::scene::ShapeKind;
use crate::shader::GlslType;

use super::attribute::{AttributeBuffer, AttributeValue, StagedAttribute, StepRate};
use super::error::AttributeError;

/// Name of the per-vertex input in every shape shader.
pub const TEMPLATE_ATTRIBUTE: &str = "corner";

/// Fixed vertex data drawn once per instance as a triangle strip.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryTemplate {
    name: &'static str,
    ty: GlslType,
    vertices: Vec<AttributeValue>,
}

impl GeometryTemplate {
    /// Unit square corners, `(0,0)` to `(1,1)`.
    pub fn unit_quad() -> Self {
        let vertices = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
            .into_iter()
            .map(AttributeValue::Vec2)
            .collect();
        Self { name: "quad", ty: GlslType::Vec2, vertices }
    }

    /// Rectangular ring around the unit square. `z` is 0 on the outer edge and
    /// 1 on the inner edge, which the vertex shader pushes inward by the
    /// stroke weight.
    pub fn outline_ring() -> Self {
        let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let vertices = corners
            .into_iter()
            .flat_map(|[x, y]| [AttributeValue::Vec3([x, y, 0.0]), AttributeValue::Vec3([x, y, 1.0])])
            .collect();
        Self { name: "outline ring", ty: GlslType::Vec3, vertices }
    }

    pub fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Outline => Self::outline_ring(),
            ShapeKind::Fill | ShapeKind::Ellipse | ShapeKind::Image | ShapeKind::Text => {
                Self::unit_quad()
            }
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared type of the `corner` input this template feeds.
    #[inline]
    pub fn ty(&self) -> GlslType {
        self.ty
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Writes the vertices through the same checked path as instance data.
    pub fn stage(&self) -> Result<StagedAttribute, AttributeError> {
        let mut buf =
            AttributeBuffer::new(TEMPLATE_ATTRIBUTE, self.ty, StepRate::Vertex, self.vertices.len())?;
        for v in &self.vertices {
            buf.put(*v)?;
        }
        buf.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_is_a_four_vertex_strip() {
        let quad = GeometryTemplate::unit_quad();
        assert_eq!(quad.vertex_count(), 4);
        let staged = quad.stage().unwrap();
        let floats: Vec<f32> = staged.bytes().chunks_exact(4).map(bytemuck::pod_read_unaligned).collect();
        assert_eq!(floats, &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(staged.rate(), StepRate::Vertex);
    }

    #[test]
    fn ring_alternates_outer_and_inner() {
        let ring = GeometryTemplate::outline_ring();
        assert_eq!(ring.vertex_count(), 10);
        let staged = ring.stage().unwrap();
        let floats: Vec<f32> = staged.bytes().chunks_exact(4).map(bytemuck::pod_read_unaligned).collect();
        let flags: Vec<f32> = floats.chunks(3).map(|v| v[2]).collect();
        assert_eq!(flags, [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        // Closed: last corner pair repeats the first.
        assert_eq!(floats[..6], floats[24..]);
    }

    #[test]
    fn outline_uses_ring() {
        assert_eq!(GeometryTemplate::for_kind(ShapeKind::Outline).ty(), GlslType::Vec3);
        assert_eq!(GeometryTemplate::for_kind(ShapeKind::Image).ty(), GlslType::Vec2);
    }
}
