pub(crate) mod ellipse;
pub(crate) mod fill;
pub(crate) mod image;
pub(crate) mod outline;
pub(crate) mod text;

use glam::{Mat3, Vec2};

use crate::coords::Rect;

pub use ellipse::EllipseCall;
pub use fill::FillCall;
pub use image::ImageCall;
pub use outline::OutlineCall;
pub use text::TextCall;

/// Where a quad-shaped instance lands: a rectangle in shape-local space, a
/// depth, and a 2D projective transform into canvas space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub size: Vec2,
    /// Clip-space depth in `[0, 1]`; larger is further back.
    pub depth: f32,
    pub transform: Mat3,
}

impl Placement {
    #[inline]
    pub fn new(rect: Rect) -> Self {
        let rect = rect.normalized();
        Self {
            position: rect.origin,
            size: rect.size,
            depth: 0.0,
            transform: Mat3::IDENTITY,
        }
    }
}

/// Depth as written to the GPU: clamped to `[0, 1]`, NaN treated as front.
#[inline]
pub fn unit_depth(depth: f32) -> f32 {
    if depth.is_nan() { 0.0 } else { depth.clamp(0.0, 1.0) }
}

impl From<Rect> for Placement {
    fn from(rect: Rect) -> Self {
        Self::new(rect)
    }
}
