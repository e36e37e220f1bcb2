use crate::scene::ClipArea;
use crate::scene::shapes::{EllipseCall, FillCall, ImageCall, OutlineCall, TextCall, unit_depth};

/// Shape families, one shader program each. Declaration order is draw order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShapeKind {
    Fill,
    Ellipse,
    Image,
    Outline,
    Text,
}

impl ShapeKind {
    /// Every kind, in the order a frame renders them.
    pub const ALL: [ShapeKind; 5] = [Self::Fill, Self::Ellipse, Self::Image, Self::Outline, Self::Text];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Ellipse => "ellipse",
            Self::Image => "image",
            Self::Outline => "outline",
            Self::Text => "text",
        }
    }
}

/// Renderer-agnostic draw request.
///
/// Extending the scene:
/// - add a payload module under `scene::shapes::*`
/// - add a variant here and a `ShapeKind`
/// - the compiler then points at every consumer: group serialization,
///   attribute population and the shader table in `render`
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Fill(FillCall),
    Outline(OutlineCall),
    Ellipse(EllipseCall),
    Image(ImageCall),
    Text(TextCall),
}

impl DrawCall {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Fill(_) => ShapeKind::Fill,
            Self::Outline(_) => ShapeKind::Outline,
            Self::Ellipse(_) => ShapeKind::Ellipse,
            Self::Image(_) => ShapeKind::Image,
            Self::Text(_) => ShapeKind::Text,
        }
    }

    #[inline]
    pub fn clip(&self) -> ClipArea {
        match self {
            Self::Fill(c) => c.clip,
            Self::Outline(c) => c.clip,
            Self::Ellipse(c) => c.clip,
            Self::Image(c) => c.clip,
            Self::Text(c) => c.clip,
        }
    }

    /// Depth the call is drawn at, clamped to `[0, 1]`.
    #[inline]
    pub fn depth(&self) -> f32 {
        unit_depth(match self {
            Self::Fill(c) => c.placement.depth,
            Self::Outline(c) => c.placement.depth,
            Self::Ellipse(c) => c.placement.depth,
            Self::Image(c) => c.placement.depth,
            Self::Text(c) => c.depth,
        })
    }

    /// GPU instances this call expands to: one per glyph for text, one otherwise.
    #[inline]
    pub fn instance_count(&self) -> usize {
        match self {
            Self::Text(t) => t.glyph_count(),
            _ => 1,
        }
    }
}

impl From<FillCall> for DrawCall {
    fn from(call: FillCall) -> Self {
        Self::Fill(call)
    }
}

impl From<OutlineCall> for DrawCall {
    fn from(call: OutlineCall) -> Self {
        Self::Outline(call)
    }
}

impl From<EllipseCall> for DrawCall {
    fn from(call: EllipseCall) -> Self {
        Self::Ellipse(call)
    }
}

impl From<ImageCall> for DrawCall {
    fn from(call: ImageCall) -> Self {
        Self::Image(call)
    }
}

impl From<TextCall> for DrawCall {
    fn from(call: TextCall) -> Self {
        Self::Text(call)
    }
}
