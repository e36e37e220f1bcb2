use thiserror::Error;

use crate::shader::ShaderError;
use crate::texture::{CapacityError, TextureError};

/// Misuse of an [`AttributeBuffer`](super::AttributeBuffer).
///
/// These are programmer errors: writing the wrong shape or the wrong number of
/// values would silently corrupt the GPU-side layout, so they fail fast.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute `{name}`: expected {expected}, got {found}")]
    TypeMismatch { name: String, expected: &'static str, found: &'static str },

    #[error("attribute `{name}`: write past capacity of {capacity} instances")]
    Overflow { name: String, capacity: usize },

    #[error("attribute `{name}`: finished after {written} of {expected} instances")]
    Underfill { name: String, written: usize, expected: usize },

    #[error("attribute `{name}`: `{ty}` cannot be a vertex attribute")]
    NotAnAttribute { name: String, ty: &'static str },
}

/// A uniform-block entry that does not match the block's declared stride.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("uniform entry underfilled: {written} of {expected} bytes")]
    Underfill { expected: usize, written: usize },

    #[error("uniform entry of {written} bytes overruns the {expected}-byte stride")]
    Overflow { expected: usize, written: usize },

    #[error("uniform payload already holds {capacity} entries")]
    Full { capacity: usize },
}

/// Any failure surfaced while adding or rendering draw calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

impl RenderError {
    /// Capacity and texture errors drop a single call and leave the frame
    /// usable; everything else points at a shader asset or a bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Capacity(_) | Self::Texture(_))
    }
}
