//! Shader introspection.
//!
//! Buffer layouts are derived from the shader's own declarations instead of a
//! hand-written schema:
//! - `in` declarations become per-vertex / per-instance attributes
//! - `uniform` blocks (and the structs they hold) become std140 layouts
//! - loose `uniform` textures and samplers become bind-group entries
//!
//! Parsing is line oriented and happens once, when a program is loaded.

mod descriptor;
mod error;
mod types;

pub use descriptor::{
    AttributeDesc, BlockMember, FieldLayout, GroupTable, MemberType, ShapeDescriptor, StructLayout,
    UniformBlockDesc, UniformDesc,
};
pub use error::ShaderError;
pub use types::{GlslType, Std140};
