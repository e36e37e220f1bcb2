//! GPU rendering subsystem.
//!
//! Draw calls are grouped per shape kind by their serialized group data,
//! drained in submissions no larger than the shader's group table, and drawn
//! as instanced triangle strips. Every buffer layout is derived from the
//! shader source through [`crate::shader`].
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - The `View` uniform maps canvas pixels to clip space.

mod attribute;
mod batch;
mod canvas;
mod common;
mod ctx;
mod error;
mod group;
mod populate;
mod program;
mod shape;
mod template;

pub use attribute::{
    AttributeBuffer, AttributeValue, StagedAttribute, StepRate, interleave, vertex_attributes, vertex_format,
};
pub use batch::{Batch, BatchAccumulator, Drain, DrainedCall};
pub use canvas::{Canvas, Frame, FrameStats, RendererConfig};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::{AttributeError, LayoutError, RenderError};
pub use group::{GroupKey, UniformPayload, group_block};
pub use populate::{DATA_INDEX, populate};
pub use program::{
    BindingPlan, BindingSource, InstanceField, InstanceLayout, ProgramLayout, ShaderProgram, ShaderSources,
};
pub use shape::{FrameResources, RenderStats, ShapeRenderer, Submission};
pub use template::{GeometryTemplate, TEMPLATE_ATTRIBUTE};
