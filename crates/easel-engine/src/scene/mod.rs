//! Draw-call types.
//!
//! Responsibilities:
//! - describe one logical "draw this shape" request per value
//! - keep shape-specific payloads isolated per file under `scene::shapes`
//! - stay renderer-agnostic: GPU layout lives in `render`

mod call;
mod clip;

pub mod shapes;

pub use call::{DrawCall, ShapeKind};
pub use clip::ClipArea;
pub use shapes::{EllipseCall, FillCall, ImageCall, OutlineCall, Placement, TextCall};
