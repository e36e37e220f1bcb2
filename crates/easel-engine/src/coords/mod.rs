//! Coordinate and geometry types shared by draw calls and renderers.
//!
//! Canonical CPU space:
//! - logical pixels
//! - origin top-left
//! - +X right, +Y down
//!
//! Draw-call transforms map shape-local space into this space; the view
//! transform maps it to NDC.

mod rect;
mod viewport;

pub use glam::{Mat3, Vec2};
pub use rect::Rect;
pub use viewport::Viewport;
