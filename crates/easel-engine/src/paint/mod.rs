//! Paint model shared between draw calls and renderers.
//!
//! Colors are linear, premultiplied RGBA. Color-space conversion is left to the
//! caller.

mod color;

pub use color::Color;
