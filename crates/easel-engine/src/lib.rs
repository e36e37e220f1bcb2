//! Easel engine crate.
//!
//! Batches the editor's draw calls per shape kind and packs them into GPU
//! buffers whose layouts are read from the shaders themselves.
//!
//! - [`scene`]: draw-call types (fill, ellipse, outline, image, text)
//! - [`shader`]: GLSL declaration introspection and std140 layouts
//! - [`render`]: batching, buffer packing, programs and the [`render::Canvas`]
//! - [`device`]: headless wgpu device and offscreen targets

pub mod device;
pub mod logging;

pub mod coords;
pub mod paint;
pub mod render;
pub mod scene;
pub mod shader;
pub mod text;
pub mod texture;
