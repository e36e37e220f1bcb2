//! Headless GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - offscreen color targets and reading frames back to the CPU

mod gpu;
mod offscreen;

pub use gpu::{Gpu, GpuInit};
pub use offscreen::OffscreenTarget;
