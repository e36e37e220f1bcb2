//! Texture collaborator: GPU textures addressed by handle, plus the per-frame
//! table that maps them onto the image shader's bounded sampler slots.

mod registry;
mod samplers;

pub use registry::{TextureError, TextureId, TextureRegistry};
pub use samplers::{CapacityError, SamplerTable};
