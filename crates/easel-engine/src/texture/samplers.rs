use thiserror::Error;

use super::TextureId;

/// Every sampler slot is bound to another texture for this frame.
///
/// Recoverable: the offending draw call is dropped, the rest of the frame
/// renders normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all {slots} sampler slots are bound this frame; cannot bind {texture:?}")]
pub struct CapacityError {
    pub texture: TextureId,
    pub slots: usize,
}

/// Bounded table of textures bound for one frame.
///
/// Owned by a `Frame`: created empty when the frame begins and dropped with
/// it, so bindings never leak into the next frame.
#[derive(Debug, Clone)]
pub struct SamplerTable {
    bound: Vec<TextureId>,
    capacity: usize,
}

impl SamplerTable {
    pub fn new(capacity: usize) -> Self {
        Self { bound: Vec::with_capacity(capacity), capacity }
    }

    /// Returns the slot for `texture`, binding it to the next free slot on
    /// first use.
    pub fn resolve(&mut self, texture: TextureId) -> Result<u32, CapacityError> {
        if let Some(slot) = self.slot_of(texture) {
            return Ok(slot);
        }
        if self.bound.len() >= self.capacity {
            return Err(CapacityError { texture, slots: self.capacity });
        }
        self.bound.push(texture);
        Ok((self.bound.len() - 1) as u32)
    }

    pub fn slot_of(&self, texture: TextureId) -> Option<u32> {
        self.bound.iter().position(|&t| t == texture).map(|i| i as u32)
    }

    /// Bound textures, indexed by slot.
    pub fn bound(&self) -> &[TextureId] {
        &self.bound
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
