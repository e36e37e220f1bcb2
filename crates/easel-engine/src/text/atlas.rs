//! Glyph atlas shared by every text call.
//!
//! Glyphs are rasterized once at [`RASTER_PX`] and packed into a single R8
//! texture with a shelf packer. Each glyph gets a slot; the text shader looks
//! up the slot's uv rect and bitmap size in the `FontData` uniform block and
//! scales the quad by `size / RASTER_PX`.

use std::collections::{HashMap, HashSet};

use crate::coords::Vec2;
use crate::scene::TextCall;

use super::font_system::{FontId, FontSystem};

/// Pixel size glyphs are rasterized at.
pub const RASTER_PX: f32 = 32.0;
pub const ATLAS_SIZE: u32 = 1024;
/// Entries in each `FontData` array. Slot 0 is the empty glyph.
pub const GLYPH_SLOTS: usize = 512;
/// Size of the `FontData` block: uv rects followed by metrics.
pub const FONT_DATA_BYTES: usize = GLYPH_SLOTS * 16 * 2;

const GLYPH_PADDING: u32 = 1;

/// Where one character of a text call is drawn, in raster pixels relative to
/// the call's origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphInstance {
    pub position: Vec2,
    pub slot: u32,
}

impl GlyphInstance {
    pub const EMPTY_SLOT: u32 = 0;
    pub const EMPTY: Self = Self { position: Vec2::ZERO, slot: Self::EMPTY_SLOT };
}

struct PendingUpload {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

struct AtlasGpu {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    font_data: wgpu::Buffer,
}

pub struct GlyphAtlas {
    slots: HashMap<(FontId, char), u32>,
    rects: Vec<[f32; 4]>,
    metrics: Vec<[f32; 4]>,
    next_slot: u32,

    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,

    pending: Vec<PendingUpload>,
    data_dirty: bool,
    warned_fonts: HashSet<FontId>,

    gpu: Option<AtlasGpu>,
}

impl Default for GlyphAtlas {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            rects: vec![[0.0; 4]; GLYPH_SLOTS],
            metrics: vec![[0.0; 4]; GLYPH_SLOTS],
            next_slot: 1,
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            pending: Vec::new(),
            data_dirty: true,
            warned_fonts: HashSet::new(),
            gpu: None,
        }
    }
}

impl GlyphAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyph placements for `call`, one per `char`, rasterizing new glyphs on
    /// the way. Unknown fonts, whitespace and glyphs that no longer fit all
    /// map to the empty slot.
    pub fn layout(&mut self, fonts: &FontSystem, call: &TextCall) -> Vec<GlyphInstance> {
        let Some(placed) = fonts.place(call.font, &call.text, RASTER_PX) else {
            if self.warned_fonts.insert(call.font) {
                log::warn!("text: unknown font {:?}; its glyphs are drawn empty", call.font);
            }
            return vec![GlyphInstance::EMPTY; call.glyph_count()];
        };

        placed
            .into_iter()
            .map(|p| {
                let slot = if p.visible { self.slot_for(fonts, call.font, p.ch) } else { GlyphInstance::EMPTY_SLOT };
                GlyphInstance { position: p.position, slot }
            })
            .collect()
    }

    fn slot_for(&mut self, fonts: &FontSystem, font_id: FontId, ch: char) -> u32 {
        if let Some(&slot) = self.slots.get(&(font_id, ch)) {
            return slot;
        }
        let Some(font) = fonts.get(font_id) else { return GlyphInstance::EMPTY_SLOT };
        let (m, bitmap) = font.rasterize(ch, RASTER_PX);
        let slot = if m.width == 0 || m.height == 0 {
            GlyphInstance::EMPTY_SLOT
        } else {
            self.pack(m.width as u32, m.height as u32, bitmap).unwrap_or(GlyphInstance::EMPTY_SLOT)
        };
        self.slots.insert((font_id, ch), slot);
        slot
    }

    /// Places a `width`×`height` coverage bitmap and assigns it a slot.
    /// Returns `None` once the texture or the slot table is exhausted.
    pub(crate) fn pack(&mut self, width: u32, height: u32, pixels: Vec<u8>) -> Option<u32> {
        if self.full {
            return None;
        }
        if self.next_slot as usize >= GLYPH_SLOTS {
            log::warn!("text: all {GLYPH_SLOTS} glyph slots in use; new glyphs are drawn empty");
            self.full = true;
            return None;
        }

        // Advance to a new shelf row when the glyph doesn't fit horizontally.
        if self.cursor_x + width + GLYPH_PADDING > ATLAS_SIZE {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.cursor_y + height + GLYPH_PADDING > ATLAS_SIZE {
            log::warn!("text: glyph atlas is full ({ATLAS_SIZE}×{ATLAS_SIZE}); new glyphs are drawn empty");
            self.full = true;
            return None;
        }

        let (x, y) = (self.cursor_x, self.cursor_y);
        self.cursor_x += width + GLYPH_PADDING;
        self.row_height = self.row_height.max(height);

        let slot = self.next_slot;
        self.next_slot += 1;

        let atlas_f = ATLAS_SIZE as f32;
        self.rects[slot as usize] = [
            x as f32 / atlas_f,
            y as f32 / atlas_f,
            (x + width) as f32 / atlas_f,
            (y + height) as f32 / atlas_f,
        ];
        self.metrics[slot as usize] = [width as f32, height as f32, 0.0, 0.0];
        self.pending.push(PendingUpload { x, y, width, height, pixels });
        self.data_dirty = true;
        Some(slot)
    }

    /// Slots handed out so far, the empty slot included.
    #[inline]
    pub fn slots_used(&self) -> usize {
        self.next_slot as usize
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Contents of the `FontData` uniform block.
    pub fn font_data(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(FONT_DATA_BYTES);
        bytes.extend_from_slice(bytemuck::cast_slice(&self.rects));
        bytes.extend_from_slice(bytemuck::cast_slice(&self.metrics));
        bytes
    }

    /// Creates the GPU side on first use and uploads new glyph bitmaps and
    /// slot data.
    pub fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let data = self.data_dirty.then(|| self.font_data());
        let gpu = self.gpu.get_or_insert_with(|| AtlasGpu::new(device));

        for up in self.pending.drain(..) {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: up.x, y: up.y, z: 0 },
                    aspect: wgpu::TextureAspect::All,
                },
                &up.pixels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(up.width),
                    rows_per_image: Some(up.height),
                },
                wgpu::Extent3d { width: up.width, height: up.height, depth_or_array_layers: 1 },
            );
        }
        if let Some(data) = data {
            queue.write_buffer(&gpu.font_data, 0, &data);
            self.data_dirty = false;
        }
    }

    /// Atlas texture view, once [`flush`](Self::flush) has run.
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.gpu.as_ref().map(|g| &g.view)
    }

    /// `FontData` uniform buffer, once [`flush`](Self::flush) has run.
    pub fn font_data_buffer(&self) -> Option<&wgpu::Buffer> {
        self.gpu.as_ref().map(|g| &g.font_data)
    }
}

impl AtlasGpu {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel glyph atlas"),
            size: wgpu::Extent3d { width: ATLAS_SIZE, height: ATLAS_SIZE, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let font_data = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel font data ubo"),
            size: FONT_DATA_BYTES as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { texture, view, font_data }
    }
}
