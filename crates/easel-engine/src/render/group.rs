//! Batch-group keys: the per-group uniform data of a draw call, serialized in
//! the std140 layout of the shader's group struct.
//!
//! Two calls batch together exactly when their serialized bytes are equal, so
//! the grouping rule and the upload format can never drift apart.

use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::scene::{DrawCall, ShapeKind};

use super::common::std140_mat3;
use super::error::LayoutError;

/// `FillGroup` / `EllipseGroup` in `fill.vert` and `ellipse.vert`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct FillGroup {
    pub clip: [f32; 4],
    pub secondary_color: [f32; 4],
    pub checker_size: f32,
    pub _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct OutlineGroup {
    pub clip: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ImageGroup {
    pub clip: [f32; 4],
    pub sampler_slot: i32,
    pub _pad: [i32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct TextGroup {
    pub clip: [f32; 4],
    pub color: [f32; 4],
    pub transform: [[f32; 4]; 3],
    /// Font size over the atlas raster size.
    pub scale: f32,
    pub _pad: [f32; 3],
}

/// Name of the uniform block holding the group table for `kind`.
pub const fn group_block(kind: ShapeKind) -> &'static str {
    match kind {
        ShapeKind::Fill => "FillGroups",
        ShapeKind::Ellipse => "EllipseGroups",
        ShapeKind::Image => "ImageGroups",
        ShapeKind::Outline => "OutlineGroups",
        ShapeKind::Text => "TextGroups",
    }
}

/// Serialized group data of one draw call. Equality is byte equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Box<[u8]>);

impl GroupKey {
    /// Serializes the group-level fields of `call`.
    pub fn serialize(call: &DrawCall) -> Self {
        let clip = call.clip().bounds();
        let bytes = match call {
            DrawCall::Fill(c) => bytemuck::bytes_of(&FillGroup {
                clip,
                secondary_color: c.secondary.to_array(),
                checker_size: c.checker_size,
                _pad: [0.0; 3],
            })
            .into(),
            DrawCall::Ellipse(c) => bytemuck::bytes_of(&FillGroup {
                clip,
                secondary_color: c.secondary.to_array(),
                checker_size: c.checker_size,
                _pad: [0.0; 3],
            })
            .into(),
            DrawCall::Outline(_) => bytemuck::bytes_of(&OutlineGroup { clip }).into(),
            DrawCall::Image(c) => bytemuck::bytes_of(&ImageGroup {
                clip,
                sampler_slot: c.sampler() as i32,
                _pad: [0; 3],
            })
            .into(),
            DrawCall::Text(c) => bytemuck::bytes_of(&TextGroup {
                clip,
                color: c.color.to_array(),
                transform: std140_mat3(c.transform),
                scale: c.raster_scale(),
                _pad: [0.0; 3],
            })
            .into(),
        };
        Self(bytes)
    }

    /// Size of one group entry for `kind`, i.e. the shader-side array stride.
    pub const fn block_size(kind: ShapeKind) -> usize {
        match kind {
            ShapeKind::Fill | ShapeKind::Ellipse => size_of::<FillGroup>(),
            ShapeKind::Outline => size_of::<OutlineGroup>(),
            ShapeKind::Image => size_of::<ImageGroup>(),
            ShapeKind::Text => size_of::<TextGroup>(),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn read_f32(&self, offset: usize) -> Option<f32> {
        let bytes = self.0.get(offset..offset + 4)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn read_i32(&self, offset: usize) -> Option<i32> {
        let bytes = self.0.get(offset..offset + 4)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn read_vec4(&self, offset: usize) -> Option<[f32; 4]> {
        let bytes = self.0.get(offset..offset + 16)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    /// Clip bounds; every group struct starts with them.
    pub fn clip(&self) -> Option<[f32; 4]> {
        self.read_vec4(offset_of!(OutlineGroup, clip))
    }
}

/// Contents of one group-table uniform buffer: up to `capacity` entries of
/// exactly `stride` bytes each.
#[derive(Debug, Clone)]
pub struct UniformPayload {
    stride: usize,
    capacity: usize,
    bytes: Vec<u8>,
}

impl UniformPayload {
    pub fn new(stride: usize, capacity: usize) -> Self {
        Self { stride, capacity, bytes: Vec::with_capacity(stride * capacity) }
    }

    /// Appends one entry, returning its index in the table.
    pub fn push(&mut self, key: &GroupKey) -> Result<u32, LayoutError> {
        if key.len() < self.stride {
            return Err(LayoutError::Underfill { expected: self.stride, written: key.len() });
        }
        if key.len() > self.stride {
            return Err(LayoutError::Overflow { expected: self.stride, written: key.len() });
        }
        let index = self.len();
        if index == self.capacity {
            return Err(LayoutError::Full { capacity: self.capacity });
        }
        self.bytes.extend_from_slice(key.as_bytes());
        Ok(index as u32)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride.max(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entries followed by zeroes up to the full table size. The shader binds
    /// the whole array, so the buffer must be that large.
    pub fn into_padded(mut self) -> Vec<u8> {
        self.bytes.resize(self.stride * self.capacity, 0);
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat3, Vec2};

    use super::*;
    use crate::coords::Rect;
    use crate::paint::Color;
    use crate::render::program::ShaderSources;
    use crate::scene::{ClipArea, EllipseCall, FillCall, ImageCall, OutlineCall, TextCall};
    use crate::shader::ShapeDescriptor;
    use crate::text::{FontId, RASTER_PX};
    use crate::texture::TextureId;

    fn descriptor(kind: ShapeKind) -> ShapeDescriptor {
        let src = ShaderSources::for_kind(kind);
        ShapeDescriptor::parse_program(src.name, src.vertex, src.fragment).unwrap()
    }

    fn assert_field(desc: &ShapeDescriptor, kind: ShapeKind, field: &str, offset: usize) {
        let table = desc.group_table(group_block(kind)).unwrap();
        let layout = table.element.field(field).unwrap_or_else(|| panic!("{field} missing"));
        assert_eq!(layout.offset as usize, offset, "{}.{field}", kind.name());
    }

    #[test]
    fn host_layouts_match_shader_declarations() {
        for kind in ShapeKind::ALL {
            let desc = descriptor(kind);
            let table = desc.group_table(group_block(kind)).unwrap();
            assert_eq!(table.stride as usize, GroupKey::block_size(kind), "{}", kind.name());
            assert_field(&desc, kind, "clip", 0);
        }

        let fill = descriptor(ShapeKind::Fill);
        assert_field(&fill, ShapeKind::Fill, "secondaryColor", offset_of!(FillGroup, secondary_color));
        assert_field(&fill, ShapeKind::Fill, "checkerSize", offset_of!(FillGroup, checker_size));

        let ellipse = descriptor(ShapeKind::Ellipse);
        assert_field(&ellipse, ShapeKind::Ellipse, "checkerSize", offset_of!(FillGroup, checker_size));

        let image = descriptor(ShapeKind::Image);
        assert_field(&image, ShapeKind::Image, "samplerSlot", offset_of!(ImageGroup, sampler_slot));

        let text = descriptor(ShapeKind::Text);
        assert_field(&text, ShapeKind::Text, "color", offset_of!(TextGroup, color));
        assert_field(&text, ShapeKind::Text, "transform", offset_of!(TextGroup, transform));
        assert_field(&text, ShapeKind::Text, "scale", offset_of!(TextGroup, scale));
    }

    #[test]
    fn fields_read_back_at_shader_offsets() {
        let call: DrawCall = FillCall::new(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK)
            .checkerboard(Color::WHITE, 8.0)
            .clip(Rect::new(1.0, 2.0, 3.0, 4.0))
            .into();
        let key = GroupKey::serialize(&call);
        let desc = descriptor(ShapeKind::Fill);
        let table = desc.group_table("FillGroups").unwrap();
        let offset = |name: &str| table.element.field(name).unwrap().offset as usize;

        assert_eq!(key.read_vec4(offset("clip")), Some([1.0, 2.0, 4.0, 6.0]));
        assert_eq!(key.read_vec4(offset("secondaryColor")), Some(Color::WHITE.to_array()));
        assert_eq!(key.read_f32(offset("checkerSize")), Some(8.0));
    }

    #[test]
    fn equal_group_fields_give_equal_keys() {
        let a: DrawCall = FillCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK).into();
        let b: DrawCall = FillCall::new(Rect::new(50.0, 50.0, 9.0, 9.0), Color::WHITE).depth(0.3).into();
        // Instance fields differ, group fields match.
        assert_eq!(GroupKey::serialize(&a), GroupKey::serialize(&b));

        let c: DrawCall = FillCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK)
            .clip(Rect::new(0.0, 0.0, 5.0, 5.0))
            .into();
        assert_ne!(GroupKey::serialize(&a), GroupKey::serialize(&c));
    }

    #[test]
    fn unbounded_clip_writes_sentinel() {
        let call: DrawCall = OutlineCall::new(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLACK, 1.0).into();
        assert_eq!(GroupKey::serialize(&call).clip(), Some(ClipArea::SENTINEL));
    }

    #[test]
    fn image_key_carries_sampler_slot() {
        let mut call = ImageCall::new(Rect::new(0.0, 0.0, 4.0, 4.0), TextureId(9));
        call.sampler = 3;
        let key = GroupKey::serialize(&call.into());
        assert_eq!(key.read_i32(offset_of!(ImageGroup, sampler_slot)), Some(3));
    }

    #[test]
    fn text_key_leaves_origin_out() {
        let at = |x: f32, y: f32| {
            TextCall::new("hi", FontId(0), RASTER_PX * 2.0, Color::BLACK, Vec2::new(x, y))
                .transform(Mat3::from_scale(Vec2::splat(2.0)))
        };
        let key = GroupKey::serialize(&at(10.0, 20.0).into());
        let t = offset_of!(TextGroup, transform);
        assert_eq!(key.read_vec4(t), Some([2.0, 0.0, 0.0, 0.0]));
        assert_eq!(key.read_vec4(t + 32), Some([0.0, 0.0, 1.0, 0.0]));
        assert_eq!(key.read_f32(offset_of!(TextGroup, scale)), Some(2.0));

        // Labels differing only in position batch together.
        assert_eq!(key, GroupKey::serialize(&at(300.0, 5.0).into()));
    }

    #[test]
    fn key_sizes_match_block_sizes() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let calls: [DrawCall; 5] = [
            FillCall::new(rect, Color::BLACK).into(),
            EllipseCall::new(rect, Color::BLACK).into(),
            ImageCall::new(rect, TextureId(0)).into(),
            OutlineCall::new(rect, Color::BLACK, 2.0).into(),
            TextCall::new("x", FontId(0), 12.0, Color::BLACK, Vec2::ZERO).into(),
        ];
        for call in &calls {
            assert_eq!(GroupKey::serialize(call).len(), GroupKey::block_size(call.kind()));
        }
    }

    #[test]
    fn payload_checks_entry_size() {
        let key = GroupKey(vec![0u8; 16].into());
        let mut payload = UniformPayload::new(48, 4);
        assert_eq!(payload.push(&key), Err(LayoutError::Underfill { expected: 48, written: 16 }));

        let mut payload = UniformPayload::new(8, 4);
        assert_eq!(payload.push(&key), Err(LayoutError::Overflow { expected: 8, written: 16 }));
    }

    #[test]
    fn payload_pads_to_capacity() {
        let key = GroupKey(vec![1u8; 16].into());
        let mut payload = UniformPayload::new(16, 2);
        assert_eq!(payload.push(&key), Ok(0));
        assert_eq!(payload.push(&key), Ok(1));
        assert_eq!(payload.push(&key), Err(LayoutError::Full { capacity: 2 }));

        let mut one = UniformPayload::new(16, 3);
        one.push(&key).unwrap();
        let padded = one.into_padded();
        assert_eq!(padded.len(), 48);
        assert!(padded[16..].iter().all(|&b| b == 0));
    }
}
