//! Typed staging buffers for vertex attributes.
//!
//! One [`AttributeBuffer`] per shader `in` variable. Values are checked
//! against the declared GLSL type as they are written, and the buffer refuses
//! to finish until exactly `instances` values were written.

use glam::{Mat3, Vec2};
use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::shader::GlslType;

use super::error::AttributeError;

/// One value for one vertex or instance.
///
/// Matrices are column-major, matching how GLSL feeds a `matN` input from N
/// consecutive attribute locations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat2([[f32; 2]; 2]),
    Mat3([[f32; 3]; 3]),
    Mat4([[f32; 4]; 4]),
}

impl AttributeValue {
    pub const fn glsl_type(&self) -> GlslType {
        match self {
            Self::Int(_) => GlslType::Int,
            Self::Float(_) => GlslType::Float,
            Self::Vec2(_) => GlslType::Vec2,
            Self::Vec3(_) => GlslType::Vec3,
            Self::Vec4(_) => GlslType::Vec4,
            Self::Mat2(_) => GlslType::Mat2,
            Self::Mat3(_) => GlslType::Mat3,
            Self::Mat4(_) => GlslType::Mat4,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Self::Int(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Vec3(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(v)),
            Self::Mat2(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
            Self::Mat3(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
            Self::Mat4(m) => out.extend_from_slice(bytemuck::cast_slice(m)),
        }
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for AttributeValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec2> for AttributeValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v.to_array())
    }
}

impl From<Color> for AttributeValue {
    fn from(c: Color) -> Self {
        Self::Vec4(c.to_array())
    }
}

impl From<Mat3> for AttributeValue {
    fn from(m: Mat3) -> Self {
        Self::Mat3(m.to_cols_array_2d())
    }
}

/// How often an attribute advances.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StepRate {
    /// Geometry template data, shared by every instance.
    Vertex,
    Instance,
}

impl StepRate {
    pub(crate) fn step_mode(self) -> wgpu::VertexStepMode {
        match self {
            Self::Vertex => wgpu::VertexStepMode::Vertex,
            Self::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

/// Write-once staging area for a single attribute.
#[derive(Debug)]
pub struct AttributeBuffer {
    name: String,
    ty: GlslType,
    rate: StepRate,
    capacity: usize,
    written: usize,
    data: Vec<u8>,
}

impl AttributeBuffer {
    /// Allocates room for `capacity` values of `ty`.
    pub fn new(
        name: impl Into<String>,
        ty: GlslType,
        rate: StepRate,
        capacity: usize,
    ) -> Result<Self, AttributeError> {
        let name = name.into();
        if ty.is_opaque() {
            return Err(AttributeError::NotAnAttribute { name, ty: ty.keyword() });
        }
        Ok(Self {
            name,
            ty,
            rate,
            capacity,
            written: 0,
            data: Vec::with_capacity(capacity * ty.packed_size() as usize),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends the next value. The value's shape must equal the declared type.
    pub fn put(&mut self, value: impl Into<AttributeValue>) -> Result<(), AttributeError> {
        let value = value.into();
        if value.glsl_type() != self.ty {
            return Err(AttributeError::TypeMismatch {
                name: self.name.clone(),
                expected: self.ty.keyword(),
                found: value.glsl_type().keyword(),
            });
        }
        if self.written == self.capacity {
            return Err(AttributeError::Overflow { name: self.name.clone(), capacity: self.capacity });
        }
        value.write_to(&mut self.data);
        self.written += 1;
        Ok(())
    }

    /// Seals the buffer. Consuming `self` makes writes after this point
    /// impossible.
    pub fn finish(self) -> Result<StagedAttribute, AttributeError> {
        if self.written != self.capacity {
            return Err(AttributeError::Underfill {
                name: self.name,
                written: self.written,
                expected: self.capacity,
            });
        }
        Ok(StagedAttribute {
            name: self.name,
            ty: self.ty,
            rate: self.rate,
            count: self.written,
            data: self.data,
        })
    }
}

/// A completely written attribute, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedAttribute {
    name: String,
    ty: GlslType,
    rate: StepRate,
    count: usize,
    data: Vec<u8>,
}

impl StagedAttribute {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> GlslType {
        self.ty
    }

    #[inline]
    pub fn rate(&self) -> StepRate {
        self.rate
    }

    /// Values written: vertices for templates, instances otherwise.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn upload(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&self.name),
            contents: &self.data,
            usage: wgpu::BufferUsages::VERTEX,
        })
    }
}

/// wgpu format of one attribute slot. Matrices map to their column type.
pub fn vertex_format(ty: GlslType) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Some(match ty {
        GlslType::Int => F::Sint32,
        GlslType::Float => F::Float32,
        GlslType::Vec2 | GlslType::Mat2 => F::Float32x2,
        GlslType::Vec3 | GlslType::Mat3 => F::Float32x3,
        GlslType::Vec4 | GlslType::Mat4 => F::Float32x4,
        GlslType::Texture2D | GlslType::Sampler => return None,
    })
}

/// Attribute slots for one variable starting `offset` bytes into a vertex.
///
/// A `matN` expands to N slots starting at `location`, one per column.
pub fn vertex_attributes(ty: GlslType, location: u32, offset: u64) -> Vec<wgpu::VertexAttribute> {
    let Some(format) = vertex_format(ty) else { return Vec::new() };
    let slots = if ty.is_matrix() { ty.components() } else { 1 };
    (0..slots)
        .map(|i| wgpu::VertexAttribute {
            format,
            offset: offset + u64::from(i) * format.size(),
            shader_location: location + i,
        })
        .collect()
}

/// Interleaves staged attributes into one vertex buffer, in slice order.
///
/// All attributes must hold the same number of values.
pub fn interleave(attrs: &[StagedAttribute]) -> Vec<u8> {
    let count = attrs.first().map_or(0, StagedAttribute::count);
    debug_assert!(attrs.iter().all(|a| a.count() == count));

    let sizes: Vec<usize> = attrs.iter().map(|a| a.ty().packed_size() as usize).collect();
    let stride: usize = sizes.iter().sum();
    let mut out = Vec::with_capacity(stride * count);
    for i in 0..count {
        for (attr, &size) in attrs.iter().zip(&sizes) {
            out.extend_from_slice(&attr.bytes()[i * size..(i + 1) * size]);
        }
    }
    out
}
