use thiserror::Error;

/// Opaque handle to a texture stored in a [`TextureRegistry`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextureError {
    #[error("texture {width}x{height} needs {expected} RGBA8 bytes, got {actual}")]
    SizeMismatch { width: u32, height: u32, expected: usize, actual: usize },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("no texture registered as {0:?}")]
    Unknown(TextureId),
}

struct Entry {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

/// Owns the image textures that image draw calls refer to.
#[derive(Default)]
pub struct TextureRegistry {
    entries: Vec<Entry>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads straight-alpha sRGB RGBA8 pixels and returns their handle.
    pub fn insert_rgba8(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureId, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch { width, height, expected, actual: pixels.len() });
        }

        let id = TextureId(self.entries.len() as u32);
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel image texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("registered texture {id:?} ({width}x{height})");
        self.entries.push(Entry { _texture: texture, view, size: (width, height) });
        Ok(id)
    }

    pub fn contains(&self, id: TextureId) -> bool {
        (id.0 as usize) < self.entries.len()
    }

    pub fn view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.entries.get(id.0 as usize).map(|e| &e.view)
    }

    /// `(width, height)` in texels.
    pub fn size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.entries.get(id.0 as usize).map(|e| e.size)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
