use anyhow::{Context, Result, anyhow, ensure};

use crate::coords::Viewport;
use crate::paint::Color;

/// Color texture frames are rendered into when there is no window.
///
/// Renderers load the attachment rather than clearing it, so a frame starts
/// with [`OffscreenTarget::clear`].
pub struct OffscreenTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    /// Four bytes per texel, which is what [`OffscreenTarget::read_rgba8`] copies out.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Result<Self> {
        ensure!(width > 0 && height > 0, "offscreen target has zero size ({width}x{height})");

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("easel offscreen target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self { texture, view, width, height })
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Logical viewport covering the whole target, one pixel per texel.
    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    /// Records a pass that clears the target to `color`.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder, color: Color) {
        let [r, g, b, a] = color.to_array();
        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    /// Copies the target back to the CPU as tightly packed RGBA8 rows.
    ///
    /// Blocks until the GPU has finished every submitted frame.
    pub fn read_rgba8(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        let unpadded = self.width.checked_mul(4).ok_or_else(|| anyhow!("row size overflow"))?;
        let padded = unpadded.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel readback buffer"),
            size: u64::from(padded) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("easel readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d { width: self.width, height: self.height, depth_or_array_layers: 1 },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device
            .poll(wgpu::PollType::Wait { submission_index: None, timeout: None })
            .context("device poll failed during readback")?;
        receiver
            .recv()
            .map_err(|_| anyhow!("readback map callback was dropped"))?
            .context("readback buffer mapping failed")?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            tight_rows(&mapped, unpadded, padded, self.height)?
        };
        readback.unmap();
        Ok(pixels)
    }
}

/// Strips the per-row copy padding.
fn tight_rows(mapped: &[u8], unpadded: u32, padded: u32, height: u32) -> Result<Vec<u8>> {
    let (unpadded, padded) = (unpadded as usize, padded as usize);
    let required = padded * height as usize;
    ensure!(mapped.len() >= required, "mapped frame too small: {} < {required} bytes", mapped.len());

    let mut out = Vec::with_capacity(unpadded * height as usize);
    for row in mapped.chunks_exact(padded).take(height as usize) {
        out.extend_from_slice(&row[..unpadded]);
    }
    Ok(out)
}
