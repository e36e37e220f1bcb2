use glam::Mat3;

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawCall, ShapeKind};
use crate::shader::ShaderError;
use crate::text::{FontSystem, GlyphAtlas};
use crate::texture::{SamplerTable, TextureError, TextureRegistry};

use super::error::RenderError;
use super::shape::{FrameResources, ShapeRenderer};

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    /// Textures one frame may bind for image calls.
    pub sampler_slots: usize,
    /// Lowers the groups per submission below the shader's table length.
    pub group_capacity: Option<u32>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self { sampler_slots: 8, group_capacity: None }
    }
}

/// Totals for one rendered frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub submissions: u32,
    pub instances: u32,
    pub groups: u32,
    /// Calls rejected by [`Frame::add_shape`].
    pub dropped: u32,
}

/// Owns one [`ShapeRenderer`] per shape kind plus the textures and fonts
/// draw calls refer to.
pub struct Canvas {
    // Indexed like `ShapeKind::ALL`.
    renderers: Vec<ShapeRenderer>,
    textures: TextureRegistry,
    fonts: FontSystem,
    atlas: GlyphAtlas,
    config: RendererConfig,
}

impl Canvas {
    /// Loads and validates every shape program. Errors here are shader asset
    /// or configuration problems.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        config: RendererConfig,
    ) -> Result<Self, ShaderError> {
        let renderers = ShapeKind::ALL
            .into_iter()
            .map(|kind| ShapeRenderer::new(device, format, kind, &config))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("canvas ready: {} shape programs, {format:?}", renderers.len());

        Ok(Self {
            renderers,
            textures: TextureRegistry::new(),
            fonts: FontSystem::new(),
            atlas: GlyphAtlas::new(),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    #[inline]
    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        &mut self.textures
    }

    #[inline]
    pub fn fonts(&self) -> &FontSystem {
        &self.fonts
    }

    #[inline]
    pub fn fonts_mut(&mut self) -> &mut FontSystem {
        &mut self.fonts
    }

    #[inline]
    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    pub fn renderer(&self, kind: ShapeKind) -> &ShapeRenderer {
        &self.renderers[kind_index(kind)]
    }

    /// Starts collecting draw calls. The frame holds the canvas until it is
    /// rendered or dropped.
    pub fn begin_frame(&mut self) -> Frame<'_> {
        let samplers = SamplerTable::new(self.config.sampler_slots);
        Frame { canvas: self, samplers, camera: Mat3::IDENTITY, dropped: 0 }
    }
}

fn kind_index(kind: ShapeKind) -> usize {
    match kind {
        ShapeKind::Fill => 0,
        ShapeKind::Ellipse => 1,
        ShapeKind::Image => 2,
        ShapeKind::Outline => 3,
        ShapeKind::Text => 4,
    }
}

/// Draw calls collected for one frame.
///
/// Owns the frame's sampler table, so texture slots never leak from one
/// frame into the next. Dropping a frame without rendering discards its
/// pending calls.
pub struct Frame<'c> {
    canvas: &'c mut Canvas,
    samplers: SamplerTable,
    camera: Mat3,
    dropped: u32,
}

impl Frame<'_> {
    /// Queues `call` with the renderer for its kind.
    ///
    /// Image calls claim a sampler slot here. When every slot is taken by
    /// another texture the call is dropped with a warning and the capacity
    /// error is returned; the frame stays usable.
    pub fn add_shape(&mut self, call: impl Into<DrawCall>) -> Result<(), RenderError> {
        let mut call = call.into();
        if let DrawCall::Image(image) = &mut call {
            if !self.canvas.textures.contains(image.texture) {
                log::warn!("dropping image call: unknown texture {:?}", image.texture);
                self.dropped += 1;
                return Err(TextureError::Unknown(image.texture).into());
            }
            match self.samplers.resolve(image.texture) {
                Ok(slot) => image.sampler = slot,
                Err(e) => {
                    log::warn!("dropping image call: {e}");
                    self.dropped += 1;
                    return Err(e.into());
                }
            }
        }
        if call.instance_count() == 0 {
            return Ok(());
        }
        self.canvas.renderers[kind_index(call.kind())].add_shape(call);
        Ok(())
    }

    /// Canvas-space transform applied before the viewport mapping (pan/zoom).
    pub fn set_camera(&mut self, camera: Mat3) {
        self.camera = camera;
    }

    pub fn pending_instances(&self) -> usize {
        self.canvas.renderers.iter().map(|r| r.accumulator().pending_instances()).sum()
    }

    #[inline]
    pub fn samplers(&self) -> &SamplerTable {
        &self.samplers
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Renders every pending call, kind by kind in `ShapeKind::ALL` order.
    ///
    /// `view` maps canvas pixels to clip space, usually
    /// `ctx.viewport.view_transform()`; the camera is applied on top.
    pub fn render(
        self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        view: Mat3,
    ) -> Result<FrameStats, RenderError> {
        let view = view * self.camera;
        let mut stats = FrameStats { dropped: self.dropped, ..FrameStats::default() };

        let Canvas { renderers, textures, fonts, atlas, .. } = &mut *self.canvas;
        for renderer in renderers.iter_mut() {
            let resources =
                FrameResources { textures: &*textures, samplers: &self.samplers, fonts: &*fonts, atlas: &mut *atlas };
            let s = renderer.render(ctx, target, view, resources)?;
            stats.submissions += s.submissions;
            stats.instances += s.instances;
            stats.groups += s.groups;
        }

        log::debug!(
            "frame: {} submissions, {} instances, {} groups, {} dropped",
            stats.submissions,
            stats.instances,
            stats.groups,
            stats.dropped
        );
        Ok(stats)
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        for renderer in &mut self.canvas.renderers {
            renderer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::device::{Gpu, GpuInit, OffscreenTarget};
    use crate::paint::Color;
    use crate::scene::{FillCall, ImageCall};

    const SIZE: u32 = 100;

    /// Headless device, or `None` on machines without any adapter.
    fn gpu() -> Option<Gpu> {
        match Gpu::new_headless_blocking(GpuInit::default()) {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("no adapter, skipping: {e:#}");
                None
            }
        }
    }

    fn draw(gpu: &Gpu, canvas: &mut Canvas, build: impl FnOnce(&mut Frame<'_>)) -> (FrameStats, Vec<u8>) {
        let target = OffscreenTarget::new(gpu.device(), SIZE, SIZE).unwrap();
        let ctx = RenderCtx::new(gpu.device(), gpu.queue(), target.viewport());
        let mut encoder = gpu.encoder();
        target.clear(&mut encoder, Color::BLACK);

        let mut frame = canvas.begin_frame();
        build(&mut frame);
        let stats = {
            let mut render_target = RenderTarget::new(&mut encoder, target.view());
            frame.render(&ctx, &mut render_target, ctx.viewport.view_transform()).unwrap()
        };
        gpu.submit(encoder);
        (stats, target.read_rgba8(gpu.device(), gpu.queue()).unwrap())
    }

    fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
        let i = ((y * SIZE + x) * 4) as usize;
        [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
    }

    fn canvas(gpu: &Gpu) -> Canvas {
        Canvas::new(gpu.device(), OffscreenTarget::FORMAT, RendererConfig::default()).unwrap()
    }

    #[test]
    fn nearer_fill_in_newer_group_stays_on_top() {
        let Some(gpu) = gpu() else { return };
        let mut canvas = canvas(&gpu);
        let (stats, pixels) = draw(&gpu, &mut canvas, |frame| {
            frame.add_shape(FillCall::new(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE).depth(0.9)).unwrap();
            frame
                .add_shape(
                    FillCall::new(Rect::new(25.0, 25.0, 50.0, 50.0), Color::from_straight(1.0, 0.0, 0.0, 1.0))
                        .depth(0.1)
                        .clip(Rect::new(0.0, 0.0, 100.0, 100.0)),
                )
                .unwrap();
        });

        assert_eq!((stats.submissions, stats.groups), (1, 2));
        assert_eq!(pixel(&pixels, 50, 50), [255, 0, 0, 255]);
        assert_eq!(pixel(&pixels, 5, 5), [255, 255, 255, 255]);
    }

    #[test]
    fn out_of_range_depth_still_draws() {
        let Some(gpu) = gpu() else { return };
        let mut canvas = canvas(&gpu);
        let (_, pixels) = draw(&gpu, &mut canvas, |frame| {
            frame.add_shape(FillCall::new(Rect::new(0.0, 0.0, 100.0, 100.0), Color::WHITE).depth(2.0)).unwrap();
        });
        assert_eq!(pixel(&pixels, 50, 50), [255, 255, 255, 255]);
    }

    #[test]
    fn image_past_sampler_capacity_is_dropped() {
        let Some(gpu) = gpu() else { return };
        let mut canvas = canvas(&gpu);
        let slots = canvas.config().sampler_slots;
        let ids: Vec<_> = (0..=slots)
            .map(|_| canvas.textures_mut().insert_rgba8(gpu.device(), gpu.queue(), 2, 2, &[255; 16]).unwrap())
            .collect();

        let (stats, _) = draw(&gpu, &mut canvas, |frame| {
            for (i, &id) in ids.iter().enumerate() {
                let result = frame.add_shape(ImageCall::new(Rect::new(i as f32 * 10.0, 0.0, 8.0, 8.0), id));
                if i < slots {
                    result.unwrap();
                } else {
                    let err = result.unwrap_err();
                    assert!(matches!(err, RenderError::Capacity(_)));
                    assert!(err.is_recoverable());
                }
            }
            assert_eq!(frame.dropped(), 1);
            assert_eq!(frame.pending_instances(), slots);
        });

        assert_eq!(stats.instances as usize, slots);
        assert_eq!(stats.dropped, 1);
    }

    #[test]
    fn kind_index_follows_render_order() {
        for (i, kind) in ShapeKind::ALL.into_iter().enumerate() {
            assert_eq!(kind_index(kind), i);
        }
    }

    #[test]
    fn default_config_has_eight_slots() {
        let config = RendererConfig::default();
        assert_eq!(config.sampler_slots, 8);
        assert_eq!(config.group_capacity, None);
    }
}
