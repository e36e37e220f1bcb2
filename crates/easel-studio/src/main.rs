//! Renders a sample canvas offscreen and writes it to a PNG.
//!
//! Usage: `easel-studio [OUTPUT.png] [FONT.ttf]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use glam::{Mat3, Vec2};

use easel_engine::coords::Rect;
use easel_engine::device::{Gpu, GpuInit, OffscreenTarget};
use easel_engine::logging::{LoggingConfig, init_logging};
use easel_engine::paint::Color;
use easel_engine::render::{Canvas, Frame, RenderCtx, RenderTarget, RendererConfig};
use easel_engine::scene::{ClipArea, DrawCall, EllipseCall, FillCall, ImageCall, OutlineCall, TextCall};
use easel_engine::texture::TextureId;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 640;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args_os().skip(1);
    let output = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("easel-frame.png"));
    let font_path = args.next().map(PathBuf::from);

    let gpu = Gpu::new_headless_blocking(GpuInit::default())?;
    let (device, queue) = (gpu.device(), gpu.queue());

    let target = OffscreenTarget::new(device, WIDTH, HEIGHT)?;
    let mut canvas = Canvas::new(device, OffscreenTarget::FORMAT, RendererConfig::default())
        .context("failed to load shape programs")?;

    let swatch = checker_texture(&mut canvas, device, queue)?;
    let font = match &font_path {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
            Some(canvas.fonts_mut().load_font(&bytes).with_context(|| format!("{}", path.display()))?)
        }
        None => {
            log::info!("no font given; skipping text");
            None
        }
    };

    let ctx = RenderCtx::new(device, queue, target.viewport());
    let mut encoder = gpu.encoder();
    target.clear(&mut encoder, Color::from_rgba8(32, 34, 40, 255));

    let mut frame = canvas.begin_frame();

    // Transparency grid behind the document.
    draw(
        &mut frame,
        FillCall::new(Rect::new(80.0, 60.0, 800.0, 520.0), Color::from_rgba8(204, 204, 204, 255))
            .checkerboard(Color::WHITE, 16.0)
            .depth(0.9),
    )?;

    let palette = [
        Color::from_straight(0.90, 0.30, 0.25, 1.0),
        Color::from_straight(0.25, 0.60, 0.90, 0.8),
        Color::from_straight(0.35, 0.80, 0.40, 0.6),
    ];
    let document = ClipArea::rect(Rect::new(80.0, 60.0, 800.0, 520.0));
    for (i, color) in palette.into_iter().enumerate() {
        let x = 140.0 + i as f32 * 220.0;
        draw(&mut frame, FillCall::new(Rect::new(x, 120.0, 180.0, 120.0), color).clip(document))?;
        draw(
            &mut frame,
            EllipseCall::new(Rect::new(x, 280.0, 180.0, 120.0), color)
                .transform(rotate_about(Vec2::new(x + 90.0, 340.0), 0.2 * i as f32))
                .clip(document),
        )?;
        draw(&mut frame, OutlineCall::new(Rect::new(x - 6.0, 114.0, 192.0, 132.0), Color::BLACK, 2.0))?;
    }

    draw(&mut frame, ImageCall::new(Rect::new(140.0, 430.0, 128.0, 128.0), swatch))?;
    draw(
        &mut frame,
        ImageCall::new(Rect::new(300.0, 430.0, 128.0, 128.0), swatch)
            .tint(Color::from_straight(1.0, 0.8, 0.3, 1.0)),
    )?;

    if let Some(font) = font {
        draw(&mut frame, TextCall::new("easel", font, 48.0, Color::BLACK, Vec2::new(480.0, 500.0)).clip(document))?;
    }

    let view = ctx.viewport.view_transform();
    let stats = {
        let mut render_target = RenderTarget::new(&mut encoder, target.view());
        frame.render(&ctx, &mut render_target, view)?
    };
    gpu.submit(encoder);
    log::info!(
        "rendered {} instances in {} submissions ({} groups, {} dropped)",
        stats.instances,
        stats.submissions,
        stats.groups,
        stats.dropped
    );

    let pixels = target.read_rgba8(device, queue)?;
    image::save_buffer(&output, &pixels, WIDTH, HEIGHT, image::ExtendedColorType::Rgba8)
        .with_context(|| format!("failed writing {}", output.display()))?;
    log::info!("wrote {}", output.display());
    Ok(())
}

/// Queues `call`, logging and skipping calls the frame drops.
fn draw(frame: &mut Frame<'_>, call: impl Into<DrawCall>) -> Result<()> {
    match frame.add_shape(call) {
        Err(e) if e.is_recoverable() => {
            log::warn!("skipped draw call: {e}");
            Ok(())
        }
        result => Ok(result?),
    }
}

/// Uploads a small two-tone swatch used by the image calls.
fn checker_texture(canvas: &mut Canvas, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<TextureId> {
    const SIZE: u32 = 32;
    let pixels: Vec<u8> = (0..SIZE * SIZE)
        .flat_map(|i| {
            let (x, y) = (i % SIZE, i / SIZE);
            if (x / 8 + y / 8) % 2 == 0 { [40, 90, 200, 255] } else { [250, 250, 250, 160] }
        })
        .collect();
    let id = canvas.textures_mut().insert_rgba8(device, queue, SIZE, SIZE, &pixels)?;
    Ok(id)
}

fn rotate_about(center: Vec2, angle: f32) -> Mat3 {
    Mat3::from_translation(center) * Mat3::from_angle(angle) * Mat3::from_translation(-center)
}
