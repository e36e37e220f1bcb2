use glam::Mat3;
use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};
use crate::scene::{DrawCall, ShapeKind, TextCall};
use crate::shader::ShaderError;
use crate::text::{FontSystem, GlyphAtlas, GlyphInstance};
use crate::texture::{SamplerTable, TextureRegistry};

use super::batch::BatchAccumulator;
use super::canvas::RendererConfig;
use super::common::ViewUniform;
use super::error::RenderError;
use super::group::UniformPayload;
use super::populate::populate;
use super::program::{BindingPlan, BindingSource, ProgramLayout, ShaderProgram, ShaderSources};
use super::template::GeometryTemplate;

/// CPU-side contents of one draw: a full group table and the interleaved
/// instance buffer.
#[derive(Debug, Clone)]
pub struct Submission {
    pub groups: u32,
    pub instance_count: u32,
    pub uniforms: Vec<u8>,
    pub instances: Vec<u8>,
}

/// Counters for one renderer's share of a frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub submissions: u32,
    pub instances: u32,
    pub groups: u32,
}

/// Frame-scoped collaborators a renderer reads while drawing.
pub struct FrameResources<'a> {
    pub textures: &'a TextureRegistry,
    pub samplers: &'a SamplerTable,
    pub fonts: &'a FontSystem,
    pub atlas: &'a mut GlyphAtlas,
}

/// Batches and draws every call of one [`ShapeKind`].
///
/// The pipeline, bind-group layouts and instance layout all come from the
/// kind's shader source. Per frame the renderer drains its accumulator in
/// bounded submissions; each submission gets its own group-table buffer, so
/// submissions recorded into one encoder never overwrite each other's data.
pub struct ShapeRenderer {
    kind: ShapeKind,
    program: ShaderProgram,
    template: GeometryTemplate,
    template_vbo: wgpu::Buffer,
    view_ubo: wgpu::Buffer,
    sampler: Option<wgpu::Sampler>,
    // Bound to image slots no texture claimed this frame.
    placeholder: Option<wgpu::TextureView>,
    accumulator: BatchAccumulator,
}

impl ShapeRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        kind: ShapeKind,
        config: &RendererConfig,
    ) -> Result<Self, ShaderError> {
        let sources = ShaderSources::for_kind(kind);
        let template = GeometryTemplate::for_kind(kind);
        let layout = ProgramLayout::new(kind, &sources, &template, config.group_capacity)?;

        if kind == ShapeKind::Image && config.sampler_slots > layout.image_slots() as usize {
            return Err(ShaderError::invalid(
                sources.name,
                format!("{} sampler slots configured, shader declares {}", config.sampler_slots, layout.image_slots()),
            ));
        }

        let staged = template.stage().map_err(|e| ShaderError::invalid(sources.name, e.to_string()))?;
        let program = ShaderProgram::new(device, format, &sources, layout, &staged)?;
        let template_vbo = staged.upload(device);

        let view_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("easel {} view ubo", kind.name())),
            size: size_of::<ViewUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = program.layout().uses(BindingSource::Sampler).then(|| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(&format!("easel {} sampler", kind.name())),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            })
        });

        // New textures are zero-filled: transparent black.
        let placeholder = (program.layout().image_slots() > 0).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("easel empty image slot"),
                    size: wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8UnormSrgb,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Ok(Self {
            kind,
            program,
            template,
            template_vbo,
            view_ubo,
            sampler,
            placeholder,
            accumulator: BatchAccumulator::new(),
        })
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn layout(&self) -> &ProgramLayout {
        self.program.layout()
    }

    #[inline]
    pub fn accumulator(&self) -> &BatchAccumulator {
        &self.accumulator
    }

    /// Queues `call`. Calls of another kind are a routing bug upstream.
    pub fn add_shape(&mut self, call: DrawCall) {
        debug_assert_eq!(call.kind(), self.kind, "draw call routed to the wrong renderer");
        self.accumulator.add_shape(call);
    }

    pub fn clear(&mut self) {
        self.accumulator.clear();
    }

    /// Drains every pending call into submissions. CPU only.
    ///
    /// `glyphs` lays out text calls, one entry per `char`.
    pub fn prepare(
        &mut self,
        mut glyphs: impl FnMut(&TextCall) -> Vec<GlyphInstance>,
    ) -> Result<Vec<Submission>, RenderError> {
        let layout = self.program.layout();
        let stride = layout.group_stride() as usize;
        let table_len = layout.group_table_size() as usize / stride.max(1);

        let mut out = Vec::new();
        while let Some(mut drain) = self.accumulator.drain_next(layout.group_capacity() as usize) {
            if drain.instance_count == 0 {
                continue;
            }
            drain.sort_back_to_front();
            let mut payload = UniformPayload::new(stride, table_len);
            for key in &drain.keys {
                payload.push(key)?;
            }
            let staged = populate(layout, &drain, &mut glyphs)?;
            out.push(Submission {
                groups: drain.groups() as u32,
                instance_count: drain.instance_count as u32,
                uniforms: payload.into_padded(),
                instances: self.program.instance_bytes(&staged),
            });
        }
        Ok(out)
    }

    /// Draws everything queued since the last call into `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        view: Mat3,
        resources: FrameResources<'_>,
    ) -> Result<RenderStats, RenderError> {
        if self.accumulator.is_empty() {
            return Ok(RenderStats::default());
        }
        let FrameResources { textures, samplers, fonts, atlas } = resources;

        let submissions = self.prepare(|call| atlas.layout(fonts, call))?;
        if submissions.is_empty() {
            return Ok(RenderStats::default());
        }

        let layout = self.program.layout();
        if layout.uses(BindingSource::FontData) || layout.uses(BindingSource::GlyphAtlas) {
            atlas.flush(ctx.device, ctx.queue);
        }
        let atlas: &GlyphAtlas = atlas;
        ctx.queue.write_buffer(&self.view_ubo, 0, bytemuck::bytes_of(&ViewUniform::new(view)));

        let name = self.kind.name();
        let mut stats = RenderStats::default();
        let mut draws = Vec::with_capacity(submissions.len());
        for sub in &submissions {
            let groups_ubo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("easel {name} groups ubo")),
                contents: &sub.uniforms,
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let instance_vbo = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("easel {name} instance vbo")),
                contents: &sub.instances,
                usage: wgpu::BufferUsages::VERTEX,
            });
            let bind_groups = (0..layout.set_count())
                .map(|set| self.bind_group(ctx.device, set, &groups_ubo, textures, samplers, atlas))
                .collect::<Result<Vec<_>, _>>()?;

            stats.submissions += 1;
            stats.instances += sub.instance_count;
            stats.groups += sub.groups;
            draws.push((bind_groups, instance_vbo, sub.instance_count));
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&format!("easel {name} pass")),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_vertex_buffer(0, self.template_vbo.slice(..));
        for (bind_groups, instance_vbo, instances) in &draws {
            for (set, bind_group) in bind_groups.iter().enumerate() {
                rpass.set_bind_group(set as u32, bind_group, &[]);
            }
            rpass.set_vertex_buffer(1, instance_vbo.slice(..));
            rpass.draw(0..self.template.vertex_count(), 0..*instances);
        }

        log::trace!(
            "{name}: {} submissions, {} instances, {} groups",
            stats.submissions,
            stats.instances,
            stats.groups
        );
        Ok(stats)
    }

    fn bind_group(
        &self,
        device: &wgpu::Device,
        set: u32,
        groups_ubo: &wgpu::Buffer,
        textures: &TextureRegistry,
        samplers: &SamplerTable,
        atlas: &GlyphAtlas,
    ) -> Result<wgpu::BindGroup, RenderError> {
        let Some(bgl) = self.program.bind_group_layout(set) else {
            return Err(self.unbound(set, "no layout").into());
        };
        let entries = self
            .program
            .set_bindings(set)
            .map(|plan| {
                self.resource(plan, groups_ubo, textures, samplers, atlas)
                    .map(|resource| wgpu::BindGroupEntry { binding: plan.binding, resource })
                    .ok_or_else(|| self.unbound(set, &format!("{:?} at binding {}", plan.source, plan.binding)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("easel {} bind group {set}", self.kind.name())),
            layout: bgl,
            entries: &entries,
        }))
    }

    fn resource<'r>(
        &'r self,
        plan: &BindingPlan,
        groups_ubo: &'r wgpu::Buffer,
        textures: &'r TextureRegistry,
        samplers: &SamplerTable,
        atlas: &'r GlyphAtlas,
    ) -> Option<wgpu::BindingResource<'r>> {
        Some(match plan.source {
            BindingSource::View => self.view_ubo.as_entire_binding(),
            BindingSource::Groups => groups_ubo.as_entire_binding(),
            BindingSource::FontData => atlas.font_data_buffer()?.as_entire_binding(),
            BindingSource::ImageSlot(slot) => {
                let bound = samplers.bound().get(slot as usize).and_then(|&id| textures.view(id));
                wgpu::BindingResource::TextureView(bound.or(self.placeholder.as_ref())?)
            }
            BindingSource::GlyphAtlas => wgpu::BindingResource::TextureView(atlas.view()?),
            BindingSource::Sampler => wgpu::BindingResource::Sampler(self.sampler.as_ref()?),
        })
    }

    fn unbound(&self, set: u32, what: &str) -> ShaderError {
        ShaderError::invalid(self.kind.name(), format!("set {set}: no resource for {what}"))
    }
}
