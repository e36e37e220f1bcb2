//! Shape programs: the bundled GLSL sources, the binding plan derived from
//! their declarations, and the wgpu pipeline built from that plan.

use std::collections::BTreeMap;

use crate::scene::ShapeKind;
use crate::shader::{GlslType, ShaderError, ShapeDescriptor};
use crate::text::FONT_DATA_BYTES;

use super::attribute::{StagedAttribute, StepRate, vertex_attributes};
use super::common::{ViewUniform, premul_alpha_blend, uniform_min_binding_size};
use super::group::{GroupKey, group_block};
use super::populate::supplies;
use super::template::{GeometryTemplate, TEMPLATE_ATTRIBUTE};

pub const VIEW_BLOCK: &str = "View";
pub const FONT_DATA_BLOCK: &str = "FontData";
pub const GLYPH_ATLAS: &str = "glyphAtlas";
const IMAGE_SLOT_PREFIX: &str = "image";

/// Vertex and fragment source of one shape program.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSources<'a> {
    pub name: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

impl ShaderSources<'static> {
    pub const fn for_kind(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Fill => Self {
                name: "fill",
                vertex: include_str!("shaders/fill.vert"),
                fragment: include_str!("shaders/fill.frag"),
            },
            ShapeKind::Ellipse => Self {
                name: "ellipse",
                vertex: include_str!("shaders/ellipse.vert"),
                fragment: include_str!("shaders/ellipse.frag"),
            },
            ShapeKind::Image => Self {
                name: "image",
                vertex: include_str!("shaders/image.vert"),
                fragment: include_str!("shaders/image.frag"),
            },
            ShapeKind::Outline => Self {
                name: "outline",
                vertex: include_str!("shaders/outline.vert"),
                fragment: include_str!("shaders/outline.frag"),
            },
            ShapeKind::Text => Self {
                name: "text",
                vertex: include_str!("shaders/text.vert"),
                fragment: include_str!("shaders/text.frag"),
            },
        }
    }
}

/// What feeds one bind-group entry at draw time.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingSource {
    /// `View` block: canvas → clip transform.
    View,
    /// The kind's group table.
    Groups,
    /// Glyph atlas slot data.
    FontData,
    /// Texture bound to a sampler slot this frame.
    ImageSlot(u32),
    GlyphAtlas,
    Sampler,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BindingPlan {
    pub set: u32,
    pub binding: u32,
    pub source: BindingSource,
    /// Block size for buffer bindings, zero otherwise.
    pub size: u32,
}

impl BindingPlan {
    fn layout_entry(&self) -> wgpu::BindGroupLayoutEntry {
        let (visibility, ty) = match self.source {
            BindingSource::View | BindingSource::Groups | BindingSource::FontData => (
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: uniform_min_binding_size(self.size),
                },
            ),
            BindingSource::ImageSlot(_) | BindingSource::GlyphAtlas => (
                wgpu::ShaderStages::FRAGMENT,
                wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
            ),
            BindingSource::Sampler => (
                wgpu::ShaderStages::FRAGMENT,
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            ),
        };
        wgpu::BindGroupLayoutEntry { binding: self.binding, visibility, ty, count: None }
    }
}

/// One per-instance attribute inside the interleaved instance buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceField {
    pub name: String,
    pub ty: GlslType,
    pub location: u32,
    pub offset: u64,
}

/// Interleaved layout of every per-instance attribute, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceLayout {
    fields: Vec<InstanceField>,
    stride: u64,
}

impl InstanceLayout {
    #[inline]
    pub fn fields(&self) -> &[InstanceField] {
        &self.fields
    }

    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn vertex_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.fields
            .iter()
            .flat_map(|f| vertex_attributes(f.ty, f.location, f.offset))
            .collect()
    }
}

/// Everything the renderer needs to know about a program, derived from its
/// source and checked against the draw-call kind that will feed it.
///
/// Pure CPU data; building it validates the shader without a device.
#[derive(Debug, Clone)]
pub struct ProgramLayout {
    kind: ShapeKind,
    descriptor: ShapeDescriptor,
    template_location: u32,
    template_ty: GlslType,
    instance: InstanceLayout,
    group_stride: u32,
    group_capacity: u32,
    bindings: Vec<BindingPlan>,
}

impl ProgramLayout {
    /// Parses `sources` and resolves every declaration to a data source.
    ///
    /// `capacity_cap` lowers the group capacity below the shader's array
    /// length.
    pub fn new(
        kind: ShapeKind,
        sources: &ShaderSources<'_>,
        template: &GeometryTemplate,
        capacity_cap: Option<u32>,
    ) -> Result<Self, ShaderError> {
        let descriptor = ShapeDescriptor::parse_program(sources.name, sources.vertex, sources.fragment)?;
        let name = sources.name;

        // ── attributes ────────────────────────────────────────────────────
        let Some(corner) = descriptor.attribute(TEMPLATE_ATTRIBUTE) else {
            return Err(ShaderError::invalid(name, format!("missing `{TEMPLATE_ATTRIBUTE}` input")));
        };
        if corner.ty != template.ty() {
            return Err(ShaderError::invalid(
                name,
                format!(
                    "`{TEMPLATE_ATTRIBUTE}` is {} but the {} template supplies {}",
                    corner.ty.keyword(),
                    template.name(),
                    template.ty().keyword()
                ),
            ));
        }
        let (template_location, template_ty) = (corner.location, corner.ty);

        let mut instance = InstanceLayout::default();
        for attr in descriptor.attributes().iter().filter(|a| a.name != TEMPLATE_ATTRIBUTE) {
            if !supplies(kind, &attr.name) {
                return Err(ShaderError::invalid(
                    name,
                    format!("attribute `{}` is not supplied by {} calls", attr.name, kind.name()),
                ));
            }
            instance.fields.push(InstanceField {
                name: attr.name.clone(),
                ty: attr.ty,
                location: attr.location,
                offset: instance.stride,
            });
            instance.stride += u64::from(attr.ty.packed_size());
        }

        // ── group table ───────────────────────────────────────────────────
        let block = group_block(kind);
        let Some(table) = descriptor.group_table(block) else {
            return Err(ShaderError::invalid(name, format!("missing group table block `{block}`")));
        };
        let expected = GroupKey::block_size(kind) as u32;
        if table.stride != expected {
            return Err(ShaderError::invalid(
                name,
                format!("`{}` stride is {} bytes, {} groups serialize to {expected}", table.element.name, table.stride, kind.name()),
            ));
        }
        let group_stride = table.stride;
        let group_capacity = match capacity_cap {
            Some(0) => return Err(ShaderError::invalid(name, "group capacity must be at least 1")),
            Some(cap) => cap.min(table.len),
            None => table.len,
        };

        // ── bindings ──────────────────────────────────────────────────────
        let mut bindings = Vec::new();
        for b in descriptor.uniform_blocks() {
            let (source, size) = match b.name.as_str() {
                VIEW_BLOCK if b.size as usize == size_of::<ViewUniform>() => (BindingSource::View, b.size),
                FONT_DATA_BLOCK if kind == ShapeKind::Text && b.size as usize == FONT_DATA_BYTES => {
                    (BindingSource::FontData, b.size)
                }
                n if n == block => (BindingSource::Groups, group_stride * table.len),
                other => {
                    return Err(ShaderError::invalid(
                        name,
                        format!("uniform block `{other}` ({} bytes) has no data source", b.size),
                    ));
                }
            };
            bindings.push(BindingPlan { set: b.set, binding: b.binding, source, size });
        }
        for u in descriptor.uniforms() {
            let Some(binding) = u.binding else {
                return Err(ShaderError::invalid(name, format!("uniform `{}` has no binding", u.name)));
            };
            let source = match u.ty {
                GlslType::Sampler => BindingSource::Sampler,
                GlslType::Texture2D if kind == ShapeKind::Text && u.name == GLYPH_ATLAS => BindingSource::GlyphAtlas,
                GlslType::Texture2D if kind == ShapeKind::Image => {
                    match u.name.strip_prefix(IMAGE_SLOT_PREFIX).and_then(|n| n.parse().ok()) {
                        Some(slot) => BindingSource::ImageSlot(slot),
                        None => {
                            return Err(ShaderError::invalid(name, format!("texture `{}` is not an image slot", u.name)));
                        }
                    }
                }
                _ => {
                    return Err(ShaderError::invalid(
                        name,
                        format!("uniform `{} {}` has no data source", u.ty.keyword(), u.name),
                    ));
                }
            };
            bindings.push(BindingPlan { set: u.set, binding, source, size: 0 });
        }

        if !bindings.iter().any(|b| b.source == BindingSource::View) {
            return Err(ShaderError::invalid(name, format!("missing `{VIEW_BLOCK}` block")));
        }
        bindings.sort_by_key(|b| (b.set, b.binding));
        if let Some(w) = bindings.windows(2).find(|w| (w[0].set, w[0].binding) == (w[1].set, w[1].binding)) {
            return Err(ShaderError::invalid(
                name,
                format!("set {} binding {} is declared twice", w[0].set, w[0].binding),
            ));
        }

        let layout = Self {
            kind,
            descriptor,
            template_location,
            template_ty,
            instance,
            group_stride,
            group_capacity,
            bindings,
        };
        let slots = layout.image_slots();
        if (0..slots).any(|i| !layout.bindings.iter().any(|b| b.source == BindingSource::ImageSlot(i))) {
            return Err(ShaderError::invalid(name, "image slots must be numbered from 0 without gaps"));
        }
        log::debug!(
            "program `{name}`: {} instance attributes ({} B/instance), {} groups × {} B",
            layout.instance.fields.len(),
            layout.instance.stride,
            group_capacity,
            group_stride
        );
        Ok(layout)
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    #[inline]
    pub fn descriptor(&self) -> &ShapeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn instance(&self) -> &InstanceLayout {
        &self.instance
    }

    /// Bytes per group table entry.
    #[inline]
    pub fn group_stride(&self) -> u32 {
        self.group_stride
    }

    /// Groups one submission may address.
    #[inline]
    pub fn group_capacity(&self) -> u32 {
        self.group_capacity
    }

    /// Size of the group table the shader binds.
    pub fn group_table_size(&self) -> u32 {
        self.bindings
            .iter()
            .find(|b| b.source == BindingSource::Groups)
            .map_or(0, |b| b.size)
    }

    /// Bindings sorted by `(set, binding)`.
    #[inline]
    pub fn bindings(&self) -> &[BindingPlan] {
        &self.bindings
    }

    pub fn uses(&self, source: BindingSource) -> bool {
        self.bindings.iter().any(|b| b.source == source)
    }

    /// `(array_stride, rate)` of the two vertex buffer slots: the geometry
    /// template staged at `template_rate` in slot 0, instances in slot 1.
    pub fn vertex_buffers(&self, template_rate: StepRate) -> [(u64, StepRate); 2] {
        [
            (u64::from(self.template_ty.packed_size()), template_rate),
            (self.instance.stride, StepRate::Instance),
        ]
    }

    /// Number of `imageN` texture slots.
    pub fn image_slots(&self) -> u32 {
        self.bindings.iter().filter(|b| matches!(b.source, BindingSource::ImageSlot(_))).count() as u32
    }

    /// Number of bind groups (highest set + 1).
    pub fn set_count(&self) -> u32 {
        self.bindings.iter().map(|b| b.set + 1).max().unwrap_or(0)
    }

    fn bindings_by_set(&self) -> BTreeMap<u32, Vec<BindingPlan>> {
        let mut sets: BTreeMap<u32, Vec<BindingPlan>> = (0..self.set_count()).map(|s| (s, Vec::new())).collect();
        for b in &self.bindings {
            sets.entry(b.set).or_default().push(*b);
        }
        sets
    }
}

/// A [`ProgramLayout`] compiled into a render pipeline.
pub struct ShaderProgram {
    layout: ProgramLayout,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        sources: &ShaderSources<'_>,
        layout: ProgramLayout,
        template: &StagedAttribute,
    ) -> Result<Self, ShaderError> {
        let name = sources.name;
        let limits = device.limits();
        for b in layout.bindings.iter().filter(|b| b.size > 0) {
            if u64::from(b.size) > u64::from(limits.max_uniform_buffer_binding_size) {
                return Err(ShaderError::invalid(
                    name,
                    format!(
                        "uniform binding {} is {} bytes, device limit is {}",
                        b.binding, b.size, limits.max_uniform_buffer_binding_size
                    ),
                ));
            }
        }
        let instance_attributes = layout.instance.vertex_attributes();
        let template_attributes = vertex_attributes(layout.template_ty, layout.template_location, 0);
        let slots = (instance_attributes.len() + template_attributes.len()) as u32;
        if slots > limits.max_vertex_attributes {
            return Err(ShaderError::invalid(
                name,
                format!("{slots} attribute slots, device limit is {}", limits.max_vertex_attributes),
            ));
        }

        let bind_group_layouts: Vec<wgpu::BindGroupLayout> = layout
            .bindings_by_set()
            .into_iter()
            .map(|(set, plans)| {
                let entries: Vec<_> = plans.iter().map(BindingPlan::layout_entry).collect();
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("easel {name} bgl {set}")),
                    entries: &entries,
                })
            })
            .collect();
        let bgl_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("easel {name} pipeline layout")),
            bind_group_layouts: &bgl_refs,
            immediate_size: 0,
        });

        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("easel {name} vertex shader")),
            source: wgpu::ShaderSource::Glsl {
                shader: sources.vertex.into(),
                stage: wgpu::naga::ShaderStage::Vertex,
                defines: Default::default(),
            },
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("easel {name} fragment shader")),
            source: wgpu::ShaderSource::Glsl {
                shader: sources.fragment.into(),
                stage: wgpu::naga::ShaderStage::Fragment,
                defines: Default::default(),
            },
        });

        let [(template_stride, template_rate), (instance_stride, instance_rate)] =
            layout.vertex_buffers(template.rate());
        let buffers = [
            wgpu::VertexBufferLayout {
                array_stride: template_stride,
                step_mode: template_rate.step_mode(),
                attributes: &template_attributes,
            },
            wgpu::VertexBufferLayout {
                array_stride: instance_stride,
                step_mode: instance_rate.step_mode(),
                attributes: &instance_attributes,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("easel {name} pipeline")),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self { layout, bind_group_layouts, pipeline })
    }

    #[inline]
    pub fn layout(&self) -> &ProgramLayout {
        &self.layout
    }

    #[inline]
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn bind_group_layout(&self, set: u32) -> Option<&wgpu::BindGroupLayout> {
        self.bind_group_layouts.get(set as usize)
    }

    /// Bindings of one set, sorted by binding number.
    pub fn set_bindings(&self, set: u32) -> impl Iterator<Item = &BindingPlan> {
        self.layout.bindings.iter().filter(move |b| b.set == set)
    }

    /// Interleaved instance buffer contents for `staged`, which must be in
    /// instance-layout order.
    pub fn instance_bytes(&self, staged: &[StagedAttribute]) -> Vec<u8> {
        debug_assert!(staged.iter().map(StagedAttribute::name).eq(self.layout.instance.fields.iter().map(|f| f.name.as_str())));
        super::attribute::interleave(staged)
    }
}
