use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::coords::{Rect, Viewport};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

/// Host-side gradient parameters in shader units.
///
/// `colors` are, in order: layer 1 start/end, layer 2 start/end. Layer 1 sits
/// at the top of the surface, layer 2 at the bottom.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MeshGradientParams {
    pub colors: [Color; 4],
    pub speed: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub frequency: f32,
    pub amplitude: f32,
}

impl Default for MeshGradientParams {
    fn default() -> Self {
        Self {
            colors: [Color::RED, Color::YELLOW, Color::GREEN, Color::BLUE],
            speed: 2.0,
            brightness: 1.0,
            contrast: 1.0,
            frequency: 5.0,
            amplitude: 30.0,
        }
    }
}

/// Uniform block consumed by `shaders/mesh_gradient.wgsl`.
///
/// Layout mirrors the WGSL struct byte for byte (128 bytes, 16-byte aligned).
/// Colors use `vec4` slots; the alpha lane is written as 1 and ignored.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshGradientUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub speed: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub frequency: f32,
    pub amplitude: f32,
    pub layer1_color1: [f32; 4],
    pub layer1_color2: [f32; 4],
    pub layer2_color1: [f32; 4],
    pub layer2_color2: [f32; 4],
    /// Top-left of the placement rect, physical px.
    pub origin: [f32; 2],
    /// Size of the whole render target, physical px.
    pub target_size: [f32; 2],
    /// Non-zero when the target re-encodes to sRGB on write.
    pub encode_srgb: u32,
    pub _pad: [u32; 3],
}

impl MeshGradientUniforms {
    /// Maps params to uniforms for a full-target draw.
    pub fn new(
        params: &MeshGradientParams,
        target: Viewport,
        time: f32,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        Self::placed(params, target.rect(), target, time, target_format)
    }

    /// Maps params to uniforms for a draw into `rect` inside `target`.
    ///
    /// The shader's resolution is the rect size, so the pattern is framed by
    /// the rect rather than by the window.
    pub fn placed(
        params: &MeshGradientParams,
        rect: Rect,
        target: Viewport,
        time: f32,
        target_format: wgpu::TextureFormat,
    ) -> Self {
        let rect = rect.normalized();
        let [c0, c1, c2, c3] = params.colors.map(color_slot);

        Self {
            resolution: [rect.w.max(1.0), rect.h.max(1.0)],
            time,
            speed: params.speed,
            brightness: params.brightness,
            contrast: params.contrast,
            frequency: params.frequency,
            amplitude: params.amplitude,
            layer1_color1: c0,
            layer1_color2: c1,
            layer2_color1: c2,
            layer2_color2: c3,
            origin: [rect.x, rect.y],
            target_size: [target.width.max(1.0), target.height.max(1.0)],
            encode_srgb: target_format.is_srgb() as u32,
            _pad: [0; 3],
        }
    }
}

fn color_slot(c: Color) -> [f32; 4] {
    let [r, g, b] = c.rgb_array();
    [r, g, b, 1.0]
}

// ── quad ──────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub corner: [f32; 2], // 0..1, top-left origin
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [0.0, 0.0] },
    QuadVertex { corner: [1.0, 0.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [0.0, 1.0] },
];

pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── scissor ───────────────────────────────────────────────────────────────

/// Clips a placement rect to the target and returns scissor arguments
/// `(x, y, w, h)` in whole pixels, or `None` when nothing is visible.
pub(crate) fn rect_to_scissor(rect: Rect, target: Viewport) -> Option<(u32, u32, u32, u32)> {
    if !rect.is_finite() || !target.is_valid() {
        return None;
    }

    let visible = rect.intersect(target.rect())?;

    let x0 = visible.x.floor().max(0.0) as u32;
    let y0 = visible.y.floor().max(0.0) as u32;
    let x1 = ((visible.x + visible.w).ceil() as u32).min(target.width as u32);
    let y1 = ((visible.y + visible.h).ceil() as u32).min(target.height as u32);

    let (w, h) = (x1.saturating_sub(x0), y1.saturating_sub(y0));
    if w == 0 || h == 0 { None } else { Some((x0, y0, w, h)) }
}

// ── renderer ──────────────────────────────────────────────────────────────

/// Full-screen mesh gradient renderer.
///
/// GPU resources are created on first use and the pipeline is rebuilt when
/// the target format changes. Each call records one render pass with a
/// single indexed draw of the static quad.
///
/// The uniform buffer is written through the queue, so a renderer must be
/// drawn at most once per queue submission; use one renderer per view.
#[derive(Default)]
pub struct MeshGradientRenderer {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    uniform_buffer: Option<wgpu::Buffer>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,

    clear: Option<Color>,
}

impl MeshGradientRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the whole target to `color` before drawing.
    ///
    /// Off by default so the gradient can be composited into a frame that
    /// already holds other content.
    pub fn with_clear(mut self, color: Option<Color>) -> Self {
        self.clear = color;
        self
    }

    /// Draws the gradient over the whole target.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        params: &MeshGradientParams,
        time: f32,
    ) {
        self.render_in(ctx, target, params, time, ctx.viewport.rect());
    }

    /// Draws the gradient into `rect` (physical px) of the target.
    ///
    /// Parts of `rect` outside the target are clipped. An empty or
    /// non-finite rect records no GPU work.
    pub fn render_in(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        params: &MeshGradientParams,
        time: f32,
        rect: Rect,
    ) {
        let rect = rect.normalized();
        let Some((sx, sy, sw, sh)) = rect_to_scissor(rect, ctx.viewport) else {
            log::trace!("mesh gradient: nothing visible for {rect:?}");
            return;
        };

        self.ensure_pipeline(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_bindings(ctx);

        let uniforms =
            MeshGradientUniforms::placed(params, rect, ctx.viewport, time, ctx.target_format);
        let Some(ubo) = self.uniform_buffer.as_ref() else { return };
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&uniforms));

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let load = match self.clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("meshgrad gradient pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.set_scissor_rect(sx, sy, sw, sh);
        rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.target_format) && self.pipeline.is_some() {
            return;
        }

        log::debug!("building mesh gradient pipeline for {:?}", ctx.target_format);

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("meshgrad gradient shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/mesh_gradient.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("meshgrad gradient bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<MeshGradientUniforms>() as u64,
                            ),
                        },
                        count: None,
                    }],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("meshgrad gradient pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("meshgrad gradient pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.target_format,
                    // Opaque output; replaces whatever the rect covers.
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
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

        self.pipeline_format = Some(ctx.target_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);

        self.bind_group = None;
        self.uniform_buffer = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() && self.uniform_buffer.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("meshgrad gradient ubo"),
            size: std::mem::size_of::<MeshGradientUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("meshgrad gradient bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.uniform_buffer = Some(uniform_buffer);
        self.bind_group = Some(bind_group);
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("meshgrad quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("meshgrad quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNORM: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
    const SRGB: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    fn field_offset(u: &MeshGradientUniforms, field: &[f32]) -> usize {
        let base = u as *const _ as usize;
        field.as_ptr() as usize - base
    }

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<MeshGradientUniforms>(), 128);
        assert_eq!(std::mem::size_of::<MeshGradientUniforms>() % 16, 0);

        let u = MeshGradientUniforms::new(
            &MeshGradientParams::default(),
            Viewport::new(100.0, 50.0),
            0.0,
            UNORM,
        );
        assert_eq!(field_offset(&u, &u.layer1_color1), 32);
        assert_eq!(field_offset(&u, &u.layer2_color2), 80);
        assert_eq!(field_offset(&u, &u.origin), 96);
        assert_eq!(field_offset(&u, &u.target_size), 104);
    }

    fn parse_shader() -> naga::Module {
        let src = include_str!("shaders/mesh_gradient.wgsl");
        let module = naga::front::wgsl::parse_str(src)
            .unwrap_or_else(|e| panic!("WGSL parse error: {}", e.emit_to_string(src)));

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .unwrap_or_else(|e| panic!("WGSL validation error: {e:?}"));
        module
    }

    #[test]
    fn shader_validates_and_matches_uniform_layout() {
        use std::mem::offset_of;

        let module = parse_shader();
        let (members, span) = module
            .types
            .iter()
            .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
                (Some(name), naga::TypeInner::Struct { members, span }) if name == "Uniforms" => {
                    Some((members.clone(), *span))
                }
                _ => None,
            })
            .expect("shader declares struct Uniforms");

        assert_eq!(span as usize, std::mem::size_of::<MeshGradientUniforms>());

        let layout: Vec<(&str, u32)> = members
            .iter()
            .map(|m| (m.name.as_deref().unwrap_or(""), m.offset))
            .collect();

        type U = MeshGradientUniforms;
        let expected = [
            ("resolution", offset_of!(U, resolution)),
            ("time", offset_of!(U, time)),
            ("speed", offset_of!(U, speed)),
            ("brightness", offset_of!(U, brightness)),
            ("contrast", offset_of!(U, contrast)),
            ("frequency", offset_of!(U, frequency)),
            ("amplitude", offset_of!(U, amplitude)),
            ("layer1_color1", offset_of!(U, layer1_color1)),
            ("layer1_color2", offset_of!(U, layer1_color2)),
            ("layer2_color1", offset_of!(U, layer2_color1)),
            ("layer2_color2", offset_of!(U, layer2_color2)),
            ("origin", offset_of!(U, origin)),
            ("target_size", offset_of!(U, target_size)),
            ("encode_srgb", offset_of!(U, encode_srgb)),
            ("_pad0", offset_of!(U, _pad)),
            ("_pad1", offset_of!(U, _pad) + 4),
            ("_pad2", offset_of!(U, _pad) + 8),
        ];
        let expected: Vec<(&str, u32)> =
            expected.iter().map(|&(n, o)| (n, o as u32)).collect();

        assert_eq!(layout, expected);
    }

    #[test]
    fn shader_exposes_both_entry_points() {
        let module = parse_shader();
        let mut stages: Vec<(&str, naga::ShaderStage)> = module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage))
            .collect();
        stages.sort_by_key(|(name, _)| *name);

        assert_eq!(
            stages,
            [("fs_main", naga::ShaderStage::Fragment), ("vs_main", naga::ShaderStage::Vertex)]
        );
    }

    #[test]
    fn params_map_to_uniforms() {
        let params = MeshGradientParams {
            colors: [
                Color::from_argb_u32(0xFF76_9CDF),
                Color::from_argb_u32(0xFF89_91A2),
                Color::from_argb_u32(0xFFA2_88A6),
                Color::from_argb_u32(0xFFFF_5449),
            ],
            speed: 5.0,
            brightness: 0.7,
            contrast: 1.3,
            frequency: 5.0,
            amplitude: 30.0,
        };

        let u = MeshGradientUniforms::new(&params, Viewport::new(1080.0, 1920.0), 3.25, UNORM);

        assert_eq!(u.resolution, [1080.0, 1920.0]);
        assert_eq!(u.target_size, [1080.0, 1920.0]);
        assert_eq!(u.origin, [0.0, 0.0]);
        assert_eq!(u.time, 3.25);
        assert_eq!(u.speed, 5.0);
        assert_eq!(u.brightness, 0.7);
        assert_eq!(u.contrast, 1.3);
        assert_eq!(u.layer1_color1, [0x76 as f32 / 255.0, 0x9C as f32 / 255.0, 0xDF as f32 / 255.0, 1.0]);
        assert_eq!(u.layer2_color2, [1.0, 0x54 as f32 / 255.0, 0x49 as f32 / 255.0, 1.0]);
        assert_eq!(u.encode_srgb, 0);
    }

    #[test]
    fn srgb_target_requests_linear_output() {
        let u = MeshGradientUniforms::new(
            &MeshGradientParams::default(),
            Viewport::new(10.0, 10.0),
            0.0,
            SRGB,
        );
        assert_eq!(u.encode_srgb, 1);
    }

    #[test]
    fn placed_uses_rect_as_resolution() {
        let u = MeshGradientUniforms::placed(
            &MeshGradientParams::default(),
            Rect::new(20.0, 40.0, 200.0, 100.0),
            Viewport::new(800.0, 600.0),
            1.0,
            UNORM,
        );
        assert_eq!(u.resolution, [200.0, 100.0]);
        assert_eq!(u.origin, [20.0, 40.0]);
        assert_eq!(u.target_size, [800.0, 600.0]);
    }

    #[test]
    fn alpha_lane_is_opaque() {
        let mut params = MeshGradientParams::default();
        params.colors[0] = Color::from_argb_u32(0x0011_2233);
        let u = MeshGradientUniforms::new(&params, Viewport::new(1.0, 1.0), 0.0, UNORM);
        assert_eq!(u.layer1_color1[3], 1.0);
    }

    #[test]
    fn quad_covers_unit_square() {
        assert_eq!(QUAD_INDICES.len(), 6);
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
        let xs: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.corner[0]).collect();
        let ys: Vec<f32> = QUAD_VERTICES.iter().map(|v| v.corner[1]).collect();
        assert!(xs.contains(&0.0) && xs.contains(&1.0));
        assert!(ys.contains(&0.0) && ys.contains(&1.0));
    }

    #[test]
    fn scissor_full_target() {
        let vp = Viewport::new(640.0, 480.0);
        assert_eq!(rect_to_scissor(vp.rect(), vp), Some((0, 0, 640, 480)));
    }

    #[test]
    fn scissor_clips_to_target() {
        let vp = Viewport::new(100.0, 100.0);
        let r = Rect::new(-10.0, 50.5, 50.0, 100.0);
        assert_eq!(rect_to_scissor(r, vp), Some((0, 50, 40, 50)));
    }

    #[test]
    fn scissor_rejects_degenerate() {
        let vp = Viewport::new(100.0, 100.0);
        assert_eq!(rect_to_scissor(Rect::new(0.0, 0.0, 0.0, 10.0), vp), None);
        assert_eq!(rect_to_scissor(Rect::new(200.0, 0.0, 10.0, 10.0), vp), None);
        assert_eq!(rect_to_scissor(Rect::new(f32::NAN, 0.0, 10.0, 10.0), vp), None);
        assert_eq!(rect_to_scissor(vp.rect(), Viewport::new(0.0, 0.0)), None);
    }
}
