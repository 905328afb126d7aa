//! GPU side of the CRT filter.

use super::crt::CrtParameters;
use super::pass::{FullscreenVertex, Pass, FULLSCREEN_QUAD_VERTICES};
use wgpu::util::DeviceExt;

/// Full-screen pass drawing the offscreen image through the CRT shader.
pub struct CrtPass {
    enabled: bool,
    params: CrtParameters,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
}

impl CrtPass {
    /// Create the pipeline targeting `format`.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, params: &CrtParameters) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("CRT Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CRT Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("CRT Uniform Buffer"),
            contents: bytemuck::cast_slice(&[params.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("CRT Quad Buffer"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline = Self::create_pipeline(device, format, &bind_group_layout);

        Self {
            enabled: true,
            params: *params,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            quad_buffer,
            sampler,
        }
    }

    fn create_pipeline(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("CRT Pipeline Layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("CRT Shader"),
            source: wgpu::ShaderSource::Wgsl(CRT_SHADER.into()),
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("CRT Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[FullscreenVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Parameters uploaded on the next render.
    pub fn parameters(&self) -> &CrtParameters {
        &self.params
    }

    /// Set the shader time in seconds.
    pub fn set_time(&mut self, time: f32) {
        self.params.set_time(time);
    }
}

impl Pass for CrtPass {
    fn name(&self) -> &str {
        "crt"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.params.resize(width, height);
    }

    fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input: &wgpu::TextureView,
        output: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[self.params.uniform()]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CRT Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(input),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("CRT Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

const CRT_SHADER: &str = r#"
struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

struct Crt {
    resolution: vec2<f32>,
    time: f32,
    distortion: f32,
    curvature: f32,
    scanline_density: f32,
    scanline_intensity: f32,
    vignetting: f32,
    chroma_aberration: f32,
    edge_warp: f32,
    _pad: vec2<f32>,
}

@group(0) @binding(0) var scene_texture: texture_2d<f32>;
@group(0) @binding(1) var scene_sampler: sampler;
@group(0) @binding(2) var<uniform> crt: Crt;

const CORNER_RADIUS: f32 = 0.05;

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(in.position, 0.0, 1.0);
    out.uv = in.uv;
    return out;
}

fn sample_scene(uv: vec2<f32>) -> vec3<f32> {
    return textureSampleLevel(scene_texture, scene_sampler, uv, 0.0).rgb;
}

fn rounded_rect_distance(p: vec2<f32>) -> f32 {
    let q = abs(p) - vec2<f32>(0.5 - CORNER_RADIUS);
    return length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0) - CORNER_RADIUS;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let centered = in.uv - 0.5;
    let d = length(centered);
    let warped = 0.5 + centered * (1.0 + crt.edge_warp * d * d);
    if (any(warped < vec2<f32>(0.0)) || any(warped > vec2<f32>(1.0))) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }

    let offset = warped - 0.5;
    let uv = warped + offset * crt.distortion * dot(offset, offset);
    let from_center = uv - 0.5;
    let radius = length(from_center);

    var color = sample_scene(uv);

    let edge = radius * 5.0;
    if (edge > 0.3) {
        let shift = crt.chroma_aberration * edge * edge * 2.0;
        color = vec3<f32>(
            sample_scene(uv + vec2<f32>(shift, 0.0)).r,
            sample_scene(uv + vec2<f32>(shift * 0.5, 0.0)).g,
            sample_scene(uv - vec2<f32>(shift, 0.0)).b,
        );
    }

    let row = 1.0 - uv.y;
    let scan = sin(row * crt.scanline_density + crt.time * 3.0) * crt.scanline_intensity;
    color *= 1.0 - 0.5 * scan;

    color *= max(1.0 - radius * radius * crt.vignetting, 0.0);

    color *= 1.0 - smoothstep(-0.01, 0.01, rounded_rect_distance(from_center));

    color *= 1.0 - 0.4 * smoothstep(0.6, 1.2, radius * 2.0);

    return vec4<f32>(color, 1.0);
}
"#;
