//! Scene rasterizer: skybox background plus lit meshes.

use super::{Id, RenderConfig};
use crate::camera::PerspectiveCamera;
use crate::geometry::{MeshGeometry, Vertex};
use crate::light::LightingUniform;
use crate::math::Mat4;
use crate::scene::{NodeId, Scene};
use crate::texture::{EquirectImage, Texture2D};
use bytemuck::{Pod, Zeroable};
use std::collections::{HashMap, HashSet};
use wgpu::util::DeviceExt;

const COMMON_WGSL: &str = include_str!("../shaders/common.wgsl");
const MESH_WGSL: &str = include_str!("../shaders/mesh.wgsl");
const SKYBOX_WGSL: &str = include_str!("../shaders/skybox.wgsl");

/// Render statistics for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderInfo {
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Number of triangles rendered.
    pub triangles: u32,
    /// Frame number.
    pub frame: u64,
}

/// Per-mesh uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
}

impl ModelUniform {
    fn new(world: &Mat4, color: [f32; 4]) -> Self {
        let normal = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            *world
        };
        Self {
            model: world.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color,
        }
    }
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuGeometry {
    fn new(device: &wgpu::Device, geometry: &MeshGeometry) -> Self {
        let vertices = geometry.vertices();
        Self {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: geometry.indices().len() as u32,
        }
    }
}

struct GpuMesh {
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// A texture uploaded from an equirect image plus the bind group using it.
struct BoundImage {
    source: Id,
    bind_group: wgpu::BindGroup,
    _texture: Texture2D,
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Draws a [`Scene`] from a [`PerspectiveCamera`] into a color target.
pub struct SceneRenderer {
    clear_color: wgpu::Color,
    environment_intensity: f32,
    depth_format: wgpu::TextureFormat,
    depth: DepthTarget,
    size: (u32, u32),

    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,

    frame_layout: wgpu::BindGroupLayout,
    model_layout: wgpu::BindGroupLayout,
    sky_layout: wgpu::BindGroupLayout,
    mesh_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,

    default_frame_bind_group: wgpu::BindGroup,
    environment: Option<BoundImage>,
    background: Option<BoundImage>,

    geometries: HashMap<Id, GpuGeometry>,
    meshes: HashMap<NodeId, GpuMesh>,
    info: RenderInfo,
}

impl SceneRenderer {
    /// Create a renderer drawing into `color_format` targets of the given size.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        config: &RenderConfig,
    ) -> Self {
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1), texture_entry(2), sampler_entry(3)],
        });
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[uniform_entry(0)],
        });
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Skybox Bind Group Layout"),
            entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[PerspectiveCamera::default().to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lighting Uniform Buffer"),
            contents: bytemuck::cast_slice(&[LightingUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Equirect Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let mesh_pipeline = Self::create_mesh_pipeline(device, color_format, depth_format, &frame_layout, &model_layout);
        let sky_pipeline = Self::create_sky_pipeline(device, color_format, depth_format, &sky_layout);

        let black = Texture2D::black(device, queue);
        let default_frame_bind_group = Self::frame_bind_group(
            device,
            &frame_layout,
            &camera_buffer,
            &lighting_buffer,
            black.view(),
            &sampler,
        );

        Self {
            clear_color: config.wgpu_clear_color(),
            environment_intensity: config.environment_intensity.max(0.0),
            depth_format,
            depth: DepthTarget::new(device, depth_format, width, height),
            size: (width.max(1), height.max(1)),
            camera_buffer,
            lighting_buffer,
            sampler,
            frame_layout,
            model_layout,
            sky_layout,
            mesh_pipeline,
            sky_pipeline,
            default_frame_bind_group,
            environment: None,
            background: None,
            geometries: HashMap::new(),
            meshes: HashMap::new(),
            info: RenderInfo::default(),
        }
    }

    fn create_mesh_pipeline(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        frame_layout: &wgpu::BindGroupLayout,
        model_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{COMMON_WGSL}\n{MESH_WGSL}").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[frame_layout, model_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_sky_pipeline(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sky_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Skybox Shader"),
            source: wgpu::ShaderSource::Wgsl(format!("{COMMON_WGSL}\n{SKYBOX_WGSL}").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Skybox Pipeline Layout"),
            bind_group_layouts: &[sky_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Skybox Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            // Drawn first at the far plane; never writes depth.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn frame_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        camera_buffer: &wgpu::Buffer,
        lighting_buffer: &wgpu::Buffer,
        environment: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(environment),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Recreate the depth buffer. Zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.depth = DepthTarget::new(device, self.depth_format, width, height);
    }

    /// Depth buffer size.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Statistics of the last frame.
    #[inline]
    pub fn info(&self) -> &RenderInfo {
        &self.info
    }

    fn sync_images(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        let wanted = scene.environment().map(|image| image.id());
        if self.environment.as_ref().map(|b| b.source) != wanted {
            self.environment = scene.environment().map(|image| {
                let texture = Texture2D::from_equirect(device, queue, image);
                let bind_group = Self::frame_bind_group(
                    device,
                    &self.frame_layout,
                    &self.camera_buffer,
                    &self.lighting_buffer,
                    texture.view(),
                    &self.sampler,
                );
                log::debug!("Uploaded environment image {}", image.id());
                BoundImage {
                    source: image.id(),
                    bind_group,
                    _texture: texture,
                }
            });
        }

        let wanted = scene.background().map(|image| image.id());
        if self.background.as_ref().map(|b| b.source) != wanted {
            self.background = scene.background().map(|image| self.bind_background(device, queue, image));
        }
    }

    fn bind_background(&self, device: &wgpu::Device, queue: &wgpu::Queue, image: &EquirectImage) -> BoundImage {
        let texture = Texture2D::from_equirect(device, queue, image);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Skybox Bind Group"),
            layout: &self.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        log::debug!("Uploaded background image {}", image.id());
        BoundImage {
            source: image.id(),
            bind_group,
            _texture: texture,
        }
    }

    /// Upload meshes that appeared since the last frame, drop those that
    /// left, and refresh per-mesh uniforms. Returns the draw list.
    fn sync_meshes(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) -> Vec<(NodeId, Id)> {
        let mut draws = Vec::new();
        let mut live_geometry = HashSet::new();

        for (node, mesh, world) in scene.meshes() {
            let geometry = &mesh.geometry;
            if geometry.indices().is_empty() {
                continue;
            }
            self.geometries
                .entry(geometry.id())
                .or_insert_with(|| GpuGeometry::new(device, geometry));
            live_geometry.insert(geometry.id());

            let uniform = ModelUniform::new(&world, mesh.color);
            match self.meshes.get(&node) {
                Some(gpu) => queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::cast_slice(&[uniform])),
                None => {
                    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Model Uniform Buffer"),
                        contents: bytemuck::cast_slice(&[uniform]),
                        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    });
                    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                        label: Some("Model Bind Group"),
                        layout: &self.model_layout,
                        entries: &[wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buffer.as_entire_binding(),
                        }],
                    });
                    self.meshes.insert(node, GpuMesh { uniform_buffer, bind_group });
                }
            }
            draws.push((node, geometry.id()));
        }

        let live_nodes: HashSet<NodeId> = draws.iter().map(|(node, _)| *node).collect();
        self.meshes.retain(|node, _| live_nodes.contains(node));
        self.geometries.retain(|id, _| live_geometry.contains(id));
        draws
    }

    /// Draw `scene` into `target`, clearing it first.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) -> RenderInfo {
        self.sync_images(device, queue, scene);
        let draws = self.sync_meshes(device, queue, scene);

        let environment = if self.environment.is_some() {
            self.environment_intensity
        } else {
            0.0
        };
        let lighting = LightingUniform::from_lights(scene.lights()).with_environment(environment);
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera.to_uniform()]));
        queue.write_buffer(&self.lighting_buffer, 0, bytemuck::cast_slice(&[lighting]));

        let mut info = RenderInfo {
            frame: self.info.frame + 1,
            ..Default::default()
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(background) = &self.background {
                pass.set_pipeline(&self.sky_pipeline);
                pass.set_bind_group(0, &background.bind_group, &[]);
                pass.draw(0..3, 0..1);
                info.draw_calls += 1;
            }

            let frame_bind_group = self
                .environment
                .as_ref()
                .map_or(&self.default_frame_bind_group, |env| &env.bind_group);
            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, frame_bind_group, &[]);

            for (node, geometry) in &draws {
                let (Some(gpu_mesh), Some(gpu_geometry)) = (self.meshes.get(node), self.geometries.get(geometry)) else {
                    continue;
                };
                pass.set_bind_group(1, &gpu_mesh.bind_group, &[]);
                pass.set_vertex_buffer(0, gpu_geometry.vertex_buffer.slice(..));
                pass.set_index_buffer(gpu_geometry.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..gpu_geometry.index_count, 0, 0..1);
                info.draw_calls += 1;
                info.triangles += gpu_geometry.index_count / 3;
            }
        }

        self.info = info;
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, Vec3};

    #[test]
    fn test_model_uniform_size() {
        assert_eq!(std::mem::size_of::<ModelUniform>(), 144);
    }

    #[test]
    fn test_normal_matrix_handles_scale() {
        let world = Mat4::from_scale_rotation_translation(Vec3::new(2.0, 1.0, 1.0), Quat::IDENTITY, Vec3::ONE);
        let uniform = ModelUniform::new(&world, [1.0; 4]);
        let normal = Mat4::from_cols_array_2d(&uniform.normal);
        let n = normal.transform_vector3(Vec3::X);
        assert!((n.x - 0.5).abs() < 1e-6);

        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        let uniform = ModelUniform::new(&flat, [1.0; 4]);
        assert!(Mat4::from_cols_array_2d(&uniform.normal).is_finite());
    }
}
