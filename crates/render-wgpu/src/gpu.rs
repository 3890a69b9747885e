use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use stagecraft_assets::{AssetStore, Material, Texture};
use stagecraft_common::{Color, GeometryId, MaterialId, TextureId};
use stagecraft_render::{
    DrawBatch, LightRig, MAX_POINT_LIGHTS, RenderView, Renderer, collect_batches, collect_lights,
};
use stagecraft_scene::{Background, Camera, Scene};
use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::mesh::{GpuMesh, InstanceData, Vertex, pack_instances};
use crate::{RenderError, shaders};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightUniform {
    position: [f32; 4],
    radiance: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    ambient: [f32; 4],
    counts: [u32; 4],
    lights: [LightUniform; MAX_POINT_LIGHTS],
}

impl FrameUniforms {
    fn new(view: &RenderView, lights: &LightRig) -> Self {
        let mut uniforms = Self {
            view_proj: view.view_proj.to_cols_array_2d(),
            eye: view.eye.extend(1.0).to_array(),
            ambient: lights.ambient.to_array(),
            counts: [lights.points.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            lights: [LightUniform::zeroed(); MAX_POINT_LIGHTS],
        };
        for (slot, light) in uniforms.lights.iter_mut().zip(&lights.points) {
            *slot = LightUniform {
                position: light.position.extend(1.0).to_array(),
                radiance: light.radiance.to_array(),
            };
        }
        uniforms
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MaterialUniforms {
    color: [f32; 4],
    flags: [f32; 4],
}

impl MaterialUniforms {
    fn new(material: &Material, has_map: bool) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self {
            color: material.color.to_array(),
            flags: [flag(material.is_lit()), flag(has_map), 0.0, 0.0],
        }
    }
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
    wireframe: bool,
}

/// A swapchain image with the scene drawn into it.
///
/// Draw any overlay into [`SurfaceFrame::view`], then [`SurfaceFrame::present`].
pub struct SurfaceFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl SurfaceFrame {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn present(self) {
        self.texture.present();
    }
}

/// wgpu scene renderer.
///
/// Geometry, materials and textures are uploaded the first time a frame
/// references them and stay resident for the renderer's lifetime.
pub struct WgpuRenderer {
    gpu: GpuContext,
    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    background_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::TextureView,
    depth_texture: wgpu::TextureView,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    meshes: BTreeMap<GeometryId, GpuMesh>,
    materials: BTreeMap<MaterialId, GpuMaterial>,
    textures: BTreeMap<TextureId, wgpu::TextureView>,
    background: Option<(TextureId, wgpu::BindGroup)>,
}

impl WgpuRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        let device = &gpu.device;
        let format = gpu.format();

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let background_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("background_pipeline_layout"),
            bind_group_layouts: &[&material_layout],
            push_constant_ranges: &[],
        });

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::mesh_shader().into()),
        });
        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::line_shader().into()),
        });
        let background_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("background_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BACKGROUND_SHADER.into()),
        });

        let depth_tested = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };

        let mesh_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "mesh_pipeline",
                layout: &scene_layout,
                module: &mesh_shader,
                vs_entry: "vs_main",
                fs_entry: "fs_main",
                buffers: &[Vertex::LAYOUT, InstanceData::LAYOUT],
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth: depth_tested.clone(),
                format,
            },
        );

        let line_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "line_pipeline",
                layout: &scene_layout,
                module: &line_shader,
                vs_entry: "vs_main",
                fs_entry: "fs_line",
                buffers: &[Vertex::LAYOUT, InstanceData::LAYOUT],
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::LineList,
                    ..Default::default()
                },
                depth: depth_tested,
                format,
            },
        );

        // Drawn first, behind everything, without touching depth.
        let background_pipeline = create_pipeline(
            device,
            PipelineDesc {
                label: "background_pipeline",
                layout: &background_layout,
                module: &background_shader,
                vs_entry: "vs_background",
                fs_entry: "fs_background",
                buffers: &[],
                primitive: wgpu::PrimitiveState::default(),
                depth: wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: Default::default(),
                    bias: Default::default(),
                },
                format,
            },
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = upload_texture(
            &gpu,
            &Texture {
                name: "white".into(),
                width: 1,
                height: 1,
                pixels: vec![255; 4],
            },
        );

        let instance_capacity = 1024;
        let instance_buffer = create_instance_buffer(device, instance_capacity);
        let (width, height) = gpu.size();
        let depth_texture = create_depth_texture(device, width, height);

        Self {
            mesh_pipeline,
            line_pipeline,
            background_pipeline,
            frame_buffer,
            frame_bind_group,
            material_layout,
            sampler,
            white,
            depth_texture,
            instance_buffer,
            instance_capacity,
            meshes: BTreeMap::new(),
            materials: BTreeMap::new(),
            textures: BTreeMap::new(),
            background: None,
            gpu,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let (width, height) = self.gpu.size();
        self.depth_texture = create_depth_texture(&self.gpu.device, width, height);
    }

    /// Number of geometries, materials and textures resident on the GPU.
    pub fn resident(&self) -> (usize, usize, usize) {
        (self.meshes.len(), self.materials.len(), self.textures.len())
    }

    /// Upload whatever this frame needs that is not resident yet.
    fn prepare(&mut self, scene: &Scene, batches: &[DrawBatch]) {
        let assets = scene.assets();
        for batch in batches {
            if !self.meshes.contains_key(&batch.geometry) {
                if let Some(geometry) = assets.geometry(batch.geometry) {
                    let label = format!("geometry_{:x}", batch.geometry.0);
                    let mesh = GpuMesh::upload(&self.gpu.device, &label, &geometry.tessellate());
                    self.meshes.insert(batch.geometry, mesh);
                }
            }
            if !self.materials.contains_key(&batch.material) {
                if let Some(material) = assets.material(batch.material) {
                    let gpu_material = self.upload_material(assets, material);
                    self.materials.insert(batch.material, gpu_material);
                }
            }
        }

        match scene.background() {
            Background::Texture(id) if self.background.as_ref().map(|b| b.0) != Some(id) => {
                if self.ensure_texture(assets, id) {
                    if let Some(view) = self.textures.get(&id) {
                        let material = Material::basic("background", Color::WHITE);
                        let bind_group =
                            self.material_bind_group("background", &material, view, true);
                        self.background = Some((id, bind_group));
                    }
                }
            }
            Background::Color(_) => self.background = None,
            _ => {}
        }
    }

    fn upload_material(&mut self, assets: &AssetStore, material: &Material) -> GpuMaterial {
        let has_map = material.map.is_some_and(|id| self.ensure_texture(assets, id));
        let view = material
            .map
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.white);
        tracing::debug!(material = %material.name, has_map, "uploading material");
        GpuMaterial {
            bind_group: self.material_bind_group(&material.name, material, view, has_map),
            wireframe: material.wireframe,
        }
    }

    /// Make texture `id` resident. False when the store does not have it.
    fn ensure_texture(&mut self, assets: &AssetStore, id: TextureId) -> bool {
        if self.textures.contains_key(&id) {
            return true;
        }
        let Some(texture) = assets.texture(id) else {
            return false;
        };
        let view = upload_texture(&self.gpu, texture);
        self.textures.insert(id, view);
        true
    }

    fn material_bind_group(
        &self,
        label: &str,
        material: &Material,
        view: &wgpu::TextureView,
        has_map: bool,
    ) -> wgpu::BindGroup {
        let device = &self.gpu.device;
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&MaterialUniforms::new(material, has_map)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    fn write_instances(&mut self, instances: &[InstanceData]) {
        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.gpu.device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "grew instance buffer");
        }
        if !instances.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
    }
}

impl Renderer for WgpuRenderer {
    type Output = Result<Option<SurfaceFrame>, RenderError>;

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Self::Output {
        let Some(texture) = self.gpu.acquire()? else {
            return Ok(None);
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let batches = collect_batches(scene);
        self.prepare(scene, &batches);

        let uniforms = FrameUniforms::new(&RenderView::from_camera(camera), &collect_lights(scene));
        self.gpu
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
        let (instances, ranges) = pack_instances(&batches);
        self.write_instances(&instances);

        let clear = match scene.background() {
            Background::Color(c) => c,
            Background::Texture(_) => Color::BLACK,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some((_, bind_group)) = &self.background {
                pass.set_pipeline(&self.background_pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.draw(0..3, 0..1);
            }

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (batch, range) in batches.iter().zip(ranges) {
                let (Some(mesh), Some(material)) =
                    (self.meshes.get(&batch.geometry), self.materials.get(&batch.material))
                else {
                    continue;
                };
                let (pipeline, indices) = match (&mesh.triangles, &mesh.lines) {
                    (Some(tris), _) if !material.wireframe => (&self.mesh_pipeline, tris),
                    (_, Some(lines)) => (&self.line_pipeline, lines),
                    _ => continue,
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &material.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(indices.0.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..indices.1, 0, range);
            }
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        Ok(Some(SurfaceFrame { texture, view }))
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    layout: &'a wgpu::PipelineLayout,
    module: &'a wgpu::ShaderModule,
    vs_entry: &'a str,
    fs_entry: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    primitive: wgpu::PrimitiveState,
    depth: wgpu::DepthStencilState,
    format: wgpu::TextureFormat,
}

fn create_pipeline(device: &wgpu::Device, desc: PipelineDesc<'_>) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(desc.layout),
        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some(desc.vs_entry),
            compilation_options: Default::default(),
            buffers: desc.buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some(desc.fs_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: desc.primitive,
        depth_stencil: Some(desc.depth),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn upload_texture(gpu: &GpuContext, texture: &Texture) -> wgpu::TextureView {
    let gpu_texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(&texture.name),
            size: wgpu::Extent3d {
                width: texture.width.max(1),
                height: texture.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &texture.pixels,
    );
    tracing::debug!("uploaded texture {} ({}x{})", texture.name, texture.width, texture.height);
    gpu_texture.create_view(&Default::default())
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: (capacity * std::mem::size_of::<InstanceData>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
