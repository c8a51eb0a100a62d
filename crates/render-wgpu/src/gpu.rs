use bytemuck::{Pod, Zeroable};
use cityscape_atlas::TextureAtlas;
use cityscape_citygen::{BaseMesh, GridLayout, Vertex};
use cityscape_render::{
    CityGeneration, FrameError, FrameUniforms, InstanceRaw, RenderBackend, pack_instances,
};
use wgpu::util::DeviceExt;

use crate::context::GfxContext;
use crate::shaders;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const STREET_COLOR: [f32; 4] = [0.16, 0.17, 0.22, 1.0];
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.025,
    b: 0.05,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
}

impl Uniforms {
    fn from_frame(frame: &FrameUniforms) -> Self {
        Self {
            view_proj: frame.view_proj.to_cols_array_2d(),
            eye: frame.eye.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct StreetVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Line-list vertices for the street grid, lifted off the ground slightly.
fn street_vertices(layout: &GridLayout) -> Vec<StreetVertex> {
    layout
        .street_lines()
        .into_iter()
        .flat_map(|[a, b]| {
            [a, b].map(|p| StreetVertex {
                position: [p.x, p.y + 0.01, p.z],
                color: STREET_COLOR,
            })
        })
        .collect()
}

/// All layers of `atlas`, tightly packed in layer order.
fn atlas_texels(atlas: &TextureAtlas) -> Vec<u8> {
    let mut texels = Vec::with_capacity(atlas.images().iter().map(|i| i.pixels().len()).sum());
    for image in atlas.images() {
        texels.extend_from_slice(image.pixels());
    }
    texels
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuCity {
    generation: u64,
    instance_buffer: wgpu::Buffer,
    instance_count: u32,
    street_buffer: wgpu::Buffer,
    street_vertex_count: u32,
}

struct GpuAtlas {
    revision: u64,
    layers: u32,
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`RenderBackend`].
pub struct WgpuBackend {
    ctx: GfxContext,
    city_pipeline: wgpu::RenderPipeline,
    street_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    atlas_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    depth_texture: wgpu::TextureView,
    mesh: Option<GpuMesh>,
    city: Option<GpuCity>,
    atlas: Option<GpuAtlas>,
}

impl WgpuBackend {
    pub fn new(ctx: GfxContext) -> Self {
        let device = &ctx.device;
        let format = ctx.format();
        let (width, height) = ctx.size();

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0, 0.0, 0.0, 1.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let atlas_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atlas_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
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
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("facade_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let city_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("city_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &atlas_layout],
            push_constant_ranges: &[],
        });
        let street_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("street_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let city_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("city_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::CITY_SHADER.into()),
        });

        let city_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("city_pipeline"),
            layout: Some(&city_layout),
            vertex: wgpu::VertexState {
                module: &city_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x4,
                            1 => Float32x4,
                            2 => Float32x4,
                            3 => Float32x2,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceRaw>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                            8 => Float32x3,
                            9 => Float32x3,
                            10 => Float32x3,
                            11 => Float32x4,
                            12 => Uint32,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &city_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let street_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("street_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::STREET_SHADER.into()),
        });

        let street_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("street_pipeline"),
            layout: Some(&street_layout),
            vertex: wgpu::VertexState {
                module: &street_shader,
                entry_point: Some("vs_street"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StreetVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &street_shader,
                entry_point: Some("fs_street"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = create_depth_texture(device, width, height);

        Self {
            ctx,
            city_pipeline,
            street_pipeline,
            uniform_buffer,
            uniform_bind_group,
            atlas_layout,
            sampler,
            depth_texture,
            mesh: None,
            city: None,
            atlas: None,
        }
    }

    fn upload_mesh(&self, mesh: &BaseMesh) -> GpuMesh {
        let device = &self.ctx.device;
        GpuMesh {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("block_vertex_buffer"),
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("block_index_buffer"),
                contents: mesh.index_bytes(),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh.indices.len() as u32,
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn upload_atlas(&mut self, atlas: &TextureAtlas) -> Result<(), FrameError> {
        let device = &self.ctx.device;
        let size = atlas.texture_size();
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: atlas.len(),
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("facade_atlas"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.ctx.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &atlas_texels(atlas),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("facade_atlas_view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas_bind_group"),
            layout: &self.atlas_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.atlas = Some(GpuAtlas {
            revision: atlas.revision(),
            layers: atlas.len(),
            _texture: texture,
            bind_group,
        });
        tracing::debug!(revision = atlas.revision(), layers = atlas.len(), size, "atlas texture array written");
        Ok(())
    }

    fn upload_city(&mut self, city: &CityGeneration, layers: u32) -> Result<(), FrameError> {
        if self.mesh.is_none() {
            self.mesh = Some(self.upload_mesh(city.city().mesh()));
        }

        let device = &self.ctx.device;
        let instances = pack_instances(city.city(), layers);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("instance_buffer"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let streets = street_vertices(city.city().layout());
        let street_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("street_vertex_buffer"),
            contents: bytemuck::cast_slice(&streets),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // New buffers first, then one swap.
        self.city = Some(GpuCity {
            generation: city.id(),
            instance_buffer,
            instance_count: instances.len() as u32,
            street_buffer,
            street_vertex_count: streets.len() as u32,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.configure(width, height);
        let (w, h) = self.ctx.size();
        self.depth_texture = create_depth_texture(&self.ctx.device, w, h);
    }

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), FrameError> {
        let (Some(mesh), Some(city), Some(atlas)) = (&self.mesh, &self.city, &self.atlas) else {
            return Err(FrameError::NotReady);
        };

        let frame = self.ctx.acquire()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ctx.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::from_frame(uniforms)),
        );

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("city_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("city_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
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

            pass.set_pipeline(&self.street_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, city.street_buffer.slice(..));
            pass.draw(0..city.street_vertex_count, 0..1);

            pass.set_pipeline(&self.city_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &atlas.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, city.instance_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..mesh.index_count, 0, 0..city.instance_count);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        tracing::trace!(
            generation = city.generation,
            atlas = atlas.revision,
            layers = atlas.layers,
            instances = city.instance_count,
            "frame submitted"
        );
        Ok(())
    }
}

fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: Default::default(),
        bias: Default::default(),
    }
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
