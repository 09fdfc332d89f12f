use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::bytes_of;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::assets::AssetRegistry;
use crate::frame::{DrawList, StencilMode};
use crate::mesh::{MeshData, Topology, Vertex};
use crate::texture::TextureData;

use super::shared::{DrawUniform, SHADER};

const STENCIL_REFERENCE: u32 = 1;
const INITIAL_DRAW_CAPACITY: usize = 64;

type PipelineKey = (StencilMode, Topology);

/// wgpu renderer that replays a lab's [`DrawList`] each frame.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    sample_count: u32,
    depth: AttachmentTexture,
    msaa: Option<AttachmentTexture>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    draw_layout: wgpu::BindGroupLayout,
    draws: DrawUniforms,
    meshes: Vec<MeshBuffers>,
    textures: Vec<wgpu::BindGroup>,
    white: wgpu::BindGroup,
}

impl Renderer {
    /// Creates the GPU state for `window` and uploads every mesh and
    /// texture registered in `assets`.
    pub async fn new(window: Arc<Window>, assets: &AssetRegistry, sample_count: u32) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        let device_descriptor = wgpu::DeviceDescriptor {
            label: Some("labs-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: Default::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
        };
        let (device, queue) = adapter
            .request_device(&device_descriptor)
            .await
            .context("failed to create GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let format_features = adapter.get_texture_format_features(surface_format);
        let sample_count = if sample_count > 1
            && format_features
                .flags
                .sample_count_supported(sample_count)
        {
            sample_count
        } else {
            if sample_count > 1 {
                log::warn!("{sample_count}x MSAA unsupported for {surface_format:?}, rendering without it");
            }
            1
        };

        let depth = AttachmentTexture::depth(&device, size, sample_count);
        let msaa = AttachmentTexture::multisampled(&device, &config, sample_count);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("labs-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(DrawUniforms::SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-layout"),
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
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("labs-pipeline-layout"),
            bind_group_layouts: &[&draw_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let mut pipelines = HashMap::new();
        for stencil in [StencilMode::Disabled, StencilMode::Write, StencilMode::Test] {
            for topology in [Topology::Triangles, Topology::Lines] {
                let pipeline = create_pipeline(
                    &device,
                    &pipeline_layout,
                    &shader,
                    surface_format,
                    sample_count,
                    (stencil, topology),
                );
                pipelines.insert((stencil, topology), pipeline);
            }
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("repeat-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let upload = |texture: &TextureData, label: &str| {
            upload_texture(&device, &queue, &texture_layout, &sampler, texture, label)
        };
        let textures: Vec<wgpu::BindGroup> = assets
            .textures()
            .iter()
            .enumerate()
            .map(|(index, texture)| upload(texture, &format!("texture-{index}")))
            .collect();
        let white = upload(&TextureData::white(), "white-texture");

        let meshes: Vec<MeshBuffers> = assets
            .meshes()
            .iter()
            .enumerate()
            .map(|(index, mesh)| MeshBuffers::from_mesh(&device, mesh, &format!("mesh-{index}")))
            .collect();

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let draws = DrawUniforms::new(&device, &draw_layout, alignment, INITIAL_DRAW_CAPACITY);

        log::info!(
            "renderer ready: {}x{} {:?}, {}x MSAA",
            size.width,
            size.height,
            surface_format,
            sample_count
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            depth,
            msaa,
            pipelines,
            draw_layout,
            draws,
            meshes,
            textures,
            white,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Resizes the swap chain and the attachments to match the window.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = AttachmentTexture::depth(&self.device, new_size, self.sample_count);
        self.msaa = AttachmentTexture::multisampled(&self.device, &self.config, self.sample_count);
    }

    /// Executes one recorded frame and presents it.
    pub fn render(&mut self, list: &DrawList) -> Result<(), wgpu::SurfaceError> {
        let aspect = self.size.width as f32 / self.size.height.max(1) as f32;
        let view_proj = list.camera.view_projection(aspect);

        if list.commands.len() > self.draws.capacity {
            let capacity = list.commands.len().next_power_of_two();
            log::debug!("growing draw uniforms to {capacity}");
            self.draws = DrawUniforms::new(&self.device, &self.draw_layout, self.draws.alignment, capacity);
        }
        let stride = self.draws.stride as usize;
        let mut bytes = vec![0u8; stride * list.commands.len()];
        for (index, command) in list.commands.iter().enumerate() {
            let uniform = DrawUniform::new(view_proj, command);
            let start = index * stride;
            bytes[start..start + DrawUniforms::SIZE as usize].copy_from_slice(bytes_of(&uniform));
        }
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.draws.buffer, 0, &bytes);
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("labs-encoder"),
            });

        let (target, resolve_target) = match &self.msaa {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        let clear = list.clear.to_linear();

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("labs-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: clear.x as f64,
                        g: clear.y as f64,
                        b: clear.z as f64,
                        a: clear.w as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_stencil_reference(STENCIL_REFERENCE);

        let mut bound: Option<PipelineKey> = None;
        for (index, command) in list.commands.iter().enumerate() {
            let Some(mesh) = self.meshes.get(command.mesh.0) else {
                log::warn!("draw {index} references unknown mesh {:?}", command.mesh);
                continue;
            };
            let key = (command.phase.stencil_mode(), command.topology);
            if bound != Some(key) {
                if let Some(pipeline) = self.pipelines.get(&key) {
                    pass.set_pipeline(pipeline);
                }
                bound = Some(key);
            }
            let texture = command
                .texture
                .and_then(|id| self.textures.get(id.0))
                .unwrap_or(&self.white);

            let offset = index as u32 * self.draws.stride;
            pass.set_bind_group(0, &self.draws.bind_group, &[offset]);
            pass.set_bind_group(1, texture, &[]);
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }

        drop(pass);
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    sample_count: u32,
    (stencil, topology): PipelineKey,
) -> wgpu::RenderPipeline {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x4,
    ];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("pipeline-{stencil:?}-{topology:?}")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &ATTRIBUTES,
            }],
        },
        primitive: primitive_state(topology),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: AttachmentTexture::DEPTH_FORMAT,
            depth_write_enabled: depth_writes(stencil),
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: stencil_state(stencil),
            bias: Default::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

/// Meshes wind counter-clockwise seen from outside; only filled
/// triangles have a back face to cull.
fn primitive_state(topology: Topology) -> wgpu::PrimitiveState {
    let (topology, cull_mode) = match topology {
        Topology::Triangles => (wgpu::PrimitiveTopology::TriangleList, Some(wgpu::Face::Back)),
        Topology::Lines => (wgpu::PrimitiveTopology::LineList, None),
    };
    wgpu::PrimitiveState {
        topology,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        polygon_mode: wgpu::PolygonMode::Fill,
        ..Default::default()
    }
}

/// The mask plane is the only draw that leaves depth untouched.
fn depth_writes(stencil: StencilMode) -> bool {
    stencil != StencilMode::Write
}

fn stencil_state(mode: StencilMode) -> wgpu::StencilState {
    let face = |compare, pass_op| wgpu::StencilFaceState {
        compare,
        fail_op: wgpu::StencilOperation::Keep,
        depth_fail_op: wgpu::StencilOperation::Keep,
        pass_op,
    };
    match mode {
        StencilMode::Disabled => wgpu::StencilState::default(),
        StencilMode::Write => {
            let face = face(wgpu::CompareFunction::Always, wgpu::StencilOperation::Replace);
            wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0xff,
            }
        }
        StencilMode::Test => {
            let face = face(wgpu::CompareFunction::Equal, wgpu::StencilOperation::Keep);
            wgpu::StencilState {
                front: face,
                back: face,
                read_mask: 0xff,
                write_mask: 0x00,
            }
        }
    }
}

fn align_to(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    data: &TextureData,
    label: &str,
) -> wgpu::BindGroup {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: data.mip_count().max(1),
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (level, pixels) in data.mips.iter().enumerate() {
        let (width, height) = data.mip_size(level as u32);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// One uniform buffer holding every draw's block, each at an aligned offset.
struct DrawUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u32,
    alignment: u32,
    capacity: usize,
}

impl DrawUniforms {
    const SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;

    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        alignment: u32,
        capacity: usize,
    ) -> Self {
        let stride = align_to(Self::SIZE, alignment as u64);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw-uniforms"),
            size: stride * capacity.max(1) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw-bind-group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(Self::SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride: stride as u32,
            alignment,
            capacity: capacity.max(1),
        }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.index_count(),
        }
    }
}

struct AttachmentTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl AttachmentTexture {
    const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

    fn depth(device: &wgpu::Device, size: PhysicalSize<u32>, sample_count: u32) -> Self {
        Self::create(device, "depth-stencil", size, sample_count, Self::DEPTH_FORMAT)
    }

    /// Colour target resolved into the swap chain. `None` without MSAA.
    fn multisampled(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Option<Self> {
        (sample_count > 1).then(|| {
            Self::create(
                device,
                "msaa-color",
                PhysicalSize::new(config.width, config.height),
                sample_count,
                config.format,
            )
        })
    }

    fn create(
        device: &wgpu::Device,
        label: &str,
        size: PhysicalSize<u32>,
        sample_count: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
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
