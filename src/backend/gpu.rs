use super::{
    Bindings, MeshId, MeshUsage, ProgramId, ProgramKind, RenderBackend, Resource, TextureDesc,
    TextureFormat, TextureId, VertexLayout,
};
use crate::config::StduiConfig;
use crate::error::{Result, StduiError};
use crate::utils::{Color, DrawUniforms, Size};
use pollster::block_on;
use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

const UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const POSITION_UV_ATTRS: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

struct GpuProgram {
    kind: ProgramKind,
    pipeline: wgpu::RenderPipeline,
}

struct GpuMesh {
    layout: VertexLayout,
    usage: MeshUsage,
    // static meshes live on the GPU, dynamic ones are copied into the frame arena per draw
    buffer: Option<wgpu::Buffer>,
    cpu: Vec<f32>,
    vertex_count: u32,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

enum VertexSource {
    Static(MeshId),
    Arena { offset: u64, len: u64 },
}

struct RecordedDraw {
    program: ProgramId,
    texture: Option<TextureId>,
    source: VertexSource,
    vertex_count: u32,
    uniform_offset: u32,
}

/// Resources released while a frame was open. Draws recorded earlier in the frame may
/// still use them, so they live until the frame is replayed.
#[derive(Default)]
struct Retired {
    programs: HashMap<ProgramId, GpuProgram>,
    meshes: HashMap<MeshId, GpuMesh>,
    textures: HashMap<TextureId, GpuTexture>,
}

/// Everything recorded between `begin_frame` and `end_frame`.
#[derive(Default)]
struct FrameArena {
    open: bool,
    clear: Color,
    vertices: Vec<u8>,
    uniforms: Vec<u8>,
    draws: Vec<RecordedDraw>,
    retired: Retired,
}

impl FrameArena {
    fn reset(&mut self, clear: Color) {
        self.open = true;
        self.clear = clear;
        self.vertices.clear();
        self.uniforms.clear();
        self.draws.clear();
        self.retired = Retired::default();
    }

    fn close(&mut self) {
        self.open = false;
        self.draws.clear();
        self.retired = Retired::default();
    }
}

struct GrowableBuffer {
    label: &'static str,
    usage: wgpu::BufferUsages,
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl GrowableBuffer {
    fn new(device: &wgpu::Device, label: &'static str, usage: wgpu::BufferUsages, capacity: u64) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            label,
            usage,
            buffer,
            capacity,
        }
    }

    /// Makes room for `size` bytes. Returns true when the buffer was recreated.
    fn ensure(&mut self, device: &wgpu::Device, size: u64) -> bool {
        if size <= self.capacity {
            return false;
        }
        let capacity = size.next_power_of_two();
        log::debug!("growing {} to {} bytes", self.label, capacity);
        *self = Self::new(device, self.label, self.usage, capacity);
        true
    }
}

/// wgpu implementation of [`RenderBackend`] bound to one window surface.
pub struct GpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_alignment: u64,
    uniform_buffer: GrowableBuffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: GrowableBuffer,
    programs: HashMap<ProgramId, GpuProgram>,
    meshes: HashMap<MeshId, GpuMesh>,
    textures: HashMap<TextureId, GpuTexture>,
    bindings: Bindings,
    uniforms: Option<DrawUniforms>,
    frame: FrameArena,
    viewport: Size,
    adapter_name: String,
}

impl GpuBackend {
    /// Creates the GPU context for `window`: adapter, device, swap chain and depth target.
    pub fn new(window: Arc<Window>, config: &StduiConfig) -> Result<Self> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: config.graphics_api.backends(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| StduiError::WindowCreationFailed(format!("create surface: {e}")))?;

        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or_else(|| {
            StduiError::WindowCreationFailed(format!(
                "no adapter for {:?} can present to this window",
                config.graphics_api
            ))
        })?;
        let info = adapter.get_info();
        log::info!("using {} ({:?})", info.name, info.backend);

        let (device, queue) = block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("stdui device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        ))
        .map_err(|e| StduiError::WindowCreationFailed(format!("request device: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        // Colours are specified in the same space they are written in, so prefer a linear format.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| {
                StduiError::WindowCreationFailed("surface reports no formats".into())
            })?;
        let present_mode = if config.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);
        let depth_view = create_depth_view(&device, &surface_config);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
            label: Some("stdui sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_buffer = GrowableBuffer::new(
            &device,
            "frame uniform arena",
            wgpu::BufferUsages::UNIFORM,
            uniform_alignment * 64,
        );
        let uniform_bind_group =
            create_uniform_bind_group(&device, &uniform_layout, &uniform_buffer.buffer);
        let vertex_buffer = GrowableBuffer::new(
            &device,
            "frame vertex arena",
            wgpu::BufferUsages::VERTEX,
            64 * 1024,
        );

        Ok(Self {
            surface,
            device,
            queue,
            viewport: Size::new(surface_config.width as f32, surface_config.height as f32),
            config: surface_config,
            depth_view,
            uniform_layout,
            texture_layout,
            sampler,
            uniform_alignment,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            bindings: Bindings::default(),
            uniforms: None,
            frame: FrameArena::default(),
            adapter_name: info.name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    fn build_pipeline(&self, kind: ProgramKind) -> wgpu::RenderPipeline {
        let (label, source) = match kind {
            ProgramKind::Shape => ("shape", include_str!("../../shaders/shape.wgsl")),
            ProgramKind::Text => ("text", include_str!("../../shaders/text.wgsl")),
            ProgramKind::Image => ("image", include_str!("../../shaders/image.wgsl")),
        };
        let shader = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
            });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = if kind.needs_texture() {
            vec![&self.uniform_layout, &self.texture_layout]
        } else {
            vec![&self.uniform_layout]
        };
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let vertex_layout = kind.vertex_layout();
        let attributes: &[wgpu::VertexAttribute] = match vertex_layout {
            VertexLayout::Position2 => &POSITION_ATTRS,
            VertexLayout::Position2Uv2 => &POSITION_UV_ATTRS,
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: vertex_layout.stride(),
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn push_uniforms(&mut self, uniforms: &DrawUniforms) -> u32 {
        let arena = &mut self.frame.uniforms;
        let offset = align_up(arena.len() as u64, self.uniform_alignment);
        arena.resize(offset as usize, 0);
        arena.extend_from_slice(bytemuck::bytes_of(uniforms));
        offset as u32
    }

    fn upload_frame(&mut self) {
        let vertex_bytes = self.frame.vertices.len() as u64;
        if vertex_bytes > 0 {
            self.vertex_buffer.ensure(&self.device, vertex_bytes);
            self.queue
                .write_buffer(&self.vertex_buffer.buffer, 0, &self.frame.vertices);
        }
        let uniform_bytes = self.frame.uniforms.len() as u64;
        if uniform_bytes > 0 {
            if self.uniform_buffer.ensure(&self.device, uniform_bytes) {
                self.uniform_bind_group = create_uniform_bind_group(
                    &self.device,
                    &self.uniform_layout,
                    &self.uniform_buffer.buffer,
                );
            }
            self.queue
                .write_buffer(&self.uniform_buffer.buffer, 0, &self.frame.uniforms);
        }
    }

    /// Replays the recorded frame into the next swap chain image.
    fn present(&mut self) -> Result<()> {
        if self.viewport.is_empty() {
            return Ok(());
        }

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring and skipping the frame");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("timed out acquiring the next frame, skipping it");
                return Ok(());
            }
            Err(e) => return Err(StduiError::Render(format!("acquire frame: {e}"))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.upload_frame();

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("stdui frame encoder"),
            });
        {
            let clear = self.frame.clear;
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("stdui frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &self.frame.draws {
                let retired = &self.frame.retired;
                let Some(program) = self
                    .programs
                    .get(&draw.program)
                    .or_else(|| retired.programs.get(&draw.program))
                else {
                    log::warn!("skipping draw: unknown program");
                    continue;
                };
                rpass.set_pipeline(&program.pipeline);
                rpass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
                if let Some(texture) = draw.texture {
                    let Some(texture) = self
                        .textures
                        .get(&texture)
                        .or_else(|| retired.textures.get(&texture))
                    else {
                        log::warn!("skipping draw: unknown texture");
                        continue;
                    };
                    rpass.set_bind_group(1, &texture.bind_group, &[]);
                }
                match draw.source {
                    VertexSource::Static(mesh) => {
                        let Some(buffer) = self
                            .meshes
                            .get(&mesh)
                            .or_else(|| retired.meshes.get(&mesh))
                            .and_then(|m| m.buffer.as_ref())
                        else {
                            log::warn!("skipping draw: unknown mesh");
                            continue;
                        };
                        rpass.set_vertex_buffer(0, buffer.slice(..));
                    }
                    VertexSource::Arena { offset, len } => {
                        rpass.set_vertex_buffer(
                            0,
                            self.vertex_buffer.buffer.slice(offset..offset + len),
                        );
                    }
                }
                rpass.draw(0..draw.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, &self.config);
    }
}

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn resize(&mut self, viewport: Size) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        if viewport.is_empty() {
            // minimised; keep the old swap chain until there is something to draw into
            return;
        }
        self.config.width = viewport.width as u32;
        self.config.height = viewport.height as u32;
        self.reconfigure();
    }

    fn begin_frame(&mut self, clear: Color) -> Result<()> {
        if self.frame.open {
            return Err(StduiError::Render("begin_frame while a frame is open".into()));
        }
        self.frame.reset(clear);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if !self.frame.open {
            return Err(StduiError::Render("end_frame without begin_frame".into()));
        }
        let result = self.present();
        self.frame.close();
        result
    }

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        let pipeline = self.build_pipeline(kind);
        let id = ProgramId::new();
        self.programs.insert(id, GpuProgram { kind, pipeline });
        Ok(id)
    }

    fn create_mesh(
        &mut self,
        layout: VertexLayout,
        usage: MeshUsage,
        vertices: &[f32],
    ) -> Result<MeshId> {
        let vertex_count = layout.vertex_count(vertices)?;
        let buffer = (usage == MeshUsage::Static && !vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("static mesh"),
                    contents: bytemuck::cast_slice(vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
        let cpu = match usage {
            MeshUsage::Static => Vec::new(),
            MeshUsage::Dynamic => vertices.to_vec(),
        };
        let id = MeshId::new();
        self.meshes.insert(
            id,
            GpuMesh {
                layout,
                usage,
                buffer,
                cpu,
                vertex_count,
            },
        );
        Ok(id)
    }

    fn write_mesh(&mut self, mesh: MeshId, vertices: &[f32]) -> Result<()> {
        let slot = self
            .meshes
            .get_mut(&mesh)
            .ok_or(StduiError::UnknownResource("mesh"))?;
        if slot.usage == MeshUsage::Static {
            return Err(StduiError::Render("cannot rewrite a static mesh".into()));
        }
        slot.vertex_count = slot.layout.vertex_count(vertices)?;
        slot.cpu.clear();
        slot.cpu.extend_from_slice(vertices);
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId> {
        desc.check_pixels(pixels)?;
        desc.check_extent(self.device.limits().max_texture_dimension_2d)?;
        let format = match desc.format {
            TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        };
        let texture = self.device.create_texture_with_data(
            &self.queue,
            &wgpu::TextureDescriptor {
                label: Some(desc.label),
                size: wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.label),
            layout: &self.texture_layout,
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
        let id = TextureId::new();
        self.textures.insert(
            id,
            GpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        Ok(id)
    }

    fn release(&mut self, resource: Resource) {
        let open = self.frame.open;
        let retired = &mut self.frame.retired;
        match resource {
            Resource::Program(id) => {
                if self.bindings.program == Some(id) {
                    self.bindings.program = None;
                }
                if let Some(program) = self.programs.remove(&id) {
                    if open {
                        retired.programs.insert(id, program);
                    }
                }
            }
            Resource::Mesh(id) => {
                if self.bindings.mesh == Some(id) {
                    self.bindings.mesh = None;
                }
                if let Some(mesh) = self.meshes.remove(&id) {
                    if open {
                        retired.meshes.insert(id, mesh);
                    } else if let Some(buffer) = mesh.buffer {
                        buffer.destroy();
                    }
                }
            }
            Resource::Texture(id) => {
                if self.bindings.texture == Some(id) {
                    self.bindings.texture = None;
                }
                if let Some(texture) = self.textures.remove(&id) {
                    if open {
                        retired.textures.insert(id, texture);
                    }
                }
            }
        }
    }

    fn bindings(&self) -> Bindings {
        self.bindings
    }

    fn bind_program(&mut self, program: Option<ProgramId>) {
        self.bindings.program = program;
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.bindings.texture = texture;
    }

    fn bind_mesh(&mut self, mesh: Option<MeshId>) {
        self.bindings.mesh = mesh;
    }

    fn set_uniforms(&mut self, uniforms: DrawUniforms) {
        self.uniforms = Some(uniforms);
    }

    fn draw(&mut self, vertex_count: u32) -> Result<()> {
        if !self.frame.open {
            return Err(StduiError::Render("draw outside of a frame".into()));
        }
        let program_id = self
            .bindings
            .program
            .ok_or(StduiError::UnknownResource("program"))?;
        let kind = self
            .programs
            .get(&program_id)
            .map(|p| p.kind)
            .ok_or(StduiError::UnknownResource("program"))?;
        let mesh_id = self
            .bindings
            .mesh
            .ok_or(StduiError::UnknownResource("mesh"))?;
        let mesh = self
            .meshes
            .get(&mesh_id)
            .ok_or(StduiError::UnknownResource("mesh"))?;
        if mesh.layout != kind.vertex_layout() {
            return Err(StduiError::Render(format!(
                "{kind:?} program cannot draw a {:?} mesh",
                mesh.layout
            )));
        }
        let texture = if kind.needs_texture() {
            let id = self
                .bindings
                .texture
                .filter(|id| self.textures.contains_key(id))
                .ok_or(StduiError::UnknownResource("texture"))?;
            Some(id)
        } else {
            None
        };
        if vertex_count > mesh.vertex_count {
            return Err(StduiError::Render(format!(
                "draw of {vertex_count} vertices from a {}-vertex mesh",
                mesh.vertex_count
            )));
        }
        if vertex_count == 0 {
            return Ok(());
        }
        let uniforms = self
            .uniforms
            .ok_or_else(|| StduiError::Render("draw without uniforms".into()))?;

        let source = match mesh.usage {
            MeshUsage::Static => VertexSource::Static(mesh_id),
            MeshUsage::Dynamic => {
                let floats = vertex_count as usize * mesh.layout.floats_per_vertex();
                let offset = self.frame.vertices.len() as u64;
                self.frame
                    .vertices
                    .extend_from_slice(bytemuck::cast_slice(&mesh.cpu[..floats]));
                VertexSource::Arena {
                    offset,
                    len: self.frame.vertices.len() as u64 - offset,
                }
            }
        };
        let uniform_offset = self.push_uniforms(&uniforms);
        self.frame.draws.push(RecordedDraw {
            program: program_id,
            texture,
            source,
            vertex_count,
            uniform_offset,
        });
        Ok(())
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_uniform_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(UNIFORM_SIZE),
            }),
        }],
    })
}

fn create_depth_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth target"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::align_up;

    #[test]
    fn uniform_offsets_align_up() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(80, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }
}
