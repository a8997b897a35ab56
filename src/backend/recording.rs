//! Headless backend that keeps every resource on the CPU and records each draw.

use super::{
    Bindings, MeshId, MeshUsage, ProgramId, ProgramKind, RenderBackend, Resource, TextureDesc,
    TextureId, VertexLayout,
};
use crate::error::{Result, StduiError};
use crate::utils::{Color, DrawUniforms, Size};
use std::collections::HashMap;

/// Texture side limit every wgpu adapter supports.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 8192;

/// One recorded draw call, with the mesh content as it was when the draw was issued.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub program: ProgramKind,
    pub bindings: Bindings,
    pub uniforms: DrawUniforms,
    pub vertex_count: u32,
    pub vertices: Vec<f32>,
}

#[derive(Debug, Clone)]
struct RecordedMesh {
    layout: VertexLayout,
    usage: MeshUsage,
    vertices: Vec<f32>,
    writes: usize,
}

#[derive(Debug)]
pub struct RecordingBackend {
    viewport: Size,
    max_texture_dimension: u32,
    bindings: Bindings,
    uniforms: Option<DrawUniforms>,
    programs: HashMap<ProgramId, ProgramKind>,
    meshes: HashMap<MeshId, RecordedMesh>,
    textures: HashMap<TextureId, TextureDesc>,
    in_frame: bool,
    frames_begun: u64,
    frames_presented: u64,
    clear_color: Option<Color>,
    draws: Vec<DrawRecord>,
    released: Vec<Resource>,
}

impl RecordingBackend {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION,
            bindings: Bindings::default(),
            uniforms: None,
            programs: HashMap::new(),
            meshes: HashMap::new(),
            textures: HashMap::new(),
            in_frame: false,
            frames_begun: 0,
            frames_presented: 0,
            clear_color: None,
            draws: Vec::new(),
            released: Vec::new(),
        }
    }

    /// Mimics a device whose textures cannot be wider or taller than `max`.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    pub fn frames_begun(&self) -> u64 {
        self.frames_begun
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn clear_color(&self) -> Option<Color> {
        self.clear_color
    }

    pub fn released(&self) -> &[Resource] {
        &self.released
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn texture_desc(&self, texture: TextureId) -> Option<&TextureDesc> {
        self.textures.get(&texture)
    }

    /// How many times a dynamic mesh has been rewritten.
    pub fn mesh_writes(&self, mesh: MeshId) -> usize {
        self.meshes.get(&mesh).map(|m| m.writes).unwrap_or(0)
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn begin_frame(&mut self, clear: Color) -> Result<()> {
        if self.in_frame {
            return Err(StduiError::Render("begin_frame while a frame is open".into()));
        }
        self.in_frame = true;
        self.frames_begun += 1;
        self.clear_color = Some(clear);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        if !self.in_frame {
            return Err(StduiError::Render("end_frame without begin_frame".into()));
        }
        self.in_frame = false;
        self.frames_presented += 1;
        Ok(())
    }

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        let id = ProgramId::new();
        self.programs.insert(id, kind);
        Ok(id)
    }

    fn create_mesh(
        &mut self,
        layout: VertexLayout,
        usage: MeshUsage,
        vertices: &[f32],
    ) -> Result<MeshId> {
        layout.vertex_count(vertices)?;
        let id = MeshId::new();
        self.meshes.insert(
            id,
            RecordedMesh {
                layout,
                usage,
                vertices: vertices.to_vec(),
                writes: 0,
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
        slot.layout.vertex_count(vertices)?;
        slot.vertices.clear();
        slot.vertices.extend_from_slice(vertices);
        slot.writes += 1;
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId> {
        desc.check_pixels(pixels)?;
        desc.check_extent(self.max_texture_dimension)?;
        let id = TextureId::new();
        self.textures.insert(id, *desc);
        Ok(id)
    }

    fn release(&mut self, resource: Resource) {
        let known = match resource {
            Resource::Program(id) => {
                if self.bindings.program == Some(id) {
                    self.bindings.program = None;
                }
                self.programs.remove(&id).is_some()
            }
            Resource::Mesh(id) => {
                if self.bindings.mesh == Some(id) {
                    self.bindings.mesh = None;
                }
                self.meshes.remove(&id).is_some()
            }
            Resource::Texture(id) => {
                if self.bindings.texture == Some(id) {
                    self.bindings.texture = None;
                }
                self.textures.remove(&id).is_some()
            }
        };
        if known {
            self.released.push(resource);
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
        if !self.in_frame {
            return Err(StduiError::Render("draw outside of a frame".into()));
        }
        let program = self
            .bindings
            .program
            .and_then(|id| self.programs.get(&id).copied())
            .ok_or(StduiError::UnknownResource("program"))?;
        let mesh = self
            .bindings
            .mesh
            .and_then(|id| self.meshes.get(&id))
            .ok_or(StduiError::UnknownResource("mesh"))?;
        if mesh.layout != program.vertex_layout() {
            return Err(StduiError::Render(format!(
                "{program:?} program cannot draw a {:?} mesh",
                mesh.layout
            )));
        }
        if program.needs_texture()
            && !self
                .bindings
                .texture
                .is_some_and(|id| self.textures.contains_key(&id))
        {
            return Err(StduiError::UnknownResource("texture"));
        }
        let available = mesh.layout.vertex_count(&mesh.vertices)?;
        if vertex_count > available {
            return Err(StduiError::Render(format!(
                "draw of {vertex_count} vertices from a {available}-vertex mesh"
            )));
        }
        let uniforms = self
            .uniforms
            .ok_or_else(|| StduiError::Render("draw without uniforms".into()))?;
        let floats = vertex_count as usize * mesh.layout.floats_per_vertex();
        let record = DrawRecord {
            program,
            bindings: self.bindings,
            uniforms,
            vertex_count,
            vertices: mesh.vertices[..floats].to_vec(),
        };
        self.draws.push(record);
        Ok(())
    }
}
