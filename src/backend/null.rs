use super::{
    Bindings, MeshId, MeshUsage, ProgramId, ProgramKind, RenderBackend, Resource, TextureDesc,
    TextureId, VertexLayout,
};
use crate::error::Result;
use crate::utils::{Color, DrawUniforms, Size};

/// Stand-in used when no GPU adapter is usable: hands out handles, draws nothing,
/// and says so once.
#[derive(Debug, Default)]
pub struct NullBackend {
    viewport: Size,
    bindings: Bindings,
    warned: bool,
}

impl NullBackend {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    fn warn_once(&mut self) {
        if !self.warned {
            self.warned = true;
            log::warn!("no render backend available, draw calls are ignored");
        }
    }
}

impl RenderBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn begin_frame(&mut self, _clear: Color) -> Result<()> {
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }

    fn create_program(&mut self, _kind: ProgramKind) -> Result<ProgramId> {
        Ok(ProgramId::new())
    }

    fn create_mesh(
        &mut self,
        layout: VertexLayout,
        _usage: MeshUsage,
        vertices: &[f32],
    ) -> Result<MeshId> {
        layout.vertex_count(vertices)?;
        Ok(MeshId::new())
    }

    fn write_mesh(&mut self, _mesh: MeshId, _vertices: &[f32]) -> Result<()> {
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId> {
        desc.check_pixels(pixels)?;
        Ok(TextureId::new())
    }

    fn release(&mut self, _resource: Resource) {}

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

    fn set_uniforms(&mut self, _uniforms: DrawUniforms) {}

    fn draw(&mut self, _vertex_count: u32) -> Result<()> {
        self.warn_once();
        Ok(())
    }
}
