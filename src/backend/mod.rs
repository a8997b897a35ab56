//! Render backend seam.
//!
//! The shape, text and image renderers talk to the GPU through [`RenderBackend`], a small
//! bind-then-draw state machine. One implementation is picked at start-up: [`GpuBackend`]
//! for real windows, [`NullBackend`] when no adapter is usable, and [`RecordingBackend`]
//! for headless hosts and tests.

mod gpu;
mod null;
pub mod recording;

pub use gpu::GpuBackend;
pub use null::NullBackend;
pub use recording::RecordingBackend;

use crate::error::{Result, StduiError};
use crate::utils::{Color, DrawUniforms, Size};
use std::ops::{Deref, DerefMut};
use uuid::Uuid;

macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

handle!(ProgramId);
handle!(MeshId);
handle!(TextureId);

/// The three shader programs the toolkit knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Flat colour, 2D positions.
    Shape,
    /// Single-channel atlas used as coverage, tinted by the uniform colour.
    Text,
    /// RGBA texture, tinted by the uniform colour.
    Image,
}

impl ProgramKind {
    pub fn vertex_layout(self) -> VertexLayout {
        match self {
            ProgramKind::Shape => VertexLayout::Position2,
            ProgramKind::Text | ProgramKind::Image => VertexLayout::Position2Uv2,
        }
    }

    pub fn needs_texture(self) -> bool {
        !matches!(self, ProgramKind::Shape)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// `x, y`
    Position2,
    /// `x, y, u, v`
    Position2Uv2,
}

impl VertexLayout {
    pub fn floats_per_vertex(self) -> usize {
        match self {
            VertexLayout::Position2 => 2,
            VertexLayout::Position2Uv2 => 4,
        }
    }

    pub fn stride(self) -> u64 {
        (self.floats_per_vertex() * std::mem::size_of::<f32>()) as u64
    }

    /// Number of whole vertices in `vertices`, or an error if the slice is ragged.
    pub fn vertex_count(self, vertices: &[f32]) -> Result<u32> {
        let per = self.floats_per_vertex();
        if vertices.len() % per != 0 {
            return Err(StduiError::Render(format!(
                "{} floats is not a whole number of {per}-float vertices",
                vertices.len()
            )));
        }
        Ok((vertices.len() / per) as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshUsage {
    /// Uploaded once, never rewritten.
    Static,
    /// Rewritten before every draw that uses it.
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    R8,
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    pub fn check_pixels(&self, pixels: &[u8]) -> Result<()> {
        let expected =
            self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize;
        if self.width == 0 || self.height == 0 || pixels.len() != expected {
            return Err(StduiError::Render(format!(
                "{}: expected {expected} bytes for {}x{}, got {}",
                self.label,
                self.width,
                self.height,
                pixels.len()
            )));
        }
        Ok(())
    }

    /// Rejects extents the device cannot allocate.
    pub fn check_extent(&self, max_dimension: u32) -> Result<()> {
        if self.width > max_dimension || self.height > max_dimension {
            return Err(StduiError::Render(format!(
                "{}: {}x{} exceeds the {max_dimension}px texture limit",
                self.label, self.width, self.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Program(ProgramId),
    Mesh(MeshId),
    Texture(TextureId),
}

/// Snapshot of the currently bound program, texture and mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bindings {
    pub program: Option<ProgramId>,
    pub texture: Option<TextureId>,
    pub mesh: Option<MeshId>,
}

pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Current drawable size in pixels.
    fn viewport(&self) -> Size;
    fn resize(&mut self, viewport: Size);

    fn begin_frame(&mut self, clear: Color) -> Result<()>;
    fn end_frame(&mut self) -> Result<()>;

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId>;
    fn create_mesh(
        &mut self,
        layout: VertexLayout,
        usage: MeshUsage,
        vertices: &[f32],
    ) -> Result<MeshId>;
    /// Replaces the whole content of a dynamic mesh.
    fn write_mesh(&mut self, mesh: MeshId, vertices: &[f32]) -> Result<()>;
    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId>;
    /// Frees a resource. Releasing a bound resource unbinds it.
    fn release(&mut self, resource: Resource);

    fn bindings(&self) -> Bindings;
    fn bind_program(&mut self, program: Option<ProgramId>);
    fn bind_texture(&mut self, texture: Option<TextureId>);
    fn bind_mesh(&mut self, mesh: Option<MeshId>);
    fn set_uniforms(&mut self, uniforms: DrawUniforms);

    /// Draws the first `vertex_count` vertices of the bound mesh as a triangle list.
    fn draw(&mut self, vertex_count: u32) -> Result<()>;

    fn restore(&mut self, bindings: Bindings) {
        self.bind_program(bindings.program);
        self.bind_texture(bindings.texture);
        self.bind_mesh(bindings.mesh);
    }
}

impl<T: RenderBackend + ?Sized> RenderBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn viewport(&self) -> Size {
        (**self).viewport()
    }

    fn resize(&mut self, viewport: Size) {
        (**self).resize(viewport)
    }

    fn begin_frame(&mut self, clear: Color) -> Result<()> {
        (**self).begin_frame(clear)
    }

    fn end_frame(&mut self) -> Result<()> {
        (**self).end_frame()
    }

    fn create_program(&mut self, kind: ProgramKind) -> Result<ProgramId> {
        (**self).create_program(kind)
    }

    fn create_mesh(
        &mut self,
        layout: VertexLayout,
        usage: MeshUsage,
        vertices: &[f32],
    ) -> Result<MeshId> {
        (**self).create_mesh(layout, usage, vertices)
    }

    fn write_mesh(&mut self, mesh: MeshId, vertices: &[f32]) -> Result<()> {
        (**self).write_mesh(mesh, vertices)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<TextureId> {
        (**self).create_texture(desc, pixels)
    }

    fn release(&mut self, resource: Resource) {
        (**self).release(resource)
    }

    fn bindings(&self) -> Bindings {
        (**self).bindings()
    }

    fn bind_program(&mut self, program: Option<ProgramId>) {
        (**self).bind_program(program)
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        (**self).bind_texture(texture)
    }

    fn bind_mesh(&mut self, mesh: Option<MeshId>) {
        (**self).bind_mesh(mesh)
    }

    fn set_uniforms(&mut self, uniforms: DrawUniforms) {
        (**self).set_uniforms(uniforms)
    }

    fn draw(&mut self, vertex_count: u32) -> Result<()> {
        (**self).draw(vertex_count)
    }

    fn restore(&mut self, bindings: Bindings) {
        (**self).restore(bindings)
    }
}

/// Captures the bindings on creation and puts them back when dropped, whichever way
/// the scope is left.
pub struct BindingGuard<'a, B: RenderBackend + ?Sized> {
    backend: &'a mut B,
    saved: Bindings,
}

impl<'a, B: RenderBackend + ?Sized> BindingGuard<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        let saved = backend.bindings();
        Self { backend, saved }
    }
}

impl<B: RenderBackend + ?Sized> Deref for BindingGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: RenderBackend + ?Sized> DerefMut for BindingGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: RenderBackend + ?Sized> Drop for BindingGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.restore(self.saved);
    }
}
