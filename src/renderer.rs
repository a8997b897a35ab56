use crate::backend::{MeshId, MeshUsage, ProgramId, ProgramKind, RenderBackend, Resource, VertexLayout};
use crate::config::MIN_CIRCLE_SEGMENTS;
use crate::error::{Result, StduiError};
use crate::transform::Mat4;
use crate::utils::{Color, DrawUniforms, Position};
use std::f32::consts::TAU;

/// The pre-built unit meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Triangle,
    Rectangle,
    Circle,
}

struct ShapeResources {
    program: ProgramId,
    triangle: (MeshId, u32),
    rectangle: (MeshId, u32),
    circle: (MeshId, u32),
    polygon: MeshId,
}

/// Shader and meshes used by every shape draw.
///
/// All unit meshes are centred on the origin with extent `[-0.5, 0.5]`; the model transform
/// scales them to the pose's width and height.
pub struct RendererContext {
    resources: Option<ShapeResources>,
    scratch: Vec<f32>,
}

impl RendererContext {
    pub fn initialize(backend: &mut dyn RenderBackend, circle_segments: u32) -> Result<Self> {
        let program = backend.create_program(ProgramKind::Shape)?;

        let triangle = unit_triangle();
        let rectangle = unit_rectangle();
        let circle = unit_circle(circle_segments);

        let mut mesh = |vertices: &[f32]| -> Result<(MeshId, u32)> {
            let id = backend.create_mesh(VertexLayout::Position2, MeshUsage::Static, vertices)?;
            Ok((id, (vertices.len() / 2) as u32))
        };
        let triangle = mesh(&triangle)?;
        let rectangle = mesh(&rectangle)?;
        let circle = mesh(&circle)?;
        let polygon = backend.create_mesh(VertexLayout::Position2, MeshUsage::Dynamic, &[])?;

        log::debug!(
            "shape renderer ready on {} backend ({} circle vertices)",
            backend.name(),
            circle.1
        );
        Ok(Self {
            resources: Some(ShapeResources {
                program,
                triangle,
                rectangle,
                circle,
                polygon,
            }),
            scratch: Vec::new(),
        })
    }

    fn resources(&self) -> Result<&ShapeResources> {
        self.resources
            .as_ref()
            .ok_or_else(|| StduiError::Render("shape renderer used after cleanup".into()))
    }

    /// Draws one unit mesh with `transform` (projection already applied) in `color`.
    pub fn draw_shape(
        &self,
        backend: &mut dyn RenderBackend,
        kind: ShapeKind,
        transform: Mat4,
        color: Color,
    ) -> Result<()> {
        let res = self.resources()?;
        let (mesh, count) = match kind {
            ShapeKind::Triangle => res.triangle,
            ShapeKind::Rectangle => res.rectangle,
            ShapeKind::Circle => res.circle,
        };
        backend.bind_program(Some(res.program));
        backend.bind_texture(None);
        backend.bind_mesh(Some(mesh));
        backend.set_uniforms(DrawUniforms::new(transform.to_cols_array_2d(), color));
        backend.draw(count)
    }

    /// Draws a convex polygon given in the shape's local unit space, triangulated as a fan
    /// around the first vertex.
    pub fn draw_polygon(
        &mut self,
        backend: &mut dyn RenderBackend,
        transform: Mat4,
        vertices: &[Position],
        color: Color,
    ) -> Result<()> {
        if vertices.len() < 3 {
            return Err(StduiError::InvalidPolygonInput(vertices.len()));
        }
        let (program, mesh) = {
            let res = self.resources()?;
            (res.program, res.polygon)
        };

        self.scratch.clear();
        let anchor = vertices[0];
        for pair in vertices[1..].windows(2) {
            for p in [anchor, pair[0], pair[1]] {
                self.scratch.push(p.x);
                self.scratch.push(p.y);
            }
        }
        backend.write_mesh(mesh, &self.scratch)?;

        backend.bind_program(Some(program));
        backend.bind_texture(None);
        backend.bind_mesh(Some(mesh));
        backend.set_uniforms(DrawUniforms::new(transform.to_cols_array_2d(), color));
        backend.draw((self.scratch.len() / 2) as u32)
    }

    /// Releases the program and meshes. Calling it again does nothing.
    pub fn cleanup(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(res) = self.resources.take() {
            for mesh in [res.triangle.0, res.rectangle.0, res.circle.0, res.polygon] {
                backend.release(Resource::Mesh(mesh));
            }
            backend.release(Resource::Program(res.program));
            self.scratch = Vec::new();
        }
    }
}

/// Apex at the top (screen Y grows downwards).
fn unit_triangle() -> Vec<f32> {
    vec![0.0, -0.5, -0.5, 0.5, 0.5, 0.5]
}

fn unit_rectangle() -> Vec<f32> {
    vec![
        -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, //
        -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
    ]
}

/// Triangle fan around the centre, expanded to a triangle list.
fn unit_circle(segments: u32) -> Vec<f32> {
    let segments = segments.max(MIN_CIRCLE_SEGMENTS);
    let rim = |i: u32| {
        let angle = TAU * i as f32 / segments as f32;
        (0.5 * angle.cos(), 0.5 * angle.sin())
    };
    let mut vertices = Vec::with_capacity(segments as usize * 6);
    for i in 0..segments {
        let (x0, y0) = rim(i);
        let (x1, y1) = rim(i + 1);
        vertices.extend_from_slice(&[0.0, 0.0, x0, y0, x1, y1]);
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_honours_the_minimum_segment_count() {
        assert_eq!(unit_circle(4).len(), (MIN_CIRCLE_SEGMENTS * 6) as usize);
        assert_eq!(unit_circle(36).len(), 36 * 6);
    }

    #[test]
    fn unit_meshes_stay_inside_half_extent() {
        for mesh in [unit_triangle(), unit_rectangle(), unit_circle(36)] {
            assert!(mesh.iter().all(|v| v.abs() <= 0.5 + 1e-6));
        }
    }
}
