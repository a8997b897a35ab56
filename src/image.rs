use crate::backend::RenderBackend;
use crate::error::Result;
use crate::transform::Mat4;
use std::path::Path;

#[cfg(feature = "image-support")]
use crate::backend::{
    BindingGuard, MeshId, MeshUsage, ProgramId, ProgramKind, Resource, TextureDesc,
    TextureFormat, TextureId, VertexLayout,
};
#[cfg(feature = "image-support")]
use std::path::PathBuf;
#[cfg(feature = "image-support")]
use crate::error::StduiError;
#[cfg(feature = "image-support")]
use crate::utils::{Color, DrawUniforms};

#[cfg(feature = "image-support")]
const UNIT_QUAD: [f32; 24] = [
    -0.5, -0.5, 0.0, 0.0, 0.5, -0.5, 1.0, 0.0, 0.5, 0.5, 1.0, 1.0, //
    -0.5, -0.5, 0.0, 0.0, 0.5, 0.5, 1.0, 1.0, -0.5, 0.5, 0.0, 1.0,
];

#[cfg(feature = "image-support")]
struct ActiveImage {
    path: PathBuf,
    texture: TextureId,
    width: u32,
    height: u32,
}

/// The single "active image" slot. Drawing a different file replaces the previous image.
#[derive(Default)]
pub struct ImageSlot {
    #[cfg(feature = "image-support")]
    pipeline: Option<(ProgramId, MeshId)>,
    #[cfg(feature = "image-support")]
    active: Option<ActiveImage>,
    #[cfg(not(feature = "image-support"))]
    warned: bool,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the image currently held by the slot.
    pub fn active_path(&self) -> Option<&Path> {
        #[cfg(feature = "image-support")]
        {
            self.active.as_ref().map(|a| a.path.as_path())
        }
        #[cfg(not(feature = "image-support"))]
        {
            None
        }
    }

    /// Draws the image at `path` centred on `(x, y)`. A `width` or `height` of 0 uses the
    /// image's own size on that axis.
    #[cfg(feature = "image-support")]
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        projection: Mat4,
        path: &Path,
        width: f32,
        height: f32,
        x: f32,
        y: f32,
    ) -> Result<()> {
        let (program, quad) = match self.pipeline {
            Some(pipeline) => pipeline,
            None => {
                let program = backend.create_program(ProgramKind::Image)?;
                let quad =
                    backend.create_mesh(VertexLayout::Position2Uv2, MeshUsage::Static, &UNIT_QUAD)?;
                self.pipeline = Some((program, quad));
                (program, quad)
            }
        };

        if self.active.as_ref().map(|a| a.path.as_path()) != Some(path) {
            let decoded = ::image::open(path)
                .map_err(|e| StduiError::ImageLoadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .to_rgba8();
            let (w, h) = decoded.dimensions();
            let texture = backend
                .create_texture(
                    &TextureDesc {
                        label: "image",
                        width: w,
                        height: h,
                        format: TextureFormat::Rgba8,
                    },
                    decoded.as_raw(),
                )
                .map_err(|e| StduiError::ImageLoadFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;

            if let Some(previous) = self.active.take() {
                log::debug!("releasing image {}", previous.path.display());
                backend.release(Resource::Texture(previous.texture));
            }
            log::debug!("loaded image {} ({w}x{h})", path.display());
            self.active = Some(ActiveImage {
                path: path.to_path_buf(),
                texture,
                width: w,
                height: h,
            });
        }

        let Some(active) = self.active.as_ref() else {
            return Ok(());
        };
        let width = if width > 0.0 { width } else { active.width as f32 };
        let height = if height > 0.0 { height } else { active.height as f32 };
        let transform = projection * Mat4::translation(x, y) * Mat4::scale(width, height);

        let mut backend = BindingGuard::new(backend);
        backend.bind_program(Some(program));
        backend.bind_texture(Some(active.texture));
        backend.bind_mesh(Some(quad));
        backend.set_uniforms(DrawUniforms::new(
            transform.to_cols_array_2d(),
            Color::WHITE,
        ));
        backend.draw(6)
    }

    #[cfg(not(feature = "image-support"))]
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        _backend: &mut dyn RenderBackend,
        _projection: Mat4,
        path: &Path,
        _width: f32,
        _height: f32,
        _x: f32,
        _y: f32,
    ) -> Result<()> {
        if !self.warned {
            self.warned = true;
            log::warn!(
                "image support is compiled out, not drawing {}",
                path.display()
            );
        }
        Ok(())
    }

    /// Frees the active image and the quad pipeline.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        #[cfg(feature = "image-support")]
        {
            if let Some(active) = self.active.take() {
                backend.release(Resource::Texture(active.texture));
            }
            if let Some((program, quad)) = self.pipeline.take() {
                backend.release(Resource::Mesh(quad));
                backend.release(Resource::Program(program));
            }
        }
        #[cfg(not(feature = "image-support"))]
        {
            let _ = backend;
        }
    }
}

#[cfg(all(test, feature = "image-support"))]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use crate::utils::Size;

    #[test]
    fn missing_file_leaves_slot_empty() {
        let mut backend = RecordingBackend::new(Size::new(100.0, 100.0));
        backend.begin_frame(Color::BLACK).unwrap();
        let mut slot = ImageSlot::new();
        let err = slot
            .draw(
                &mut backend,
                Mat4::IDENTITY,
                Path::new("/no/such/image.png"),
                10.0,
                10.0,
                0.0,
                0.0,
            )
            .unwrap_err();
        assert!(matches!(err, StduiError::ImageLoadFailed { .. }));
        assert!(slot.active_path().is_none());
        assert_eq!(backend.draw_count(), 0);
    }
}
