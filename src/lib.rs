pub mod app;
pub mod backend;
pub mod colors;
pub mod config;
pub mod error;
pub mod frame;
pub mod image;
pub mod input;
pub mod renderer;
pub mod text;
pub mod transform;
pub mod utils;
#[cfg(feature = "widgets")]
pub mod widgets;

pub use app::Surface;
pub use config::StduiConfig;
pub use error::{Result, StduiError};
pub use input::{CursorState, PollStatus};
pub use utils::{Color, Pose, Position, Rectangle, Size};

use crate::backend::RenderBackend;
use crate::frame::FrameController;
use crate::image::ImageSlot;
use crate::renderer::{RendererContext, ShapeKind};
use crate::text::{FontAtlas, TextContext};
use crate::transform::{pose_matrix, Mat4, TransformStack};
use std::path::Path;

/// Frame-level drawing context: owns the render backend and every renderer built on it.
///
/// Per-draw failures (a bad polygon, an unreadable image, a backend hiccup) are logged and
/// the draw is skipped; they never abort the frame loop.
pub struct Engine<B: RenderBackend = Box<dyn RenderBackend>> {
    backend: B,
    renderer: RendererContext,
    text: TextContext,
    images: ImageSlot,
    frame: FrameController,
    transforms: TransformStack,
    projection: Mat4,
    clear_color: Color,
}

impl<B: RenderBackend> Engine<B> {
    pub fn new(mut backend: B, atlas: FontAtlas, config: &StduiConfig) -> Result<Self> {
        let renderer = RendererContext::initialize(&mut backend, config.circle_segments)?;
        let text = TextContext::init(&mut backend, atlas)?;
        let projection = Mat4::ortho_top_left(backend.viewport());
        log::info!("engine ready on the {} backend", backend.name());
        Ok(Self {
            backend,
            renderer,
            text,
            images: ImageSlot::new(),
            frame: FrameController::new(),
            transforms: TransformStack::new(),
            projection,
            clear_color: config.clear_color,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn viewport(&self) -> Size {
        self.backend.viewport()
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn frame(&self) -> &FrameController {
        &self.frame
    }

    pub fn font(&self) -> &FontAtlas {
        self.text.atlas()
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Starts a frame: syncs the viewport and projection to `viewport`, clears the targets
    /// and resets the local transform stack.
    pub fn begin_frame(&mut self, viewport: Size) {
        if !self.frame.begin() {
            return;
        }
        if viewport != self.backend.viewport() {
            log::debug!("viewport now {}x{}", viewport.width, viewport.height);
            self.backend.resize(viewport);
        }
        self.projection = Mat4::ortho_top_left(viewport);
        self.transforms.reset();
        if let Err(e) = self.backend.begin_frame(self.clear_color) {
            log::error!("begin_frame: {e}");
        }
    }

    /// Presents the frame.
    pub fn end_frame(&mut self) -> Result<()> {
        if !self.frame.end() {
            return Ok(());
        }
        self.backend.end_frame()
    }

    fn model(&self, pose: &Pose) -> Mat4 {
        self.projection * self.transforms.top() * pose_matrix(pose)
    }

    fn draw_shape(&mut self, op: &str, kind: ShapeKind, pose: Pose) {
        if !self.frame.check_draw(op) {
            return;
        }
        let transform = self.model(&pose);
        if let Err(e) = self
            .renderer
            .draw_shape(&mut self.backend, kind, transform, pose.color)
        {
            log::warn!("{op}: {e}");
        }
    }

    pub fn draw_triangle(&mut self, pose: Pose) {
        self.draw_shape("draw_triangle", ShapeKind::Triangle, pose);
    }

    pub fn draw_rectangle(&mut self, pose: Pose) {
        self.draw_shape("draw_rectangle", ShapeKind::Rectangle, pose);
    }

    pub fn draw_circle(&mut self, pose: Pose) {
        self.draw_shape("draw_circle", ShapeKind::Circle, pose);
    }

    /// Draws a convex polygon whose `vertices` are in the pose's unit space: `(-0.5, -0.5)`
    /// is the top-left corner of the pose's box and `(0.5, 0.5)` the bottom-right.
    pub fn draw_polygon(&mut self, pose: Pose, vertices: &[Position]) {
        if !self.frame.check_draw("draw_polygon") {
            return;
        }
        let transform = self.model(&pose);
        if let Err(e) =
            self.renderer
                .draw_polygon(&mut self.backend, transform, vertices, pose.color)
        {
            log::warn!("draw_polygon: {e}");
        }
    }

    /// Draws `text` with the top-left of its first line at `(x, y)` and returns the pen
    /// position after the last character.
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) -> Position {
        let origin = Position::new(x, y);
        if !self.frame.check_draw("draw_text") {
            return origin;
        }
        // the window may have been resized since begin_frame
        let transform = Mat4::ortho_top_left(self.backend.viewport()) * self.transforms.top();
        match self
            .text
            .draw_text(&mut self.backend, transform, text, origin, scale, color)
        {
            Ok(cursor) => cursor,
            Err(e) => {
                log::warn!("draw_text: {e}");
                origin
            }
        }
    }

    pub fn measure_text(&self, text: &str, scale: f32) -> Size {
        self.text.atlas().measure(text, scale)
    }

    /// Draws the image at `path` centred on `(x, y)`; 0 for `width` or `height` keeps the
    /// image's own size. Only one image is kept loaded at a time.
    pub fn draw_image(&mut self, path: impl AsRef<Path>, width: f32, height: f32, x: f32, y: f32) {
        if !self.frame.check_draw("draw_image") {
            return;
        }
        let projection = self.projection * self.transforms.top();
        if let Err(e) = self.images.draw(
            &mut self.backend,
            projection,
            path.as_ref(),
            width,
            height,
            x,
            y,
        ) {
            log::warn!("draw_image: {e}");
        }
    }

    pub fn active_image(&self) -> Option<&Path> {
        self.images.active_path()
    }

    pub fn push_transform(&mut self) {
        self.transforms.push();
    }

    pub fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transforms.translate(x, y);
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.transforms.rotate(degrees);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transforms.scale(x, y);
    }

    /// Releases every GPU resource the engine created. Further draws are skipped.
    pub fn shutdown(&mut self) {
        self.images.release(&mut self.backend);
        self.text.shutdown(&mut self.backend);
        self.renderer.cleanup(&mut self.backend);
    }
}

impl<B: RenderBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
