use crate::error::{Result, StduiError};
use crate::utils::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIN_CIRCLE_SEGMENTS: u32 = 12;
pub const MIN_ATLAS_SIZE: u32 = 64;
/// Largest square atlas; every wgpu adapter supports 2D textures this wide.
pub const MAX_ATLAS_SIZE: u32 = 8192;

/// Which graphics API the GPU backend asks wgpu for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsApi {
    /// Let wgpu pick the best available backend.
    #[default]
    Auto,
    /// OpenGL / GLES only.
    Gl,
    Vulkan,
    Metal,
    Dx12,
}

impl GraphicsApi {
    pub fn backends(self) -> wgpu::Backends {
        match self {
            GraphicsApi::Auto => wgpu::Backends::all(),
            GraphicsApi::Gl => wgpu::Backends::GL,
            GraphicsApi::Vulkan => wgpu::Backends::VULKAN,
            GraphicsApi::Metal => wgpu::Backends::METAL,
            GraphicsApi::Dx12 => wgpu::Backends::DX12,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(GraphicsApi::Auto),
            "gl" | "opengl" | "gles" => Some(GraphicsApi::Gl),
            "vulkan" => Some(GraphicsApi::Vulkan),
            "metal" => Some(GraphicsApi::Metal),
            "dx12" | "d3d12" => Some(GraphicsApi::Dx12),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StduiConfig {
    pub graphics_api: GraphicsApi,
    /// TrueType font baked at window creation. Text rendering is required, so
    /// window creation fails without one.
    pub font_path: Option<PathBuf>,
    pub font_pixel_height: f32,
    /// Side length of the square glyph atlas in pixels.
    pub atlas_size: u32,
    pub circle_segments: u32,
    pub clear_color: Color,
    pub vsync: bool,
    pub verbose: bool,
}

impl Default for StduiConfig {
    fn default() -> Self {
        Self {
            graphics_api: GraphicsApi::Auto,
            font_path: None,
            font_pixel_height: 32.0,
            atlas_size: 512,
            circle_segments: 36,
            clear_color: Color::BLACK,
            vsync: true,
            verbose: false,
        }
    }
}

impl StduiConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StduiError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: StduiConfig =
            serde_json::from_str(raw).map_err(|e| StduiError::Config(e.to_string()))?;
        config.validated()
    }

    /// Defaults with `STDUI_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validated()
    }

    /// Applies `STDUI_GRAPHICS_API`, `STDUI_FONT` and `STDUI_VERBOSE`, read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(api) = lookup("STDUI_GRAPHICS_API") {
            self.graphics_api = GraphicsApi::parse(&api)
                .ok_or_else(|| StduiError::Config(format!("unknown graphics api {api:?}")))?;
        }
        if let Some(font) = lookup("STDUI_FONT") {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(verbose) = lookup("STDUI_VERBOSE") {
            self.verbose = matches!(verbose.trim(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }

    pub fn validated(mut self) -> Result<Self> {
        if self.font_pixel_height.is_nan() || self.font_pixel_height <= 0.0 {
            return Err(StduiError::Config(format!(
                "font_pixel_height must be positive, got {}",
                self.font_pixel_height
            )));
        }
        if !(MIN_ATLAS_SIZE..=MAX_ATLAS_SIZE).contains(&self.atlas_size) {
            return Err(StduiError::Config(format!(
                "atlas_size must be between {MIN_ATLAS_SIZE} and {MAX_ATLAS_SIZE}, got {}",
                self.atlas_size
            )));
        }
        if self.circle_segments < MIN_CIRCLE_SEGMENTS {
            log::warn!(
                "circle_segments {} is too coarse, using {}",
                self.circle_segments,
                MIN_CIRCLE_SEGMENTS
            );
            self.circle_segments = MIN_CIRCLE_SEGMENTS;
        }
        Ok(self)
    }

    /// Default filter for env_logger; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose || cfg!(feature = "verbose") {
            "debug"
        } else {
            "warn"
        }
    }
}
