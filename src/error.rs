use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StduiError {
    #[error("cannot connect to the windowing system: {0}")]
    DisplayUnavailable(String),

    #[error("window creation failed: {0}")]
    WindowCreationFailed(String),

    #[error("cannot load font {path}: {reason}")]
    FontLoadFailed { path: PathBuf, reason: String },

    #[error("glyph {glyph:?} does not fit in the {width}x{height} font atlas")]
    FontBakeOverflow { glyph: char, width: u32, height: u32 },

    #[error("cannot load image {path}: {reason}")]
    ImageLoadFailed { path: PathBuf, reason: String },

    #[error("polygon needs at least 3 vertices, got {0}")]
    InvalidPolygonInput(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("render backend error: {0}")]
    Render(String),

    #[error("unknown or released {0} handle")]
    UnknownResource(&'static str),
}

pub type Result<T, E = StduiError> = std::result::Result<T, E>;
