#![allow(dead_code)]

use std::collections::HashMap;
use stdui::backend::RecordingBackend;
use stdui::text::{FontAtlas, FontMetrics, GlyphRecord};
use stdui::{Engine, Size, StduiConfig};

pub const ADVANCE: f32 = 10.0;
pub const FALLBACK_ADVANCE: f32 = 7.0;
pub const LINE_HEIGHT: f32 = 18.0;

/// A tiny hand-made atlas: every printable ASCII letter and digit is an 8x12 box that
/// advances 10px; space advances 10px with no bitmap.
pub fn test_atlas() -> FontAtlas {
    let mut glyphs = HashMap::new();
    for c in ('0'..='9').chain('A'..='Z').chain('a'..='z') {
        glyphs.insert(
            c,
            GlyphRecord {
                s0: 0.0,
                t0: 0.0,
                s1: 0.5,
                t1: 0.75,
                xoff: 1.0,
                yoff: -10.0,
                width: 8.0,
                height: 12.0,
                advance: ADVANCE,
            },
        );
    }
    glyphs.insert(
        ' ',
        GlyphRecord {
            advance: ADVANCE,
            ..GlyphRecord::default()
        },
    );
    let metrics = FontMetrics {
        pixel_height: 16.0,
        ascent: 12.0,
        descent: -4.0,
        line_gap: 2.0,
        fallback_advance: FALLBACK_ADVANCE,
    };
    FontAtlas::from_parts(16, 16, vec![255; 256], glyphs, metrics).unwrap()
}

pub fn test_engine(width: f32, height: f32) -> Engine<RecordingBackend> {
    let backend = RecordingBackend::new(Size::new(width, height));
    Engine::new(backend, test_atlas(), &StduiConfig::default()).unwrap()
}
