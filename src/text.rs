use crate::backend::{
    BindingGuard, MeshId, MeshUsage, ProgramId, ProgramKind, RenderBackend, Resource,
    TextureDesc, TextureFormat, TextureId, VertexLayout,
};
use crate::config::MAX_ATLAS_SIZE;
use crate::error::{Result, StduiError};
use crate::transform::Mat4;
use crate::utils::{Color, DrawUniforms, Position, Size};
use rusttype::{point, Font, GlyphId, Scale};
use std::collections::HashMap;
use std::path::Path;

/// First and last character baked into the atlas.
pub const FIRST_CHAR: char = ' ';
pub const LAST_CHAR: char = '~';

const QUAD_FLOATS: usize = 6 * 4;

/// Where one baked glyph lives in the atlas and how it sits on the baseline.
///
/// Offsets are in baked pixels relative to the pen position on the baseline, Y down, so
/// `yoff` is negative for glyphs that rise above the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphRecord {
    pub s0: f32,
    pub t0: f32,
    pub s1: f32,
    pub t1: f32,
    pub xoff: f32,
    pub yoff: f32,
    pub width: f32,
    pub height: f32,
    pub advance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FontMetrics {
    pub pixel_height: f32,
    pub ascent: f32,
    /// Negative, below the baseline.
    pub descent: f32,
    pub line_gap: f32,
    /// Advance used for characters that were not baked.
    pub fallback_advance: f32,
}

impl FontMetrics {
    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent + self.line_gap
    }
}

/// A screen-space glyph quad ready to be written into the quad mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphQuad {
    pub ch: char,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s0: f32,
    pub t0: f32,
    pub s1: f32,
    pub t1: f32,
}

impl GlyphQuad {
    /// Two triangles, `x, y, u, v` per vertex.
    pub fn vertices(&self) -> [f32; QUAD_FLOATS] {
        let Self {
            x0,
            y0,
            x1,
            y1,
            s0,
            t0,
            s1,
            t1,
            ..
        } = *self;
        [
            x0, y0, s0, t0, x1, y0, s1, t0, x1, y1, s1, t1, //
            x0, y0, s0, t0, x1, y1, s1, t1, x0, y1, s0, t1,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLayout {
    pub quads: Vec<GlyphQuad>,
    /// Pen position after the last character: x on the current line, y at the line's top.
    pub cursor: Position,
    pub lines: usize,
    /// Widest line, in screen pixels.
    pub width: f32,
}

/// Glyph bitmaps for ASCII 32..=126 baked into one single-channel texture.
#[derive(Debug, Clone)]
pub struct FontAtlas {
    width: u32,
    height: u32,
    bitmap: Vec<u8>,
    glyphs: HashMap<char, GlyphRecord>,
    metrics: FontMetrics,
}

impl FontAtlas {
    pub fn from_file(path: impl AsRef<Path>, pixel_height: f32, atlas_size: u32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| StduiError::FontLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::bake(bytes, pixel_height, atlas_size).map_err(|e| match e {
            StduiError::FontLoadFailed { reason, .. } => StduiError::FontLoadFailed {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Rasterises the printable ASCII range into a square `atlas_size` bitmap.
    pub fn bake(bytes: Vec<u8>, pixel_height: f32, atlas_size: u32) -> Result<Self> {
        if atlas_size == 0 || atlas_size > MAX_ATLAS_SIZE {
            return Err(StduiError::Config(format!(
                "atlas_size must be between 1 and {MAX_ATLAS_SIZE}, got {atlas_size}"
            )));
        }
        let len = bitmap_len(atlas_size, atlas_size).ok_or_else(|| {
            StduiError::Config(format!("{atlas_size}x{atlas_size} atlas is too large"))
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| StduiError::FontLoadFailed {
            path: Default::default(),
            reason: "not a TrueType font".into(),
        })?;
        let scale = Scale::uniform(pixel_height);
        let v = font.v_metrics(scale);

        let glyphs: Vec<_> = (FIRST_CHAR..=LAST_CHAR)
            .map(|c| {
                let scaled = font.glyph(c).scaled(scale);
                let advance = scaled.h_metrics().advance_width;
                (c, advance, scaled.positioned(point(0.0, 0.0)))
            })
            .collect();

        let sizes: Vec<(char, u32, u32)> = glyphs
            .iter()
            .map(|(c, _, g)| match g.pixel_bounding_box() {
                Some(bb) => (*c, bb.width() as u32, bb.height() as u32),
                None => (*c, 0, 0),
            })
            .collect();
        let slots = pack_rows(&sizes, atlas_size, atlas_size)?;

        let mut bitmap = vec![0u8; len];
        let stride = atlas_size as usize;
        let mut records = HashMap::with_capacity(glyphs.len());
        let extent = atlas_size as f32;
        for ((c, advance, glyph), (&(_, w, h), &(x, y))) in
            glyphs.iter().zip(sizes.iter().zip(slots.iter()))
        {
            let (xoff, yoff) = match glyph.pixel_bounding_box() {
                Some(bb) => (bb.min.x as f32, bb.min.y as f32),
                None => (0.0, 0.0),
            };
            glyph.draw(|gx, gy, coverage| {
                let px = x + gx;
                let py = y + gy;
                if px < atlas_size && py < atlas_size {
                    bitmap[py as usize * stride + px as usize] = (coverage * 255.0).round() as u8;
                }
            });
            records.insert(
                *c,
                GlyphRecord {
                    s0: x as f32 / extent,
                    t0: y as f32 / extent,
                    s1: (x + w) as f32 / extent,
                    t1: (y + h) as f32 / extent,
                    xoff,
                    yoff,
                    width: w as f32,
                    height: h as f32,
                    advance: *advance,
                },
            );
        }

        let fallback_advance = font
            .glyph(GlyphId(0))
            .scaled(scale)
            .h_metrics()
            .advance_width;
        log::debug!(
            "baked {} glyphs at {}px into a {atlas_size}x{atlas_size} atlas",
            records.len(),
            pixel_height
        );

        Ok(Self {
            width: atlas_size,
            height: atlas_size,
            bitmap,
            glyphs: records,
            metrics: FontMetrics {
                pixel_height,
                ascent: v.ascent,
                descent: v.descent,
                line_gap: v.line_gap,
                fallback_advance,
            },
        })
    }

    /// Builds an atlas from an already baked bitmap.
    pub fn from_parts(
        width: u32,
        height: u32,
        bitmap: Vec<u8>,
        glyphs: HashMap<char, GlyphRecord>,
        metrics: FontMetrics,
    ) -> Result<Self> {
        if width == 0 || height == 0 || bitmap_len(width, height) != Some(bitmap.len()) {
            return Err(StduiError::Render(format!(
                "atlas bitmap of {} bytes does not match {width}x{height}",
                bitmap.len()
            )));
        }
        Ok(Self {
            width,
            height,
            bitmap,
            glyphs,
            metrics,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphRecord> {
        self.glyphs.get(&c)
    }

    /// Lays out `text` with the top-left of its first line at `origin`.
    pub fn layout(&self, text: &str, origin: Position, scale: f32) -> TextLayout {
        let m = &self.metrics;
        let line_height = m.line_height() * scale;
        let mut quads = Vec::with_capacity(text.len());
        let mut pen_x = origin.x;
        let mut line_top = origin.y;
        let mut lines = 1;
        let mut width: f32 = 0.0;

        for c in text.chars() {
            match c {
                '\n' => {
                    width = width.max(pen_x - origin.x);
                    pen_x = origin.x;
                    line_top += line_height;
                    lines += 1;
                }
                '\r' => {}
                _ => match self.glyphs.get(&c) {
                    Some(g) => {
                        if g.width > 0.0 && g.height > 0.0 {
                            let baseline = line_top + m.ascent * scale;
                            let x0 = pen_x + g.xoff * scale;
                            let y0 = baseline + g.yoff * scale;
                            quads.push(GlyphQuad {
                                ch: c,
                                x0,
                                y0,
                                x1: x0 + g.width * scale,
                                y1: y0 + g.height * scale,
                                s0: g.s0,
                                t0: g.t0,
                                s1: g.s1,
                                t1: g.t1,
                            });
                        }
                        pen_x += g.advance * scale;
                    }
                    None => pen_x += m.fallback_advance * scale,
                },
            }
        }
        width = width.max(pen_x - origin.x);

        TextLayout {
            quads,
            cursor: Position::new(pen_x, line_top),
            lines,
            width,
        }
    }

    pub fn measure(&self, text: &str, scale: f32) -> Size {
        let layout = self.layout(text, Position::default(), scale);
        Size::new(
            layout.width,
            layout.lines as f32 * self.metrics.line_height() * scale,
        )
    }
}

/// Row packer in the style of stb_truetype's simple baker: one-pixel border, glyphs placed
/// left to right and wrapped onto a new row below the tallest glyph of the previous one.
pub fn pack_rows(sizes: &[(char, u32, u32)], width: u32, height: u32) -> Result<Vec<(u32, u32)>> {
    let mut x = 1;
    let mut y = 1;
    let mut bottom = 1;
    let mut slots = Vec::with_capacity(sizes.len());
    for &(c, w, h) in sizes {
        if x + w + 1 >= width {
            y = bottom;
            x = 1;
        }
        if y + h + 1 >= height || x + w + 1 >= width {
            return Err(StduiError::FontBakeOverflow {
                glyph: c,
                width,
                height,
            });
        }
        slots.push((x, y));
        x += w + 1;
        bottom = bottom.max(y + h + 1);
    }
    Ok(slots)
}

struct TextResources {
    program: ProgramId,
    texture: TextureId,
    quad: MeshId,
}

/// The baked font plus the GPU resources needed to draw it.
pub struct TextContext {
    atlas: FontAtlas,
    resources: Option<TextResources>,
}

impl TextContext {
    pub fn init(backend: &mut dyn RenderBackend, atlas: FontAtlas) -> Result<Self> {
        let (width, height) = atlas.size();
        let texture = backend.create_texture(
            &TextureDesc {
                label: "font atlas",
                width,
                height,
                format: TextureFormat::R8,
            },
            atlas.bitmap(),
        )?;
        let program = backend.create_program(ProgramKind::Text)?;
        let quad = backend.create_mesh(
            VertexLayout::Position2Uv2,
            MeshUsage::Dynamic,
            &[0.0; QUAD_FLOATS],
        )?;
        Ok(Self {
            atlas,
            resources: Some(TextResources {
                program,
                texture,
                quad,
            }),
        })
    }

    pub fn atlas(&self) -> &FontAtlas {
        &self.atlas
    }

    /// Draws `text` one glyph quad at a time and returns the pen position afterwards.
    ///
    /// The bindings in place before the call are restored on return, error or not.
    pub fn draw_text(
        &self,
        backend: &mut dyn RenderBackend,
        transform: Mat4,
        text: &str,
        origin: Position,
        scale: f32,
        color: Color,
    ) -> Result<Position> {
        let res = self
            .resources
            .as_ref()
            .ok_or_else(|| StduiError::Render("text renderer used after shutdown".into()))?;
        let layout = self.atlas.layout(text, origin, scale);

        let mut backend = BindingGuard::new(backend);
        backend.bind_program(Some(res.program));
        backend.bind_texture(Some(res.texture));
        backend.bind_mesh(Some(res.quad));
        backend.set_uniforms(DrawUniforms::new(transform.to_cols_array_2d(), color));
        for quad in &layout.quads {
            backend.write_mesh(res.quad, &quad.vertices())?;
            backend.draw(6)?;
        }
        Ok(layout.cursor)
    }

    pub fn shutdown(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(res) = self.resources.take() {
            backend.release(Resource::Mesh(res.quad));
            backend.release(Resource::Texture(res.texture));
            backend.release(Resource::Program(res.program));
        }
    }
}

fn bitmap_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_atlas_fails_before_allocating() {
        let err = FontAtlas::bake(vec![0, 1, 2, 3], 32.0, 70_000).unwrap_err();
        assert!(matches!(err, StduiError::Config(_)));
    }

    #[test]
    fn mismatched_bitmap_is_rejected() {
        let metrics = FontMetrics::default();
        let err = FontAtlas::from_parts(70_000, 70_000, vec![0; 16], HashMap::new(), metrics)
            .unwrap_err();
        assert!(matches!(err, StduiError::Render(_)));
        assert!(FontAtlas::from_parts(4, 4, vec![0; 16], HashMap::new(), metrics).is_ok());
    }

    #[test]
    fn packer_wraps_rows_below_the_tallest_glyph() {
        let sizes = [('a', 10, 12), ('b', 12, 20), ('c', 5, 5)];
        let slots = pack_rows(&sizes, 24, 64).unwrap();
        assert_eq!(slots[0], (1, 1));
        assert_eq!(slots[1], (1, 14));
        assert_eq!(slots[2], (14, 14));
    }

    #[test]
    fn packer_reports_the_glyph_that_overflowed() {
        let sizes: Vec<_> = (FIRST_CHAR..=LAST_CHAR).map(|c| (c, 30, 30)).collect();
        match pack_rows(&sizes, 64, 64) {
            Err(StduiError::FontBakeOverflow { glyph, .. }) => assert_eq!(glyph, '$'),
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_not_a_font() {
        let err = FontAtlas::bake(vec![0, 1, 2, 3], 32.0, 128).unwrap_err();
        assert!(matches!(err, StduiError::FontLoadFailed { .. }));
    }

    #[test]
    fn missing_font_file_names_the_path() {
        let err = FontAtlas::from_file("/definitely/not/here.ttf", 32.0, 128).unwrap_err();
        match err {
            StduiError::FontLoadFailed { path, .. } => {
                assert!(path.ends_with("here.ttf"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
