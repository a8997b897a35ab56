mod common;

use common::{test_atlas, ADVANCE, FALLBACK_ADVANCE, LINE_HEIGHT};
use stdui::Position;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn two_glyphs_advance_twice() {
    let atlas = test_atlas();
    let layout = atlas.layout("AB", Position::new(5.0, 7.0), 1.0);
    assert!(approx(layout.cursor.x, 5.0 + 2.0 * ADVANCE));
    assert!(approx(layout.cursor.y, 7.0));
    assert_eq!(layout.lines, 1);
    assert_eq!(layout.quads.len(), 2);
}

#[test]
fn glyph_quads_hang_from_the_baseline() {
    let atlas = test_atlas();
    let q = atlas.layout("A", Position::new(0.0, 0.0), 1.0).quads[0];
    // baseline at the ascent (12), glyph top 10px above it
    assert_eq!((q.x0, q.y0, q.x1, q.y1), (1.0, 2.0, 9.0, 14.0));
    assert_eq!((q.s0, q.t0, q.s1, q.t1), (0.0, 0.0, 0.5, 0.75));

    let q = atlas.layout("A", Position::new(0.0, 0.0), 2.0).quads[0];
    assert_eq!((q.x0, q.y0, q.x1, q.y1), (2.0, 4.0, 18.0, 28.0));
}

#[test]
fn total_advance_is_the_sum_of_glyph_advances() {
    let atlas = test_atlas();
    let printable: Vec<char> = (' '..='~').collect();
    // deterministic spread of lengths and contents over the printable range
    for n in 0..40usize {
        let text: String = (0..n)
            .map(|i| printable[(i * 7 + n * 13) % printable.len()])
            .collect();
        let expected: f32 = text
            .chars()
            .map(|c| atlas.glyph(c).map_or(FALLBACK_ADVANCE, |g| g.advance))
            .sum();
        let layout = atlas.layout(&text, Position::new(3.0, 0.0), 1.0);
        assert!(
            approx(layout.cursor.x - 3.0, expected),
            "{text:?}: {} vs {expected}",
            layout.cursor.x - 3.0
        );
    }
}

#[test]
fn newline_resets_x_and_adds_one_line() {
    let atlas = test_atlas();
    for (text, x, lines) in [
        ("ab\ncd", 2.0 * ADVANCE, 2),
        ("abc\n", 0.0, 2),
        ("\nx", ADVANCE, 2),
        ("a b\n!", FALLBACK_ADVANCE, 2),
    ] {
        let layout = atlas.layout(text, Position::new(10.0, 20.0), 1.0);
        assert!(approx(layout.cursor.x, 10.0 + x), "{text:?}");
        assert!(approx(layout.cursor.y, 20.0 + LINE_HEIGHT), "{text:?}");
        assert_eq!(layout.lines, lines);
    }

    let layout = atlas.layout("\n\n", Position::new(0.0, 0.0), 0.5);
    assert!(approx(layout.cursor.y, LINE_HEIGHT));
    assert_eq!(layout.lines, 3);
}

#[test]
fn carriage_return_is_ignored() {
    let atlas = test_atlas();
    let with_cr = atlas.layout("a\r\nb", Position::default(), 1.0);
    let without = atlas.layout("a\nb", Position::default(), 1.0);
    assert_eq!(with_cr, without);
}

#[test]
fn unbaked_characters_skip_but_keep_spacing() {
    let atlas = test_atlas();
    let layout = atlas.layout("a~é b", Position::default(), 1.0);
    // '~' and 'é' draw nothing, space has no bitmap
    assert_eq!(layout.quads.len(), 2);
    assert!(approx(layout.cursor.x, 3.0 * ADVANCE + 2.0 * FALLBACK_ADVANCE));
    assert!(approx(layout.quads[1].x0, 3.0 * ADVANCE + 2.0 * FALLBACK_ADVANCE - ADVANCE + 1.0));
}

#[test]
fn measure_reports_widest_line_and_total_height() {
    let atlas = test_atlas();
    let size = atlas.measure("ab\nabc", 1.0);
    assert!(approx(size.width, 3.0 * ADVANCE));
    assert!(approx(size.height, 2.0 * LINE_HEIGHT));

    let empty = atlas.measure("", 2.0);
    assert_eq!(empty.width, 0.0);
    assert!(approx(empty.height, 2.0 * LINE_HEIGHT));
}

#[test]
fn quad_vertices_form_two_triangles() {
    let atlas = test_atlas();
    let q = atlas.layout("A", Position::default(), 1.0).quads[0];
    let v = q.vertices();
    assert_eq!(v.len(), 24);
    assert_eq!(&v[0..4], &[q.x0, q.y0, q.s0, q.t0]);
    assert_eq!(&v[8..12], &[q.x1, q.y1, q.s1, q.t1]);
    assert_eq!(&v[20..24], &[q.x0, q.y1, q.s0, q.t1]);
}
