mod common;

use common::{test_atlas, test_engine, ADVANCE, FALLBACK_ADVANCE};
use stdui::backend::{ProgramKind, RecordingBackend, RenderBackend, Resource, TextureFormat};
use stdui::transform::Mat4;
use stdui::{Color, Engine, Pose, Position, Size, StduiConfig};

fn approx(a: Position, b: Position) -> bool {
    (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
}

fn clip(viewport: Size, x: f32, y: f32) -> Position {
    Position::new(x / viewport.width * 2.0 - 1.0, 1.0 - y / viewport.height * 2.0)
}

#[test]
fn rectangle_lands_where_the_pose_says() {
    let viewport = Size::new(400.0, 300.0);
    let mut engine = test_engine(viewport.width, viewport.height);
    engine.begin_frame(viewport);
    engine.draw_rectangle(Pose::new(200.0, 150.0, 40.0, 40.0, Color::RED));
    engine.end_frame().unwrap();

    let draws = engine.backend().draws();
    assert_eq!(draws.len(), 1);
    let draw = &draws[0];
    assert_eq!(draw.program, ProgramKind::Shape);
    assert_eq!(draw.vertex_count, 6);
    assert_eq!(draw.uniforms.color, Color::RED.to_array());

    let m = Mat4 {
        cols: draw.uniforms.transform,
    };
    assert!(approx(
        m.transform_point(Position::new(-0.5, -0.5)),
        clip(viewport, 180.0, 130.0)
    ));
    assert!(approx(
        m.transform_point(Position::new(0.5, 0.5)),
        clip(viewport, 220.0, 170.0)
    ));
}

#[test]
fn same_pose_twice_gives_identical_draws() {
    let mut engine = test_engine(640.0, 480.0);
    let pose = Pose::new(123.5, 77.25, 31.0, 12.0, Color::TEAL).rotated(33.0);
    engine.begin_frame(Size::new(640.0, 480.0));
    engine.draw_rectangle(pose);
    engine.draw_rectangle(pose);
    engine.end_frame().unwrap();

    let draws = engine.backend().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].uniforms, draws[1].uniforms);
    assert_eq!(draws[0].vertices, draws[1].vertices);
}

#[test]
fn circle_uses_the_configured_segment_count() {
    let mut engine = test_engine(100.0, 100.0);
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_circle(Pose::new(50.0, 50.0, 20.0, 20.0, Color::BLUE));
    engine.draw_triangle(Pose::new(50.0, 50.0, 20.0, 20.0, Color::BLUE));
    engine.end_frame().unwrap();

    let draws = engine.backend().draws();
    assert_eq!(draws[0].vertex_count, 36 * 3);
    assert_eq!(draws[1].vertex_count, 3);
}

#[test]
fn short_polygons_never_reach_the_backend() {
    let mut engine = test_engine(100.0, 100.0);
    let pose = Pose::new(50.0, 50.0, 20.0, 20.0, Color::GREEN);
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_polygon(pose, &[]);
    engine.draw_polygon(pose, &[Position::new(0.0, 0.0), Position::new(0.5, 0.5)]);
    engine.end_frame().unwrap();
    assert_eq!(engine.backend().draw_count(), 0);
}

#[test]
fn polygon_is_fanned_around_the_first_vertex() {
    let mut engine = test_engine(100.0, 100.0);
    let square = [
        Position::new(-0.5, -0.5),
        Position::new(0.5, -0.5),
        Position::new(0.5, 0.5),
        Position::new(-0.5, 0.5),
    ];
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_polygon(Pose::new(50.0, 50.0, 20.0, 20.0, Color::GREEN), &square);
    engine.draw_polygon(Pose::new(50.0, 50.0, 20.0, 20.0, Color::GREEN), &square[..3]);
    engine.end_frame().unwrap();

    let draws = engine.backend().draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].vertex_count, 6);
    assert_eq!(
        draws[0].vertices,
        vec![-0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5]
    );
    // the scratch mesh is rewritten, not appended to
    assert_eq!(draws[1].vertex_count, 3);
    assert_eq!(draws[1].vertices.len(), 6);
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "outside begin_frame/end_frame"))]
fn drawing_before_begin_frame_is_caught() {
    let mut engine = test_engine(100.0, 100.0);
    engine.draw_rectangle(Pose::new(10.0, 10.0, 5.0, 5.0, Color::RED));
    assert_eq!(engine.backend().draw_count(), 0);
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "outside begin_frame/end_frame"))]
fn drawing_after_end_frame_is_caught() {
    let mut engine = test_engine(100.0, 100.0);
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.end_frame().unwrap();
    engine.draw_text("late", 0.0, 0.0, 1.0, Color::WHITE);
    assert_eq!(engine.backend().draw_count(), 0);
}

#[test]
fn frames_clear_with_the_configured_color_and_present_once() {
    let mut engine = test_engine(100.0, 100.0);
    engine.set_clear_color(Color::NAVY);
    for _ in 0..3 {
        engine.begin_frame(Size::new(100.0, 100.0));
        engine.end_frame().unwrap();
    }
    assert_eq!(engine.backend().frames_begun(), 3);
    assert_eq!(engine.backend().frames_presented(), 3);
    assert_eq!(engine.backend().clear_color(), Some(Color::NAVY));
    assert_eq!(engine.frame().frames_presented(), 3);
}

#[test]
fn begin_frame_follows_the_window_size() {
    let mut engine = test_engine(100.0, 100.0);
    engine.begin_frame(Size::new(300.0, 200.0));
    assert_eq!(engine.viewport(), Size::new(300.0, 200.0));
    assert_eq!(engine.projection(), Mat4::ortho_top_left(Size::new(300.0, 200.0)));
    engine.end_frame().unwrap();
}

#[test]
fn text_draws_one_quad_per_visible_glyph_and_restores_bindings() {
    let mut engine = test_engine(200.0, 100.0);
    engine.begin_frame(Size::new(200.0, 100.0));
    engine.draw_rectangle(Pose::new(10.0, 10.0, 5.0, 5.0, Color::RED));
    let before = engine.backend().bindings();

    let cursor = engine.draw_text("Hi ~x", 4.0, 6.0, 1.0, Color::WHITE);
    let after = engine.backend().bindings();
    engine.end_frame().unwrap();

    assert_eq!(before, after);
    assert!((cursor.x - (4.0 + 4.0 * ADVANCE + FALLBACK_ADVANCE)).abs() < 1e-4);

    let text_draws: Vec<_> = engine
        .backend()
        .draws()
        .iter()
        .filter(|d| d.program == ProgramKind::Text)
        .collect();
    assert_eq!(text_draws.len(), 3);
    assert!(text_draws.iter().all(|d| d.vertex_count == 6));
    // each glyph got its own quad content
    assert_ne!(text_draws[0].vertices, text_draws[1].vertices);

    // one shared quad mesh, rewritten once per visible glyph
    let quad = text_draws[0].bindings.mesh.unwrap();
    assert!(text_draws.iter().all(|d| d.bindings.mesh == Some(quad)));
    assert_eq!(engine.backend().mesh_writes(quad), 3);

    let atlas = text_draws[0].bindings.texture.unwrap();
    let desc = engine.backend().texture_desc(atlas).unwrap();
    assert_eq!((desc.width, desc.height), (16, 16));
    assert_eq!(desc.format, TextureFormat::R8);
}

#[test]
fn text_projection_tracks_the_current_viewport() {
    let mut engine = test_engine(200.0, 100.0);
    engine.begin_frame(Size::new(200.0, 100.0));
    engine.backend_mut().resize(Size::new(800.0, 600.0));
    engine.draw_text("A", 0.0, 0.0, 1.0, Color::WHITE);
    engine.end_frame().unwrap();

    let draw = &engine.backend().draws()[0];
    assert!((draw.uniforms.transform[0][0] - 2.0 / 800.0).abs() < 1e-6);
    assert!((draw.uniforms.transform[1][1] + 2.0 / 600.0).abs() < 1e-6);
}

#[test]
fn transform_stack_applies_and_resets_each_frame() {
    let mut engine = test_engine(100.0, 100.0);
    let pose = Pose::new(0.0, 0.0, 1.0, 1.0, Color::WHITE);

    engine.begin_frame(Size::new(100.0, 100.0));
    engine.push_transform();
    engine.translate(50.0, 50.0);
    engine.draw_rectangle(pose);
    engine.pop_transform();
    engine.draw_rectangle(pose);
    engine.translate(25.0, 0.0);
    engine.end_frame().unwrap();

    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_rectangle(pose);
    engine.end_frame().unwrap();

    let centre = |i: usize| {
        Mat4 {
            cols: engine.backend().draws()[i].uniforms.transform,
        }
        .transform_point(Position::default())
    };
    assert!(approx(centre(0), Position::new(0.0, 0.0)));
    assert!(approx(centre(1), Position::new(-1.0, 1.0)));
    assert!(approx(centre(2), Position::new(-1.0, 1.0)));
}

#[test]
fn missing_image_is_logged_and_skipped() {
    let mut engine = test_engine(100.0, 100.0);
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_image("/this/file/does/not/exist.png", 10.0, 10.0, 50.0, 50.0);
    engine.draw_rectangle(Pose::new(10.0, 10.0, 5.0, 5.0, Color::RED));
    engine.end_frame().unwrap();

    assert_eq!(engine.backend().draw_count(), 1);
    assert!(engine.active_image().is_none());
}

#[cfg(feature = "image-support")]
#[test]
fn new_image_replaces_the_previous_one() {
    let dir = std::env::temp_dir().join(format!("stdui-image-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let wide = dir.join("wide.png");
    let square = dir.join("square.png");
    image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]))
        .save(&wide)
        .unwrap();
    image::RgbImage::from_pixel(3, 3, image::Rgb([0, 0, 255]))
        .save(&square)
        .unwrap();

    let viewport = Size::new(100.0, 100.0);
    let mut engine = test_engine(viewport.width, viewport.height);
    let atlas_only = engine.backend().live_textures();

    engine.begin_frame(viewport);
    engine.draw_image(&wide, 0.0, 0.0, 50.0, 40.0);
    assert_eq!(engine.backend().live_textures(), atlas_only + 1);

    engine.draw_image(&square, 30.0, 30.0, 50.0, 50.0);
    assert_eq!(engine.backend().live_textures(), atlas_only + 1);
    let released = engine.backend().released().len();
    assert!(matches!(
        engine.backend().released().last(),
        Some(Resource::Texture(_))
    ));

    // same file again reuses the texture
    engine.draw_image(&square, 30.0, 30.0, 60.0, 60.0);
    assert_eq!(engine.backend().released().len(), released);
    engine.end_frame().unwrap();

    assert_eq!(engine.active_image(), Some(square.as_path()));
    let draws = engine.backend().draws();
    assert_eq!(draws.len(), 3);
    assert!(draws.iter().all(|d| d.program == ProgramKind::Image));

    // a zero extent falls back to the natural 4x2 size, centred on (50, 40)
    let first = Mat4 {
        cols: draws[0].uniforms.transform,
    };
    assert!(approx(
        first.transform_point(Position::new(0.5, 0.5)),
        clip(viewport, 52.0, 41.0)
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[cfg(feature = "image-support")]
#[test]
fn image_too_large_for_the_device_is_skipped() {
    let dir = std::env::temp_dir().join(format!("stdui-limit-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let small = dir.join("small.png");
    let wide = dir.join("wide.png");
    image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 255, 0, 255]))
        .save(&small)
        .unwrap();
    image::RgbaImage::from_pixel(100, 2, image::Rgba([255, 0, 0, 255]))
        .save(&wide)
        .unwrap();

    let backend = RecordingBackend::new(Size::new(100.0, 100.0)).with_max_texture_dimension(64);
    let mut engine = Engine::new(backend, test_atlas(), &StduiConfig::default()).unwrap();
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_image(&small, 0.0, 0.0, 50.0, 50.0);
    engine.draw_image(&wide, 0.0, 0.0, 50.0, 50.0);
    engine.end_frame().unwrap();

    // the refused upload leaves the previous image in place
    assert_eq!(engine.active_image(), Some(small.as_path()));
    assert_eq!(engine.backend().draw_count(), 1);
    assert_eq!(engine.backend().live_textures(), 2);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn shutdown_releases_everything_once() {
    let mut engine = test_engine(100.0, 100.0);
    assert_eq!(engine.backend().live_programs(), 2);
    assert_eq!(engine.backend().live_meshes(), 5);
    assert_eq!(engine.backend().live_textures(), 1);

    engine.shutdown();
    assert_eq!(engine.backend().live_programs(), 0);
    assert_eq!(engine.backend().live_meshes(), 0);
    assert_eq!(engine.backend().live_textures(), 0);
    let released = engine.backend().released().len();

    engine.shutdown();
    assert_eq!(engine.backend().released().len(), released);

    // a shut down engine skips draws instead of touching freed resources
    engine.begin_frame(Size::new(100.0, 100.0));
    engine.draw_rectangle(Pose::new(10.0, 10.0, 5.0, 5.0, Color::RED));
    engine.draw_text("gone", 0.0, 0.0, 1.0, Color::WHITE);
    engine.end_frame().unwrap();
    assert_eq!(engine.backend().draw_count(), 0);
}
