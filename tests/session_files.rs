//! File-level behavior of a session: loading images, saving and reloading
//! annotations, writing flattened rasters.

use std::path::Path;

use annomark::model::{Annotation, Point, Rotation};
use annomark::render::RasterPainter;
use annomark::script;
use annomark::{ErrorKind, Session};
use image::{Rgba, RgbaImage};

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]))
        .save(path)
        .unwrap();
}

fn annotated_session(image: &Path) -> Session {
    let mut session = Session::new();
    session.load_path(image).unwrap();

    session.begin_box(Point::new(10.0, 10.0)).unwrap();
    session.update_box(Point::new(40.0, 40.0)).unwrap();
    session.end_gesture();
    session.attach_label(None, "cat").unwrap();

    session.begin_stroke(Point::new(0.0, 0.0)).unwrap();
    session.extend_stroke(Point::new(5.0, 5.0)).unwrap();
    session.extend_stroke(Point::new(10.0, 0.0)).unwrap();
    session.end_gesture();
    session
}

#[test]
fn test_load_png_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 64, 32);

    let mut session = Session::new();
    session.load_path(&image).unwrap();
    assert_eq!(session.image().map(|i| i.dimensions()), Some((64, 32)));
    assert_eq!(session.transform().view_size(), (64, 32));
}

#[test]
fn test_missing_image_is_io_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new();
    let err = session.load_path(&dir.path().join("nope.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
    assert!(!session.has_image());
}

#[test]
fn test_text_annotations_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 100, 100);

    let session = annotated_session(&image);
    let saved = dir.path().join("notes.txt");
    session.save_annotations(&saved).unwrap();

    let text = std::fs::read_to_string(&saved).unwrap();
    assert_eq!(
        text,
        "# annomark annotations v1\nbox \"cat\" 10 10 40 40\nstroke \"\" 3 0 0 5 5 10 0\n"
    );

    let mut reopened = Session::new();
    reopened.load_path(&image).unwrap();
    reopened.load_annotations(&saved).unwrap();
    let original: Vec<Vec<Point>> = session.annotations().map(Annotation::points).collect();
    let restored: Vec<Vec<Point>> = reopened.annotations().map(Annotation::points).collect();
    assert_eq!(original, restored);
}

#[test]
fn test_json_annotations_keep_colors() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 100, 100);

    let mut session = annotated_session(&image);
    session.style_mut().stroke_color = annomark::model::Color([0, 128, 0]);
    session.draw_stroke(vec![Point::new(1.0, 1.0)]).unwrap();
    let saved = dir.path().join("notes.json");
    session.save_annotations(&saved).unwrap();

    let mut reopened = Session::new();
    reopened.load_path(&image).unwrap();
    let ids = reopened.load_annotations(&saved).unwrap();
    assert_eq!(ids.len(), 3);

    let colors: Vec<_> = reopened.annotations().map(Annotation::color).collect();
    let expected: Vec<_> = session.annotations().map(Annotation::color).collect();
    assert_eq!(colors, expected);
    assert_eq!(reopened.history().len(), 1);
}

#[test]
fn test_unknown_annotation_extension() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 10, 10);

    let session = annotated_session(&image);
    let target = dir.path().join("notes.xml");
    assert!(session.save_annotations(&target).is_err());
    assert!(!target.exists());
}

#[test]
fn test_flattened_png_has_view_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 100, 50);

    let mut session = annotated_session(&image);
    session.rotate().unwrap();
    session.zoom(2.0).unwrap();
    assert_eq!(session.transform().rotation, Rotation::Deg90);

    let out = dir.path().join("flat.png");
    session
        .save_flattened(&out, &mut RasterPainter::default())
        .unwrap();

    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (100, 200));

    // The stored source raster is still the plain white original.
    let source = session.image().unwrap();
    assert_eq!(source.dimensions(), (100, 50));
    assert!(source.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn test_flattened_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 40, 30);

    let session = annotated_session(&image);
    let out = dir.path().join("flat.jpg");
    session
        .save_flattened(&out, &mut RasterPainter::default())
        .unwrap();
    let written = image::open(&out).unwrap();
    assert_eq!((written.width(), written.height()), (40, 30));
}

#[test]
fn test_script_file_drives_session() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("input.png");
    write_png(&image, 100, 100);

    let mut session = Session::new();
    session.load_path(&image).unwrap();
    let steps = script::parse(
        r#"[
            {"op": "draw_box", "x1": 10, "y1": 10, "x2": 40, "y2": 40},
            {"op": "label", "text": "cat"},
            {"op": "zoom_in"},
            {"op": "zoom_out"},
            {"op": "undo"},
            {"op": "undo"}
        ]"#,
    )
    .unwrap();
    script::run(&mut session, &steps).unwrap();

    assert!((session.transform().scale - 1.0).abs() < 1e-6);
    assert_eq!(session.annotations().count(), 1);
    assert!(session.can_redo());
}
