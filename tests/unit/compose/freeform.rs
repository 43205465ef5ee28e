use super::*;

fn dot(x: f64, y: f64) -> Vec<Point> {
    vec![Point::new(x, y)]
}

#[test]
fn single_point_brush_paints_a_disc() {
    let mut c = StrokeCanvas::mask_canvas(20, 20).unwrap();
    c.commit(&Stroke::brush(3.0, dot(10.0, 10.0))).unwrap();
    let m = c.to_mask();
    assert!(m.is_white(10, 10));
    assert!(m.is_white(8, 10));
    assert!(!m.is_white(14, 10));
    assert!(!m.is_white(0, 0));
}

#[test]
fn line_stroke_covers_the_segment() {
    let m = build_freeform_mask(
        Dims::new(32, 8),
        &[Stroke::brush(
            1.0,
            vec![Point::new(2.0, 4.0), Point::new(30.0, 4.0)],
        )],
    )
    .unwrap();
    for x in 2..30 {
        assert!(m.is_white(x, 3) || m.is_white(x, 4), "column {x}");
    }
    assert!(!m.is_white(16, 0));
    assert!(!m.is_white(16, 7));
}

#[test]
fn eraser_restores_black() {
    let m = build_freeform_mask(
        Dims::new(20, 20),
        &[
            Stroke::brush(6.0, dot(10.0, 10.0)),
            Stroke::eraser(2.0, dot(10.0, 10.0)),
        ],
    )
    .unwrap();
    assert!(!m.is_white(10, 10));
    assert!(m.is_white(5, 10));
}

#[test]
fn undo_redo_walk_full_snapshots() {
    let mut c = StrokeCanvas::mask_canvas(16, 16).unwrap();
    let blank = c.to_image();
    c.commit(&Stroke::brush(2.0, dot(4.0, 4.0))).unwrap();
    let one = c.to_image();
    c.commit(&Stroke::brush(2.0, dot(12.0, 12.0))).unwrap();
    let two = c.to_image();

    assert!(c.undo());
    assert_eq!(c.to_image(), one);
    assert!(c.undo());
    assert_eq!(c.to_image(), blank);
    assert!(!c.undo());

    assert!(c.redo());
    assert!(c.redo());
    assert_eq!(c.to_image(), two);
    assert!(!c.redo());
}

#[test]
fn new_commit_discards_redo_branch() {
    let mut c = StrokeCanvas::mask_canvas(8, 8).unwrap();
    c.commit(&Stroke::brush(1.0, dot(1.0, 1.0))).unwrap();
    c.undo();
    assert!(c.can_redo());
    c.commit(&Stroke::brush(1.0, dot(6.0, 6.0))).unwrap();
    assert!(!c.can_redo());
    assert!(c.can_undo());
}

#[test]
fn many_commits_are_all_undoable() {
    let mut c = StrokeCanvas::mask_canvas(8, 8).unwrap();
    for i in 0..200 {
        c.commit(&Stroke::brush(1.0, dot(f64::from(i % 8), 2.0))).unwrap();
    }
    let mut n = 0;
    while c.undo() {
        n += 1;
    }
    assert_eq!(n, 200);
    assert_eq!(c.to_mask().white_area(), 0);
}

#[test]
fn clear_is_undoable() {
    let mut c = StrokeCanvas::mask_canvas(8, 8).unwrap();
    c.commit(&Stroke::brush(3.0, dot(4.0, 4.0))).unwrap();
    let painted = c.to_mask().white_area();
    c.clear();
    assert_eq!(c.to_mask().white_area(), 0);
    c.undo();
    assert_eq!(c.to_mask().white_area(), painted);
}

#[test]
fn drawing_canvas_erases_to_transparent() {
    let red = Rgba8::new(255, 0, 0, 255);
    let mut c = StrokeCanvas::drawing_canvas(10, 10, red).unwrap();
    c.commit(&Stroke::brush(3.0, dot(5.0, 5.0))).unwrap();
    assert_eq!(c.to_image().pixel(5, 5), Some(red));
    c.commit(&Stroke::eraser(3.0, dot(5.0, 5.0))).unwrap();
    assert_eq!(c.to_image().pixel(5, 5), Some(Rgba8::TRANSPARENT));
}

#[test]
fn strokes_outside_the_canvas_are_clipped() {
    let m = build_freeform_mask(Dims::new(10, 10), &[Stroke::brush(2.0, dot(-50.0, 500.0))])
        .unwrap();
    assert_eq!(m.white_area(), 0);
}

#[test]
fn invalid_strokes_are_rejected_without_snapshot() {
    let mut c = StrokeCanvas::mask_canvas(8, 8).unwrap();
    assert!(c.commit(&Stroke::brush(0.0, dot(1.0, 1.0))).is_err());
    assert!(c.commit(&Stroke::brush(1.0, vec![])).is_err());
    assert!(c.commit(&Stroke::brush(1.0, dot(f64::NAN, 1.0))).is_err());
    assert!(!c.can_undo());
}
