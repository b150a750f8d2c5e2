use super::*;

#[test]
fn endpoints_match_documented_values() {
    let cases = [
        (MotionDirective::ZoomIn, (1.0, 0.0), (1.15, 0.0)),
        (MotionDirective::ZoomOut, (1.15, 0.0), (1.0, 0.0)),
        (MotionDirective::PanLeft, (1.1, 0.0), (1.1, -30.0)),
        (MotionDirective::PanRight, (1.1, 0.0), (1.1, 30.0)),
    ];
    for (motion, start, end) in cases {
        let t0 = compute_transform(motion, 0.0);
        let t1 = compute_transform(motion, 1.0);
        assert_eq!((t0.scale, t0.translate_x), start, "{motion:?} at 0");
        assert_eq!((t1.scale, t1.translate_x), end, "{motion:?} at 1");
    }
}

#[test]
fn midpoint_is_linear() {
    let t = compute_transform(MotionDirective::ZoomIn, 0.5);
    assert!((t.scale - 1.075).abs() < 1e-12);
    let t = compute_transform(MotionDirective::PanRight, 0.25);
    assert!((t.translate_x - 7.5).abs() < 1e-12);
}

#[test]
fn progress_is_clamped() {
    assert_eq!(
        compute_transform(MotionDirective::ZoomIn, -3.0),
        compute_transform(MotionDirective::ZoomIn, 0.0)
    );
    assert_eq!(
        compute_transform(MotionDirective::PanLeft, 7.0),
        compute_transform(MotionDirective::PanLeft, 1.0)
    );
    assert_eq!(
        compute_transform(MotionDirective::ZoomOut, f64::NAN),
        compute_transform(MotionDirective::ZoomOut, 0.0)
    );
}

#[test]
fn affine_scales_about_center_and_translates_per_mille() {
    let canvas = Canvas::new(1000, 500).unwrap();
    let t = MotionTransform {
        scale: 2.0,
        translate_x: 30.0,
    };
    assert_eq!(t.translate_px(canvas), 30.0);
    let a = t.to_affine(canvas);
    let center = a * kurbo::Point::new(500.0, 250.0);
    assert!((center.x - 530.0).abs() < 1e-9);
    assert!((center.y - 250.0).abs() < 1e-9);
    let origin = a * kurbo::Point::new(0.0, 0.0);
    assert!((origin.x - (-500.0 + 30.0)).abs() < 1e-9);
    assert!((origin.y - (-250.0)).abs() < 1e-9);

    assert_eq!(
        MotionTransform::IDENTITY.to_affine(canvas),
        kurbo::Affine::IDENTITY
    );
}
