use super::*;
use crate::visual::caption::compute_caption_layout;

fn scene() -> Scene {
    Scene::new("s1", "Look *here*", MotionDirective::ZoomOut)
}

#[test]
fn progress_is_clamped_and_guarded() {
    assert_eq!(scene_progress(1.0, 4.0), 0.25);
    assert_eq!(scene_progress(-1.0, 4.0), 0.0);
    assert_eq!(scene_progress(9.0, 4.0), 1.0);
    assert_eq!(scene_progress(1.0, 0.0), 0.0);
    assert_eq!(scene_progress(f64::NAN, 2.0), 0.0);
}

#[test]
fn sample_frame_composes_transform_and_caption() {
    let canvas = Canvas::new(1080, 1920).unwrap();
    let f = sample_frame(&scene(), 1.0, 2.0, canvas, CaptionMode::Kinetic);
    assert_eq!(f.scene_id, SceneId::new("s1"));
    assert_eq!(f.progress, 0.5);
    let transform = compute_transform(MotionDirective::ZoomOut, 0.5);
    assert_eq!(f.transform, transform);
    assert_eq!(
        f.caption,
        compute_caption_layout("Look *here*", CaptionMode::Kinetic, 1080, 1920)
    );
    assert_eq!(f.image, ImageSlot::Missing);
}

#[test]
fn image_slot_reflects_generation_state() {
    let canvas = Canvas::new(16, 16).unwrap();
    let mut s = scene();
    s.image_generating = true;
    let f = sample_frame(&s, 0.0, 1.0, canvas, CaptionMode::Subtitle);
    assert_eq!(f.image, ImageSlot::Generating);
    assert!(f.image.is_placeholder());

    let s = s.with_image(ImagePayload::new(vec![1, 2, 3]));
    let f = sample_frame(&s, 0.0, 1.0, canvas, CaptionMode::Subtitle);
    assert!(!f.image.is_placeholder());
}

#[test]
fn recording_compositor_keeps_frames() {
    let canvas = Canvas::new(16, 16).unwrap();
    let mut c = RecordingCompositor::default();
    let f = sample_frame(&scene(), 0.0, 1.0, canvas, CaptionMode::Kinetic);
    c.present(&f).unwrap();
    assert_eq!(c.frames, vec![f]);
}
