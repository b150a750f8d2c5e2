use super::*;

#[test]
fn motion_directive_parses_producer_tags() {
    let parse = |s: &str| MotionDirective::parse(s).unwrap();
    assert_eq!(parse("zoom-in"), MotionDirective::ZoomIn);
    assert_eq!(parse("zoomOut"), MotionDirective::ZoomOut);
    assert_eq!(parse("pan_left"), MotionDirective::PanLeft);
    assert_eq!(parse("Pan Right"), MotionDirective::PanRight);
    assert!(MotionDirective::parse("spin").is_err());
}

#[test]
fn narration_duration_from_payload_length() {
    let n = NarrationAudio::from_mono_f32(&vec![0.0; 24_000 * 2], 24_000);
    assert!((n.nominal_duration_secs() - 2.0).abs() < 1e-9);
    assert_eq!(n.bytes.len(), 24_000 * 2 * 2);
}

#[test]
fn builders_clear_generating_flags() {
    let mut s = Scene::new("a", "hello", MotionDirective::PanLeft);
    s.audio_generating = true;
    s.image_generating = true;
    let s = s
        .with_narration(NarrationAudio::s16le_mono(vec![0, 0]))
        .with_image(ImagePayload::new(vec![1, 2, 3]));
    assert!(!s.audio_generating);
    assert!(!s.image_generating);
    assert_eq!(s.id.to_string(), "a");
}

#[test]
fn image_content_key_tracks_bytes() {
    let a = ImagePayload::new(vec![1, 2, 3]);
    let b = ImagePayload::new(vec![1, 2, 3]);
    let c = ImagePayload::new(vec![3, 2, 1]);
    assert_eq!(a.content_key(), b.content_key());
    assert_ne!(a.content_key(), c.content_key());
}
