use super::*;

#[test]
fn defaults_validate() {
    let cfg = ReelConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.fps().unwrap(), Fps { num: 30, den: 1 });
    assert_eq!(cfg.canvas().height, 1920);
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = ReelConfig::from_json(
        r#"{ "orientation": "landscape", "caption_mode": "subtitle", "capture": { "fps_num": 25 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.orientation, Orientation::Landscape);
    assert_eq!(cfg.caption_mode, CaptionMode::Subtitle);
    assert_eq!(cfg.capture.fps_num, 25);
    assert_eq!(cfg.capture.fps_den, 1);
    assert!((cfg.fallback_duration_secs - 3.0).abs() < 1e-12);
}

#[test]
fn rejects_bad_values() {
    let mut cfg = ReelConfig::default();
    cfg.fallback_duration_secs = 0.0;
    assert!(matches!(cfg.validate(), Err(ReelError::Validation(_))));

    let mut cfg = ReelConfig::default();
    cfg.audio.bed_duck_gain = 1.5;
    assert!(cfg.validate().is_err());

    let mut cfg = ReelConfig::default();
    cfg.capture.fps_num = 0;
    assert!(cfg.validate().is_err());

    assert!(matches!(
        ReelConfig::from_json("{ not json"),
        Err(ReelError::Serde(_))
    ));
}

#[test]
fn suggested_filename_uses_title_slug() {
    let mut cfg = ReelConfig::default();
    assert_eq!(cfg.suggested_filename("mp4"), "reel-portrait.mp4");
    cfg.title = Some("  The Deep Sea: Part 2!".to_string());
    let name = cfg.suggested_filename("mp4");
    assert_eq!(name, "the-deep-sea-part-2-portrait.mp4");
}

#[test]
fn canvas_override_wins_and_is_validated() {
    let cfg = ReelConfig::from_json(r#"{ "canvas_override": { "width": 64, "height": 112 } }"#)
        .unwrap();
    assert_eq!(cfg.canvas(), Canvas::new(64, 112).unwrap());

    let err = ReelConfig::from_json(r#"{ "canvas_override": { "width": 63, "height": 112 } }"#);
    assert!(matches!(err, Err(ReelError::Validation(_))));
}
