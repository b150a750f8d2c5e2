use super::*;

#[test]
fn normalize_rel_path_rejects_escapes() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.pcm").unwrap(), "a/b.pcm");
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../x").is_err());
    assert!(normalize_rel_path("./").is_err());
}

#[test]
fn manifest_defaults_and_load() {
    let dir = std::env::temp_dir().join(format!("reel_manifest_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("n0.pcm"), [0u8, 0, 1, 0]).unwrap();

    let m = SceneManifest::from_json(
        r#"{ "scenes": [
            { "id": "s0", "caption": "Hello *world*", "narration": { "path": "n0.pcm" } },
            { "id": "s1", "motion": "pan-right" }
        ] }"#,
    )
    .unwrap();
    let list = m.load(&dir).unwrap();
    assert_eq!(list.len(), 2);

    let s0 = list.get(0).unwrap();
    let n = s0.narration.unwrap();
    assert_eq!(n.sample_rate, 24_000);
    assert_eq!(n.channels, 1);
    assert_eq!(n.format, PcmFormat::S16Le);
    assert_eq!(s0.motion, MotionDirective::ZoomIn);

    let s1 = list.get(1).unwrap();
    assert!(s1.narration.is_none());
    assert_eq!(s1.motion, MotionDirective::PanRight);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn manifest_missing_asset_is_error() {
    let m = SceneManifest::from_json(r#"{ "scenes": [ { "id": "s0", "image": "nope.png" } ] }"#)
        .unwrap();
    assert!(m.load(Path::new("/definitely/not/here")).is_err());
}

#[test]
fn unknown_motion_tag_is_rejected_when_parsing() {
    let err = SceneManifest::from_json(r#"{ "scenes": [ { "id": "s0", "motion": "spin" } ] }"#)
        .unwrap_err();
    assert!(err.to_string().starts_with("serialization error:"), "{err}");
    assert!(err.to_string().contains("spin"), "{err}");

    // Only the kebab-case tags are accepted on disk.
    let snake = r#"{ "scenes": [ { "id": "s0", "motion": "zoom_in" } ] }"#;
    assert!(SceneManifest::from_json(snake).is_err());
    let m = SceneManifest::from_json(r#"{ "scenes": [ { "id": "s0", "motion": "zoom-out" } ] }"#)
        .unwrap();
    assert_eq!(m.scenes[0].motion, MotionDirective::ZoomOut);
    let tag = serde_json::to_string(&MotionDirective::PanLeft).unwrap();
    assert_eq!(tag, "\"pan-left\"");
}
