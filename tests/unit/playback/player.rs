use super::*;
use crate::config::AudioConfig;
use crate::scene::model::{MotionDirective, NarrationAudio, Scene};
use crate::visual::frame::RecordingCompositor;

const RATE: u32 = 8_000;

fn cfg() -> ReelConfig {
    ReelConfig {
        fallback_duration_secs: 1.0,
        audio: AudioConfig {
            sample_rate: RATE,
            ..AudioConfig::default()
        },
        ..ReelConfig::default()
    }
}

fn narrated(id: &str, secs: f64) -> Scene {
    let n = (secs * f64::from(RATE)) as usize;
    Scene::new(id, id, MotionDirective::ZoomIn)
        .with_narration(NarrationAudio::from_mono_f32(&vec![0.1; n], RATE))
}

#[test]
fn start_reports_scene_and_status() {
    let mut p = Player::headless(cfg(), SceneList::new(vec![narrated("a", 0.5)])).unwrap();
    assert!(p.start());
    assert_eq!(
        p.drain_events(),
        vec![
            PlayerEvent::SceneChanged { index: 0 },
            PlayerEvent::StatusChanged(PlaybackStatus::Playing)
        ]
    );
    assert!(p.drain_events().is_empty());
}

#[test]
fn empty_list_does_not_start() {
    let mut p = Player::headless(cfg(), SceneList::default()).unwrap();
    assert!(!p.start());
    assert!(p.visual_frame().is_none());
    assert!(p.drain_events().is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let bad = ReelConfig {
        fallback_duration_secs: 0.0,
        ..cfg()
    };
    assert!(Player::headless(bad, SceneList::default()).is_err());
}

#[test]
fn pump_before_start_does_not_advance_clock() {
    let mut p = Player::headless(cfg(), SceneList::new(vec![narrated("a", 0.5)])).unwrap();
    p.pump(1_000).unwrap();
    assert_eq!(p.position(), 0);
}

#[test]
fn visual_frame_follows_audio_clock() {
    let mut p = Player::headless(cfg(), SceneList::new(vec![narrated("a", 1.0)])).unwrap();
    let still = p.visual_frame().unwrap();
    assert_eq!(still.progress, 0.0);

    p.start();
    p.pump(2_000).unwrap();
    let f = p.visual_frame().unwrap();
    assert!((f.progress - 0.25).abs() < 1e-9);
    assert_eq!(p.scene_clock(), Some((0.25, 1.0)));

    let mut c = RecordingCompositor::default();
    p.present(&mut c).unwrap();
    assert_eq!(c.frames, vec![f]);
}

#[test]
fn capture_holds_fallback_progress() {
    let mut p = Player::headless(cfg(), SceneList::new(vec![Scene::new(
        "quiet",
        "",
        MotionDirective::PanRight,
    )]))
    .unwrap();
    assert!(p.set_mode(PlaybackMode::Capture));
    p.start();
    p.pump(100).unwrap();
    let progress = p.visual_frame().unwrap().progress;
    assert_eq!(progress, FALLBACK_CAPTURE_PROGRESS);
    p.pump(6_000).unwrap();
    let progress = p.visual_frame().unwrap().progress;
    assert_eq!(progress, FALLBACK_CAPTURE_PROGRESS);
}

#[test]
fn pause_and_seek_emit_events() {
    let mut p = Player::headless(
        cfg(),
        SceneList::new(vec![narrated("a", 1.0), narrated("b", 1.0)]),
    )
    .unwrap();
    p.start();
    p.drain_events();

    p.seek(1);
    assert_eq!(
        p.drain_events(),
        vec![PlayerEvent::SceneChanged { index: 1 }]
    );
    assert_eq!(p.index(), 1);

    assert!(p.pause());
    assert_eq!(
        p.drain_events(),
        vec![PlayerEvent::StatusChanged(PlaybackStatus::Stopped)]
    );
    let pos = p.position();
    p.pump(500).unwrap();
    assert_eq!(p.position(), pos);
}

#[derive(Debug)]
struct WideMeasure;

impl crate::visual::caption::TextMeasure for WideMeasure {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size
    }
}

#[test]
fn caption_measure_is_used_until_cleared() {
    let mut p = Player::headless(cfg(), SceneList::new(vec![narrated("word", 0.5)])).unwrap();
    let fixed = p.visual_frame().unwrap().caption;

    p.set_caption_measure(Some(Arc::new(WideMeasure)));
    let wide = p.visual_frame().unwrap().caption;
    assert_eq!(wide.runs[0].width, 4.0 * wide.font_size);
    assert!(wide.runs[0].width > fixed.runs[0].width);
    assert_eq!(p.visual_frame_with(&FixedAdvance).unwrap().caption, fixed);

    p.set_caption_measure(None);
    assert_eq!(p.visual_frame().unwrap().caption, fixed);
}
