use super::*;
use crate::audio::graph::AudioEvent;
use crate::config::AudioConfig;
use crate::scene::model::{MotionDirective, NarrationAudio, Scene};

const RATE: u32 = 8_000;

fn narrated(id: &str, secs: f64) -> Scene {
    let n = (secs * f64::from(RATE)) as usize;
    Scene::new(id, id, MotionDirective::ZoomIn)
        .with_narration(NarrationAudio::from_mono_f32(&vec![0.1; n], RATE))
}

fn silent(id: &str) -> Scene {
    Scene::new(id, id, MotionDirective::PanLeft)
}

struct Rig {
    scenes: SceneList,
    graph: AudioGraph,
    preload: PreloadCache,
}

impl Rig {
    fn new(scenes: Vec<Scene>) -> Self {
        Self {
            scenes: SceneList::new(scenes),
            graph: AudioGraph::headless(AudioConfig {
                sample_rate: RATE,
                ..AudioConfig::default()
            }),
            preload: PreloadCache::new(RATE, None).unwrap(),
        }
    }

    fn io(&mut self) -> SequencerIo<'_> {
        SequencerIo {
            scenes: &self.scenes,
            graph: &mut self.graph,
            preload: &mut self.preload,
        }
    }

    fn finish_narration(&mut self) -> PathId {
        let end = self.graph.next_boundary().unwrap();
        let pos = self.graph.position();
        self.graph.render((end - pos) as usize).unwrap();
        match self.graph.poll_event() {
            Some(AudioEvent::NarrationEnded { path, .. }) => path,
            None => panic!("narration did not end"),
        }
    }
}

#[test]
fn start_requires_scenes() {
    let mut rig = Rig::new(Vec::new());
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    assert!(!seq.start(&mut rig.io()));
    assert_eq!(seq.status(), PlaybackStatus::Stopped);
}

#[test]
fn start_plays_narration_and_preloads_next() {
    let mut rig = Rig::new(vec![narrated("a", 0.5), narrated("b", 0.5)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    assert!(seq.start(&mut rig.io()));
    assert!(!seq.start(&mut rig.io()));
    assert_eq!(seq.status(), PlaybackStatus::Playing);

    let active = seq.active().unwrap();
    assert_eq!(active.index, 0);
    assert!(matches!(active.timing, SceneTiming::Narrated(_)));
    assert!((active.timing.duration_secs() - 0.5).abs() < 1e-9);
    assert_eq!(rig.preload.stats().requests, 1);
    assert_eq!(rig.graph.stats().narrations_started, 1);
}

#[test]
fn narration_end_advances_and_stale_end_is_ignored() {
    let mut rig = Rig::new(vec![narrated("a", 0.25), narrated("b", 0.25)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());

    let stale = seq.handle(Trigger::NarrationEnded(PathId(9_999)), &mut rig.io());
    assert_eq!(stale, SequencerOutput::None);
    assert_eq!(seq.index(), 0);

    let path = rig.finish_narration();
    let out = seq.handle(Trigger::NarrationEnded(path), &mut rig.io());
    assert_eq!(out, SequencerOutput::Advanced { from: 0, to: 1 });
    // The preloaded buffer was consumed for scene 1.
    assert_eq!(rig.preload.stats().hits, 1);

    // Replaying the old end event does nothing.
    let again = seq.handle(Trigger::NarrationEnded(path), &mut rig.io());
    assert_eq!(again, SequencerOutput::None);
}

#[test]
fn preview_end_resets_index_to_zero() {
    let mut rig = Rig::new(vec![narrated("a", 0.1)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());
    let path = rig.finish_narration();
    assert_eq!(
        seq.handle(Trigger::NarrationEnded(path), &mut rig.io()),
        SequencerOutput::Ended
    );
    assert_eq!(seq.status(), PlaybackStatus::Ended);
    assert_eq!(seq.index(), 0);
    assert!(seq.active().is_none());
}

#[test]
fn capture_end_keeps_last_index() {
    let mut rig = Rig::new(vec![narrated("a", 0.1), narrated("b", 0.1)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Capture);
    seq.start(&mut rig.io());
    // Capture never preloads.
    assert_eq!(rig.preload.stats().requests, 0);

    let p = rig.finish_narration();
    seq.handle(Trigger::NarrationEnded(p), &mut rig.io());
    let p = rig.finish_narration();
    assert_eq!(
        seq.handle(Trigger::NarrationEnded(p), &mut rig.io()),
        SequencerOutput::Ended
    );
    assert_eq!(seq.index(), 1);
}

#[test]
fn fallback_timer_fires_once_at_deadline() {
    let mut rig = Rig::new(vec![silent("a"), narrated("b", 0.1)]);
    let mut seq = Sequencer::new(2.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());

    let active = seq.active().unwrap();
    assert!(active.timing.is_fallback());
    let deadline = seq.fallback_deadline().unwrap();
    assert_eq!(deadline, active.timing.start_sample() + 2 * u64::from(RATE));

    assert_eq!(seq.take_expired_fallback(deadline - 1), None);
    let trigger = seq.take_expired_fallback(deadline).unwrap();
    assert_eq!(seq.take_expired_fallback(deadline + 10), None);
    assert_eq!(
        seq.handle(trigger, &mut rig.io()),
        SequencerOutput::Advanced { from: 0, to: 1 }
    );
}

#[test]
fn fallback_trigger_from_an_older_generation_is_stale() {
    let mut rig = Rig::new(vec![silent("a"), silent("b")]);
    let mut seq = Sequencer::new(1.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());
    let old = seq.take_expired_fallback(u64::MAX).unwrap();
    seq.seek(0, &mut rig.io());
    assert_eq!(seq.handle(old, &mut rig.io()), SequencerOutput::None);
    assert_eq!(seq.index(), 0);
}

#[test]
fn seek_cancels_narration_and_preload() {
    let mut rig = Rig::new(vec![
        narrated("a", 1.0),
        narrated("b", 1.0),
        narrated("c", 1.0),
    ]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());
    seq.seek(2, &mut rig.io());
    assert_eq!(seq.status(), PlaybackStatus::Playing);
    assert_eq!(seq.active().unwrap().index, 2);
    assert_eq!(rig.graph.stats().narrations_stopped, 1);
    assert_eq!(rig.graph.stats().max_concurrent_narrations, 1);
    // The preload for index 1 was abandoned; the entry for 2 was never cached.
    assert_eq!(rig.preload.stats().hits, 0);

    seq.seek(99, &mut rig.io());
    assert_eq!(seq.index(), 2);
}

#[test]
fn seek_while_stopped_stays_stopped() {
    let mut rig = Rig::new(vec![narrated("a", 1.0), narrated("b", 1.0)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.seek(1, &mut rig.io());
    assert_eq!(seq.status(), PlaybackStatus::Stopped);
    assert_eq!(seq.index(), 1);
    assert!(seq.active().is_none());
}

#[test]
fn pause_suspends_and_start_replays_scene() {
    let mut rig = Rig::new(vec![narrated("a", 1.0)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());
    rig.graph.render(100).unwrap();
    assert!(seq.pause(&mut rig.io()));
    assert!(!seq.pause(&mut rig.io()));
    assert_eq!(seq.status(), PlaybackStatus::Stopped);
    assert!(!rig.graph.is_running());

    seq.start(&mut rig.io());
    assert!(rig.graph.is_running());
    assert_eq!(rig.graph.stats().narrations_started, 2);
    assert_eq!(seq.active().unwrap().timing.start_sample(), 100);
}

#[test]
fn reorder_is_followed_by_index() {
    let mut rig = Rig::new(vec![narrated("a", 0.1), narrated("b", 0.1), silent("c")]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    seq.start(&mut rig.io());
    rig.scenes.reorder(2, 1).unwrap();

    let p = rig.finish_narration();
    seq.handle(Trigger::NarrationEnded(p), &mut rig.io());
    // Index 1 now holds the narration-less scene.
    assert_eq!(seq.index(), 1);
    assert!(seq.active().unwrap().timing.is_fallback());
}

#[test]
fn mode_switch_is_refused_while_playing() {
    let mut rig = Rig::new(vec![narrated("a", 0.1)]);
    let mut seq = Sequencer::new(3.0, PlaybackMode::Preview);
    assert!(seq.set_mode(PlaybackMode::Capture));
    assert!(seq.set_mode(PlaybackMode::Preview));
    seq.start(&mut rig.io());
    assert!(!seq.set_mode(PlaybackMode::Capture));
    assert_eq!(seq.mode(), PlaybackMode::Preview);
}
