use super::*;
use crate::audio::path::{OUTPUT_CHANNELS, PathId, SignalPath};

fn render(spec: PathSpec, frames: usize) -> Vec<f32> {
    let mut p = SignalPath::build(PathId(9), spec, 0, 48_000);
    let mut out = vec![0.0f32; frames * OUTPUT_CHANNELS];
    p.render_into(0, &mut out, None);
    out
}

#[test]
fn sweep_is_audible_bounded_and_deterministic() {
    let a = render(transition_sweep(11, SinkSet::SPEAKERS), 48_000);
    let b = render(transition_sweep(11, SinkSet::SPEAKERS), 48_000);
    assert_eq!(a, b);
    let peak = a.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(peak > 0.001 && peak < 0.5, "peak {peak}");
    // Silent after its duration.
    assert!(a[(30_000 * OUTPUT_CHANNELS)..].iter().all(|v| *v == 0.0));
}

#[test]
fn blip_decays() {
    let out = render(accent_blip(SinkSet::SPEAKERS), 16_800);
    let early = out[..2_000].iter().fold(0.0f32, |m, v| m.max(v.abs()));
    let late = out[(15_000 * OUTPUT_CHANNELS)..(16_000 * OUTPUT_CHANNELS)]
        .iter()
        .fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(early > late * 10.0, "early {early} late {late}");
}
