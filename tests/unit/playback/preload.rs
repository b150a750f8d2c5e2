use super::*;

fn narration(samples: usize) -> NarrationAudio {
    NarrationAudio::from_mono_f32(&vec![0.2; samples], 8_000)
}

fn cache() -> PreloadCache {
    PreloadCache::new(8_000, None).unwrap()
}

#[test]
fn take_returns_buffer_for_matching_index() {
    let mut c = cache();
    c.preload(1, Some(&narration(400)));
    let buf = c.take(1).unwrap();
    assert_eq!(buf.len(), 400);
    assert_eq!(buf.sample_rate, 8_000);
    // Taking clears the entry.
    assert!(c.take(1).is_none());

    let s = c.stats();
    assert_eq!(s.requests, 1);
    assert_eq!(s.hits, 1);
    assert_eq!(s.misses, 1);
}

#[test]
fn mismatched_index_misses() {
    let mut c = cache();
    c.preload(2, Some(&narration(400)));
    assert!(c.take(3).is_none());
    // The entry for 2 survives a mismatched take.
    assert!(c.take(2).is_some());
}

#[test]
fn newer_preload_overwrites_older() {
    let mut c = cache();
    c.preload(1, Some(&narration(100)));
    c.preload(2, Some(&narration(200)));
    assert!(c.take(1).is_none());
    assert_eq!(c.take(2).map(|b| b.len()), Some(200));
}

#[test]
fn invalidate_discards_pending_and_ready() {
    let mut c = cache();
    c.preload(1, Some(&narration(100)));
    assert!(c.take(1).is_some());

    c.preload(1, Some(&narration(100)));
    c.invalidate();
    assert_eq!(c.pending_index(), None);
    assert!(c.take(1).is_none());

    // The abandoned decode still arrives later and is dropped.
    for _ in 0..200 {
        c.poll();
        if c.stats().stale > 0 {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(c.stats().stale, 1);
    assert_eq!(c.ready_index(), None);
}

#[test]
fn decode_failure_is_counted_and_skipped() {
    let mut c = cache();
    c.preload(1, Some(&NarrationAudio::s16le_mono(vec![0; 3])));
    assert!(c.take(1).is_none());
    assert_eq!(c.stats().failures, 1);
}

#[test]
fn scene_without_narration_clears_cache() {
    let mut c = cache();
    c.preload(1, Some(&narration(100)));
    c.preload(2, None);
    assert_eq!(c.pending_index(), None);
    assert!(c.take(1).is_none());
    assert!(c.take(2).is_none());
    assert_eq!(c.stats().requests, 2);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(PreloadCache::new(8_000, Some(0)).is_err());
    assert!(PreloadCache::new(0, None).is_err());
}

#[test]
fn take_matching_rejects_entry_from_other_payload() {
    let mut c = cache();
    let a = narration(100);
    let b = narration(100);
    c.preload(1, Some(&a));
    assert!(c.take_matching(1, &b).is_none());
    assert_eq!(c.stats().stale, 1);

    c.preload(1, Some(&a));
    assert!(c.take_matching(1, &a.clone()).is_some());
}
