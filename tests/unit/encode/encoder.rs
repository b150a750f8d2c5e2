use super::*;

fn cfg() -> EncoderConfig {
    EncoderConfig {
        width: 4,
        height: 2,
        fps: Fps::new(30, 1).unwrap(),
        sample_rate: 48_000,
        channels: 2,
        video_bitrate_kbps: 1_000,
        audio_bitrate_kbps: 128,
        bg_rgba: [0, 0, 0, 255],
    }
}

fn frame(fill: u8) -> FrameRGBA {
    FrameRGBA {
        width: 4,
        height: 2,
        data: vec![fill; 4 * 2 * 4],
        premultiplied: true,
    }
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(cfg().validate().is_ok());
    assert!(EncoderConfig { width: 0, ..cfg() }.validate().is_err());
    assert!(EncoderConfig { width: 5, ..cfg() }.validate().is_err());
    assert!(
        EncoderConfig {
            sample_rate: 0,
            ..cfg()
        }
        .validate()
        .is_err()
    );
}

#[test]
fn container_records_frames_and_audio() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(&cfg()).unwrap();
    assert!(enc.is_active());
    enc.push_frame(FrameIndex(0), &frame(1)).unwrap();
    enc.push_audio(&[0.5; 3_200]).unwrap();
    let mut chunks = enc.drain_chunks();
    assert_eq!(chunks.len(), 2);
    enc.push_frame(FrameIndex(1), &frame(2)).unwrap();
    enc.push_audio(&[0.25; 3_200]).unwrap();
    chunks.extend(enc.drain_chunks());

    let bytes = enc.finish(chunks).unwrap();
    assert!(!enc.is_active());
    let s = InMemoryEncoder::summarize(&bytes).unwrap();
    assert_eq!((s.width, s.height), (4, 2));
    assert_eq!(s.fps, Fps::new(30, 1).unwrap());
    assert_eq!(s.frames(), 2);
    assert_eq!(s.audio_samples, 6_400);
    assert_eq!(s.audio_frames(), 3_200);
    assert_ne!(s.frame_hashes[0], s.frame_hashes[1]);
}

#[test]
fn undrained_output_is_included_on_finish() {
    let mut enc = InMemoryEncoder::new();
    enc.begin(&cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(0)).unwrap();
    let bytes = enc.finish(Vec::new()).unwrap();
    assert_eq!(InMemoryEncoder::summarize(&bytes).unwrap().frames(), 1);
}

#[test]
fn out_of_order_and_mismatched_frames_fail() {
    let mut enc = InMemoryEncoder::new();
    assert!(enc.push_frame(FrameIndex(0), &frame(0)).is_err());
    enc.begin(&cfg()).unwrap();
    assert!(enc.begin(&cfg()).is_err());
    enc.push_frame(FrameIndex(3), &frame(0)).unwrap();
    assert!(enc.push_frame(FrameIndex(3), &frame(0)).is_err());
    let wrong = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(enc.push_frame(FrameIndex(4), &wrong).is_err());
}

#[test]
fn failure_injection() {
    let mut enc = InMemoryEncoder::failing_on_begin();
    assert!(enc.begin(&cfg()).is_err());
    assert!(!enc.is_active());

    let mut enc = InMemoryEncoder::failing_after(1);
    enc.begin(&cfg()).unwrap();
    enc.push_frame(FrameIndex(0), &frame(0)).unwrap();
    let err = enc.push_frame(FrameIndex(1), &frame(0)).unwrap_err();
    assert!(err.to_string().starts_with("encode error:"));
    enc.abort();
    assert!(!enc.is_active());
    assert!(enc.drain_chunks().is_empty());
}

#[test]
fn summarize_rejects_garbage() {
    assert!(InMemoryEncoder::summarize(b"nope").is_err());
    assert!(InMemoryEncoder::summarize(b"REEL\x01").is_err());
}
