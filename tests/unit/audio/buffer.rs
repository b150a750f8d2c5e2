use super::*;

#[test]
fn decode_s16_mono_and_resample_duration() {
    let n = NarrationAudio::from_mono_f32(&vec![0.25; 24_000], 24_000);
    let buf = decode_narration(&n, 48_000).unwrap();
    assert_eq!(buf.sample_rate, 48_000);
    assert_eq!(buf.len(), 48_000);
    assert!((buf.duration_secs() - 1.0).abs() < 1e-9);
    assert!((buf.samples[100] - 0.25).abs() < 1e-3);
}

#[test]
fn decode_f32_stereo_downmixes() {
    let mut bytes = Vec::new();
    for _ in 0..10 {
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-0.1f32).to_le_bytes());
    }
    let n = NarrationAudio {
        sample_rate: 48_000,
        channels: 2,
        format: PcmFormat::F32Le,
        bytes: Arc::new(bytes),
    };
    let buf = decode_narration(&n, 48_000).unwrap();
    assert_eq!(buf.len(), 10);
    assert!((buf.samples[0] - 0.2).abs() < 1e-6);
}

#[test]
fn decode_failures_are_decode_errors() {
    let empty = NarrationAudio::s16le_mono(Vec::new());
    assert!(matches!(
        decode_narration(&empty, 48_000),
        Err(ReelError::Decode(_))
    ));

    let odd = NarrationAudio::s16le_mono(vec![1, 2, 3]);
    assert!(matches!(
        decode_narration(&odd, 48_000),
        Err(ReelError::Decode(_))
    ));

    let mut zero_rate = NarrationAudio::s16le_mono(vec![0, 0]);
    zero_rate.sample_rate = 0;
    assert!(matches!(
        decode_narration(&zero_rate, 48_000),
        Err(ReelError::Decode(_))
    ));

    let nan = NarrationAudio {
        sample_rate: 48_000,
        channels: 1,
        format: PcmFormat::F32Le,
        bytes: Arc::new(f32::NAN.to_le_bytes().to_vec()),
    };
    assert!(matches!(
        decode_narration(&nan, 48_000),
        Err(ReelError::Decode(_))
    ));
}
