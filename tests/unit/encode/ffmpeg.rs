use super::*;

use crate::foundation::core::Fps;

fn cfg() -> EncoderConfig {
    EncoderConfig {
        width: 2,
        height: 2,
        fps: Fps::new(30, 1).unwrap(),
        sample_rate: 48_000,
        channels: 2,
        video_bitrate_kbps: 500,
        audio_bitrate_kbps: 96,
        bg_rgba: [0, 0, 0, 255],
    }
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_straight_half_alpha_blends() {
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, false, [0, 0, 255, 255]).unwrap();
    assert_eq!(dst[3], 255);
    assert!((127..=129).contains(&dst[0]));
    assert!((126..=128).contains(&dst[2]));
}

#[test]
fn flatten_rejects_length_mismatch() {
    let mut dst = vec![0u8; 8];
    let res = flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], true, [0; 4]);
    assert!(res.is_err());
}

#[test]
fn idle_encoder_rejects_pushes() {
    let mut enc = FfmpegEncoder::new();
    assert_eq!(enc.file_extension(), "mp4");
    assert!(enc.push_audio(&[0.0]).is_err());
    assert!(enc.drain_chunks().is_empty());
    assert!(enc.finish(Vec::new()).is_err());
    enc.abort();
}

#[test]
fn temp_guard_removes_file() {
    let path = temp_path("guard", "bin");
    std::fs::write(&path, b"x").unwrap();
    {
        let _guard = TempFileGuard(Some(path.clone()));
    }
    assert!(!path.exists());
}

#[test]
fn encodes_short_clip_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let mut enc = FfmpegEncoder::new();
    enc.begin(&cfg()).unwrap();
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![200; 16],
        premultiplied: true,
    };
    let mut chunks = Vec::new();
    for i in 0..6 {
        enc.push_frame(FrameIndex(i), &frame).unwrap();
        enc.push_audio(&[0.0; 3_200]).unwrap();
        chunks.extend(enc.drain_chunks());
    }
    let bytes = enc.finish(chunks).unwrap();
    assert!(bytes.len() > 8);
    assert_eq!(&bytes[4..8], b"ftyp");
}
