use std::io::Cursor;

use super::*;
use crate::scene::model::{MotionDirective, Scene};
use crate::visual::caption::CaptionMode;
use crate::visual::frame::sample_frame;

fn canvas() -> Canvas {
    Canvas::new(64, 36).unwrap()
}

fn solid_png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn near(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
}

fn frame_for(scene: &Scene, mode: CaptionMode) -> VisualFrame {
    sample_frame(scene, 0.5, 1.0, canvas(), mode)
}

#[test]
fn missing_image_draws_placeholder() {
    let mut r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    let scene = Scene::new("a", "", MotionDirective::ZoomIn);
    let out = r.render(&frame_for(&scene, CaptionMode::Kinetic)).unwrap();
    assert_eq!((out.width, out.height), (64, 36));
    assert_eq!(out.data.len(), 64 * 36 * 4);
    assert!(out.premultiplied);
    assert!(near(out.pixel(32, 18).unwrap(), PLACEHOLDER_RGBA));
}

#[test]
fn ready_image_covers_canvas() {
    let mut r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    let scene = Scene::new("a", "", MotionDirective::PanLeft)
        .with_image(ImagePayload::new(solid_png([200, 10, 10, 255])));
    let out = r.render(&frame_for(&scene, CaptionMode::Kinetic)).unwrap();
    assert!(near(out.pixel(32, 18).unwrap(), [200, 10, 10, 255]));
    assert!(near(out.pixel(2, 2).unwrap(), [200, 10, 10, 255]));
}

#[test]
fn undecodable_image_falls_back_to_placeholder() {
    let mut r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    let scene = Scene::new("a", "", MotionDirective::ZoomOut)
        .with_image(ImagePayload::new(b"nope".to_vec()));
    let out = r.render(&frame_for(&scene, CaptionMode::Kinetic)).unwrap();
    assert!(near(out.pixel(32, 18).unwrap(), PLACEHOLDER_RGBA));
    // The failure is cached; the second render is identical.
    let again = r.render(&frame_for(&scene, CaptionMode::Kinetic)).unwrap();
    assert_eq!(out, again);
}

#[test]
fn subtitle_panel_darkens_bottom() {
    let mut r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    let scene = Scene::new("a", "hi", MotionDirective::ZoomIn)
        .with_image(ImagePayload::new(solid_png([255, 255, 255, 255])));
    let frame = frame_for(&scene, CaptionMode::Subtitle);
    let panel = frame.caption.panel.unwrap();
    let out = r.render(&frame).unwrap();

    let px = out
        .pixel(32, (panel.y + panel.height * 0.5) as u32)
        .unwrap();
    assert!(px[0] < 200, "panel pixel {px:?}");
    assert!(near(out.pixel(32, 2).unwrap(), [255, 255, 255, 255]));
}

#[test]
fn canvas_mismatch_is_rejected() {
    let mut r = FrameRenderer::new(Canvas::new(32, 32).unwrap(), [0, 0, 0, 255]).unwrap();
    let scene = Scene::new("a", "", MotionDirective::ZoomIn);
    assert!(r.render(&frame_for(&scene, CaptionMode::Kinetic)).is_err());
}

#[test]
fn compositor_interface_keeps_last_frame() {
    let mut r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    assert!(r.last_frame().is_none());
    let scene = Scene::new("a", "", MotionDirective::ZoomIn);
    let frame = frame_for(&scene, CaptionMode::Kinetic);
    r.present(&frame).unwrap();
    let direct = r.render(&frame).unwrap();
    assert_eq!(r.last_frame(), Some(&direct));
}

#[test]
fn cover_fit_fills_both_axes() {
    let a = cover_fit(canvas(), 8.0, 8.0);
    let tl = a * kurbo::Point::new(0.0, 0.0);
    let br = a * kurbo::Point::new(8.0, 8.0);
    assert!(tl.x <= 0.0 && tl.y <= 0.0);
    assert!(br.x >= 64.0 && br.y >= 36.0);
}

#[test]
fn background_shows_outside_a_shrunken_image() {
    let mut r = FrameRenderer::new(canvas(), [10, 200, 10, 255]).unwrap();
    let scene = Scene::new("a", "", MotionDirective::ZoomIn);
    let mut frame = frame_for(&scene, CaptionMode::Kinetic);
    frame.transform.scale = 0.5;
    let out = r.render(&frame).unwrap();
    assert!(near(out.pixel(1, 1).unwrap(), [10, 200, 10, 255]));
    assert!(near(out.pixel(32, 18).unwrap(), PLACEHOLDER_RGBA));
}

#[test]
fn fontless_renderer_measures_with_the_fixed_metric() {
    let r = FrameRenderer::new(canvas(), [0, 0, 0, 255]).unwrap();
    assert!(r.caption_font().is_none());
    assert_eq!(
        r.text_measure().advance("WOW", 20.0),
        crate::visual::caption::advance_width("WOW", 20.0)
    );
}

#[test]
fn caption_runs_are_measured_with_the_drawing_face() {
    let Some(bytes) = crate::render::text::tests::system_font() else {
        eprintln!("skipping: no system TTF found");
        return;
    };
    let r = FrameRenderer::new(canvas(), [0, 0, 0, 255])
        .unwrap()
        .with_font(bytes)
        .unwrap();
    let font = r.caption_font().unwrap().clone();
    let layout = crate::visual::caption::compute_caption_layout_with(
        "WOW mountains",
        CaptionMode::Kinetic,
        1080,
        1920,
        r.text_measure(),
    );
    for run in &layout.runs {
        let shaped = font
            .shape(&run.text, layout.font_size, TEXT_BRUSH, run.x, run.baseline)
            .unwrap();
        let last = shaped.glyphs.last().unwrap();
        assert!(last.x < run.x + run.width, "{} overruns its run", run.text);
    }
}
