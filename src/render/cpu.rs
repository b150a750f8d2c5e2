use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::FrameRGBA;
use crate::render::image::decode_image;
use crate::render::text::{CaptionFont, TextBrushRgba8};
use crate::scene::model::ImagePayload;
use crate::visual::caption::{CaptionLayout, FixedAdvance, TextMeasure};
use crate::visual::frame::{Compositor, ImageSlot, VisualFrame};

const PLACEHOLDER_RGBA: [u8; 4] = [58, 60, 70, 255];
const PANEL_RGBA: [u8; 4] = [0, 0, 0, 255];
const TEXT_BRUSH: TextBrushRgba8 = TextBrushRgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};
const HIGHLIGHT_BRUSH: TextBrushRgba8 = TextBrushRgba8 {
    r: 255,
    g: 208,
    b: 64,
    a: 255,
};

/// Decoded image paint, or `None` when the payload failed to decode.
type CachedImage = Option<(vello_cpu::Image, f64, f64)>;

/// Offline renderer turning [`VisualFrame`]s into premultiplied RGBA8 pixels.
///
/// Missing, generating and undecodable images all become a neutral placeholder; rendering never
/// waits on an asset. Captions are drawn only when a font was supplied with
/// [`FrameRenderer::with_font`].
pub struct FrameRenderer {
    canvas: Canvas,
    width: u16,
    height: u16,
    background_rgba: [u8; 4],
    pixmap: vello_cpu::Pixmap,
    image_cache: Option<(u64, CachedImage)>,
    text: Option<Arc<CaptionFont>>,
    last: Option<FrameRGBA>,
}

impl std::fmt::Debug for FrameRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRenderer")
            .field("canvas", &self.canvas)
            .field("background_rgba", &self.background_rgba)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

impl FrameRenderer {
    /// Create a renderer for `canvas` clearing to `background_rgba` (straight alpha).
    pub fn new(canvas: Canvas, background_rgba: [u8; 4]) -> ReelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::validation("canvas height exceeds u16"))?;
        Ok(Self {
            canvas,
            width,
            height,
            background_rgba,
            pixmap: vello_cpu::Pixmap::new(width, height),
            image_cache: None,
            text: None,
            last: None,
        })
    }

    /// Draw captions with the given TTF/OTF face.
    pub fn with_font(self, font_bytes: Vec<u8>) -> ReelResult<Self> {
        let font = CaptionFont::new(font_bytes)?;
        Ok(self.with_caption_font(Arc::new(font)))
    }

    /// Draw captions with an already loaded face, shared with whoever lays them out.
    pub fn with_caption_font(mut self, font: Arc<CaptionFont>) -> Self {
        self.text = Some(font);
        self
    }

    /// Caption face, when one was supplied.
    pub fn caption_font(&self) -> Option<&Arc<CaptionFont>> {
        self.text.as_ref()
    }

    /// Measure caption layouts must use for their runs to match the drawn glyphs.
    pub fn text_measure(&self) -> &dyn TextMeasure {
        match &self.text {
            Some(font) => font.as_ref(),
            None => &FixedAdvance,
        }
    }

    /// Canvas this renderer draws.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Last frame produced through the [`Compositor`] interface.
    pub fn last_frame(&self) -> Option<&FrameRGBA> {
        self.last.as_ref()
    }

    /// Rasterize `frame`.
    pub fn render(&mut self, frame: &VisualFrame) -> ReelResult<FrameRGBA> {
        if frame.canvas != self.canvas {
            return Err(ReelError::validation(format!(
                "frame canvas {}x{} does not match renderer canvas {}x{}",
                frame.canvas.width, frame.canvas.height, self.canvas.width, self.canvas.height
            )));
        }
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        // render_to_pixmap overwrites the target, so the background is painted as a rect.
        let [r, g, b, a] = self.background_rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));
        let motion = frame.transform.to_affine(self.canvas);

        let paint = match &frame.image {
            ImageSlot::Ready(payload) => self.image_paint_for(payload),
            ImageSlot::Generating | ImageSlot::Missing => None,
        };
        match paint {
            Some((image, iw, ih)) => {
                let fit = cover_fit(self.canvas, iw, ih);
                ctx.set_transform(affine_to_cpu(motion * fit));
                ctx.set_paint(image);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
            }
            None => {
                let [r, g, b, a] = PLACEHOLDER_RGBA;
                ctx.set_transform(affine_to_cpu(motion));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(self.canvas.width),
                    f64::from(self.canvas.height),
                ));
            }
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.draw_caption(&mut ctx, &frame.caption)?;

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_caption(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        caption: &CaptionLayout,
    ) -> ReelResult<()> {
        if let Some(panel) = caption.panel {
            let [r, g, b, a] = PANEL_RGBA;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.push_opacity_layer(panel.opacity);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                f64::from(panel.x),
                f64::from(panel.y),
                f64::from(panel.x + panel.width),
                f64::from(panel.y + panel.height),
            ));
            ctx.pop_layer();
        }

        let Some(text) = self.text.as_deref() else {
            return Ok(());
        };
        for run in &caption.runs {
            let brush = if run.highlighted {
                HIGHLIGHT_BRUSH
            } else {
                TEXT_BRUSH
            };
            let shaped = text.shape(&run.text, caption.font_size, brush, run.x, run.baseline)?;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                shaped.brush.r,
                shaped.brush.g,
                shaped.brush.b,
                shaped.brush.a,
            ));
            ctx.glyph_run(text.font())
                .font_size(shaped.font_size)
                .fill_glyphs(shaped.glyphs.into_iter());
        }
        Ok(())
    }

    fn image_paint_for(&mut self, payload: &ImagePayload) -> Option<(vello_cpu::Image, f64, f64)> {
        let key = payload.content_key();
        if let Some((k, cached)) = &self.image_cache
            && *k == key
        {
            return cached.clone();
        }

        let decoded = decode_image(payload.bytes.as_slice()).and_then(|img| {
            let pixmap = image_premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?;
            Ok((
                vello_cpu::Image {
                    image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                    sampler: vello_cpu::peniko::ImageSampler::default(),
                },
                f64::from(img.width),
                f64::from(img.height),
            ))
        });
        let cached = match decoded {
            Ok(paint) => Some(paint),
            Err(err) => {
                tracing::warn!(%err, "scene image unusable; drawing placeholder");
                None
            }
        };
        self.image_cache = Some((key, cached.clone()));
        cached
    }
}

impl Compositor for FrameRenderer {
    fn present(&mut self, frame: &VisualFrame) -> ReelResult<()> {
        self.last = Some(self.render(frame)?);
        Ok(())
    }
}

/// Scale-to-cover placement of an `iw` x `ih` image, centered on `canvas`.
pub(crate) fn cover_fit(canvas: Canvas, iw: f64, ih: f64) -> kurbo::Affine {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let s = (cw / iw).max(ch / ih);
    kurbo::Affine::translate(((cw - iw * s) * 0.5, (ch - ih * s) * 0.5)) * kurbo::Affine::scale(s)
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::decode("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::decode("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::decode("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
