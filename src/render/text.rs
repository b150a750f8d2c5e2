use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::foundation::error::{ReelError, ReelResult};
use crate::visual::caption::{TextMeasure, advance_width};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

/// Shaped glyphs of one caption run, already in canvas coordinates.
#[derive(Clone, Debug)]
pub struct ShapedRun {
    /// Glyphs positioned at the run's origin and baseline.
    pub glyphs: Vec<vello_cpu::Glyph>,
    /// Font size the glyphs were shaped at.
    pub font_size: f32,
    /// Fill color.
    pub brush: TextBrushRgba8,
}

/// Shapes caption runs with one user-supplied font.
pub struct CaptionTextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for CaptionTextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionTextEngine")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl CaptionTextEngine {
    /// Register `font_bytes` (TTF/OTF) as the caption face.
    pub fn new(font_bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0),
        })
    }

    /// Font handle for `vello_cpu` glyph runs.
    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Full single-line advance of `text` at `size_px`, trailing whitespace included.
    pub fn measure(&mut self, text: &str, size_px: f32) -> ReelResult<f32> {
        let layout = self.layout(text, size_px, TextBrushRgba8::default())?;
        Ok(layout
            .lines()
            .map(|line| line.metrics().advance)
            .fold(0.0f32, f32::max))
    }

    fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Shape `text` on a single line with its origin at `x` and its baseline at `baseline`.
    pub fn shape(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        x: f32,
        baseline: f32,
    ) -> ReelResult<ShapedRun> {
        let layout = self.layout(text, size_px, brush)?;

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            let line_baseline = line.metrics().baseline;
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: x + g.x,
                    y: baseline + (g.y - line_baseline),
                }));
            }
        }

        Ok(ShapedRun {
            glyphs,
            font_size: size_px,
            brush,
        })
    }
}

/// A caption face shared by layout and drawing.
///
/// Implements [`TextMeasure`] so [`compute_caption_layout_with`] positions runs with the same
/// advances the glyphs are drawn with. Widths are cached per (text, size).
///
/// [`compute_caption_layout_with`]: crate::visual::caption::compute_caption_layout_with
pub struct CaptionFont {
    font: vello_cpu::peniko::FontData,
    family_name: String,
    state: Mutex<FontState>,
}

struct FontState {
    engine: CaptionTextEngine,
    widths: HashMap<(String, u32), f32>,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl CaptionFont {
    /// Load `font_bytes` (TTF/OTF).
    pub fn new(font_bytes: Vec<u8>) -> ReelResult<Self> {
        let engine = CaptionTextEngine::new(font_bytes)?;
        Ok(Self {
            font: engine.font().clone(),
            family_name: engine.family_name.clone(),
            state: Mutex::new(FontState {
                engine,
                widths: HashMap::new(),
            }),
        })
    }

    /// Family name registered from the font bytes.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Font handle for `vello_cpu` glyph runs.
    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// See [`CaptionTextEngine::shape`].
    pub fn shape(
        &self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
        x: f32,
        baseline: f32,
    ) -> ReelResult<ShapedRun> {
        self.lock().engine.shape(text, size_px, brush, x, baseline)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FontState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TextMeasure for CaptionFont {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        let mut state = self.lock();
        let key = (text.to_string(), font_size.to_bits());
        if let Some(w) = state.widths.get(&key) {
            return *w;
        }
        let width = match state.engine.measure(text, font_size) {
            Ok(w) => w,
            Err(err) => {
                tracing::warn!(%err, "caption measure failed; using fixed metric");
                advance_width(text, font_size)
            }
        };
        state.widths.insert(key, width);
        width
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
pub(crate) mod tests;
