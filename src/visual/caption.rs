use smallvec::SmallVec;

/// Caption layout policy, chosen by the application per run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    /// Large centered type with per-word emphasis (short-form).
    #[default]
    Kinetic,
    /// Bottom-anchored type on a translucent panel (long-form).
    Subtitle,
}

/// Advance width of one character, in ems. Shared by both backends so wrapping is identical.
pub const ADVANCE_EM: f32 = 0.56;
/// Distance from a line's top to its baseline, in ems.
pub const ASCENT_EM: f32 = 0.8;
/// Line pitch, in ems.
pub const LINE_HEIGHT_EM: f32 = 1.25;
/// Fraction of the viewport width available to a line.
pub const WRAP_FRACTION: f32 = 0.8;

const KINETIC_SIZE_FRACTION: f32 = 0.075;
const SUBTITLE_SIZE_FRACTION: f32 = 0.04;
const SUBTITLE_BOTTOM_MARGIN: f32 = 0.08;
const PANEL_PADDING_EM: f32 = 0.5;
const PANEL_OPACITY: f32 = 0.6;
const MIN_FONT_PX: f32 = 12.0;

/// A stretch of caption text with markup removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmphasisSpan {
    /// Plain text.
    pub text: String,
    /// Whether the text was inside emphasis markup.
    pub highlighted: bool,
}

/// Split `text` into plain and emphasized spans.
///
/// `**phrase**` and `*phrase*` both mark emphasis. A marker without a closing partner is kept as
/// literal text. Adjacent spans with the same flag are merged; empty spans are dropped.
pub fn parse_emphasis(text: &str) -> Vec<EmphasisSpan> {
    let mut out: Vec<EmphasisSpan> = Vec::new();
    let mut push = |s: &str, highlighted: bool| {
        if s.is_empty() {
            return;
        }
        match out.last_mut() {
            Some(last) if last.highlighted == highlighted => last.text.push_str(s),
            _ => out.push(EmphasisSpan {
                text: s.to_string(),
                highlighted,
            }),
        }
    };

    let mut rest = text;
    while let Some(open) = rest.find('*') {
        let marker = if rest[open..].starts_with("**") {
            "**"
        } else {
            "*"
        };
        let body_start = open + marker.len();
        let Some(close_rel) = rest[body_start..].find(marker) else {
            push(&rest[..body_start], false);
            rest = &rest[body_start..];
            continue;
        };
        push(&rest[..open], false);
        let inner = &rest[body_start..body_start + close_rel];
        push(&inner.replace('*', ""), true);
        rest = &rest[body_start + close_rel + marker.len()..];
    }
    push(rest, false);
    out
}

/// Text with all emphasis markup removed.
pub fn strip_emphasis(text: &str) -> String {
    parse_emphasis(text)
        .into_iter()
        .map(|s| s.text)
        .collect::<String>()
}

/// Deterministic advance width of `text` at `font_size` pixels.
pub fn advance_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * ADVANCE_EM * font_size
}

/// Horizontal advance of a piece of caption text, in pixels.
///
/// Layout and glyph drawing must agree on this, so a renderer that shapes with a real face hands
/// the same measure to [`compute_caption_layout_with`].
pub trait TextMeasure: std::fmt::Debug + Send + Sync {
    /// Advance of `text` set on one line at `font_size` pixels, trailing whitespace included.
    fn advance(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed per-character metric ([`advance_width`]); used when no caption face is loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedAdvance;

impl TextMeasure for FixedAdvance {
    fn advance(&self, text: &str, font_size: f32) -> f32 {
        advance_width(text, font_size)
    }
}

/// One positioned piece of caption text.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionRun {
    /// Text to draw (markup stripped).
    pub text: String,
    /// Left edge in canvas pixels.
    pub x: f32,
    /// Baseline in canvas pixels.
    pub baseline: f32,
    /// Measured advance width.
    pub width: f32,
    /// Zero-based line number.
    pub line: usize,
    /// Whether the run was emphasized.
    pub highlighted: bool,
}

/// Translucent backing rectangle for subtitle captions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionPanel {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Fill opacity in `[0, 1]`.
    pub opacity: f32,
}

/// Caption geometry for one viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    /// Mode the layout was computed for.
    pub mode: CaptionMode,
    /// Font size in pixels.
    pub font_size: f32,
    /// Line pitch in pixels.
    pub line_height: f32,
    /// Runs in reading order.
    pub runs: Vec<CaptionRun>,
    /// Backing panel (subtitle mode with text only).
    pub panel: Option<CaptionPanel>,
}

impl CaptionLayout {
    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.runs.last().map(|r| r.line + 1).unwrap_or(0)
    }
}

/// A whitespace-delimited word; emphasis may cover only part of it.
#[derive(Clone, Debug)]
struct Word {
    fragments: SmallVec<[Fragment; 1]>,
    width: f32,
}

#[derive(Clone, Debug)]
struct Fragment {
    text: String,
    highlighted: bool,
    width: f32,
}

impl Word {
    fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Group emphasis spans into words, splitting only at whitespace.
fn split_words(spans: &[EmphasisSpan]) -> Vec<Vec<(String, bool)>> {
    let mut words: Vec<Vec<(String, bool)>> = Vec::new();
    let mut current: Vec<(String, bool)> = Vec::new();
    for span in spans {
        for ch in span.text.chars() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                continue;
            }
            match current.last_mut() {
                Some((text, hl)) if *hl == span.highlighted => text.push(ch),
                _ => current.push((ch.to_string(), span.highlighted)),
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Lay out `text` for a `viewport_width` x `viewport_height` viewport.
///
/// Kinetic mode yields one run per word fragment, centered as a block, with emphasis flags.
/// Subtitle mode yields one run per line, bottom-anchored above a margin, behind a translucent
/// panel, with no emphasis. Both wrap greedily at 80% of the viewport width; a word wider than
/// that gets a line of its own.
///
/// Widths come from the fixed [`advance_width`] metric; use [`compute_caption_layout_with`] when a
/// caption face is available.
pub fn compute_caption_layout(
    text: &str,
    mode: CaptionMode,
    viewport_width: u32,
    viewport_height: u32,
) -> CaptionLayout {
    compute_caption_layout_with(text, mode, viewport_width, viewport_height, &FixedAdvance)
}

/// [`compute_caption_layout`] with widths taken from `measure`.
///
/// A word whose emphasis covers only part of it stays one unit for wrapping; in kinetic mode
/// its pieces become adjacent runs with no gap between them.
pub fn compute_caption_layout_with(
    text: &str,
    mode: CaptionMode,
    viewport_width: u32,
    viewport_height: u32,
    measure: &dyn TextMeasure,
) -> CaptionLayout {
    let vw = viewport_width as f32;
    let vh = viewport_height as f32;
    let short_side = vw.min(vh);
    let font_size = match mode {
        CaptionMode::Kinetic => short_side * KINETIC_SIZE_FRACTION,
        CaptionMode::Subtitle => short_side * SUBTITLE_SIZE_FRACTION,
    }
    .max(MIN_FONT_PX);
    let line_height = font_size * LINE_HEIGHT_EM;
    let max_width = vw * WRAP_FRACTION;
    let space = measure.advance(" ", font_size);

    let words: Vec<Word> = split_words(&parse_emphasis(text))
        .into_iter()
        .map(|pieces| {
            let fragments: SmallVec<[Fragment; 1]> = pieces
                .into_iter()
                .map(|(text, highlighted)| Fragment {
                    width: measure.advance(&text, font_size),
                    highlighted: highlighted && mode == CaptionMode::Kinetic,
                    text,
                })
                .collect();
            let width = fragments.iter().map(|f| f.width).sum();
            Word { fragments, width }
        })
        .collect();

    let lines = wrap_words(words, max_width, space);
    let line_widths: Vec<f32> = lines.iter().map(|l| line_width(l, space)).collect();
    let block_height = lines.len() as f32 * line_height;

    let top = match mode {
        CaptionMode::Kinetic => (vh - block_height) * 0.5,
        CaptionMode::Subtitle => vh - vh * SUBTITLE_BOTTOM_MARGIN - block_height,
    };

    let mut runs = Vec::new();
    for (i, (line, width)) in lines.iter().zip(&line_widths).enumerate() {
        let left = (vw - width) * 0.5;
        let baseline = top + i as f32 * line_height + font_size * ASCENT_EM;
        match mode {
            CaptionMode::Kinetic => {
                let mut x = left;
                for w in line {
                    let mut fx = x;
                    for f in &w.fragments {
                        runs.push(CaptionRun {
                            text: f.text.clone(),
                            x: fx,
                            baseline,
                            width: f.width,
                            line: i,
                            highlighted: f.highlighted,
                        });
                        fx += f.width;
                    }
                    x += w.width + space;
                }
            }
            CaptionMode::Subtitle => runs.push(CaptionRun {
                text: line.iter().map(Word::text).collect::<Vec<_>>().join(" "),
                x: left,
                baseline,
                width: *width,
                line: i,
                highlighted: false,
            }),
        }
    }

    let panel = (mode == CaptionMode::Subtitle && !runs.is_empty()).then(|| {
        let pad = font_size * PANEL_PADDING_EM;
        let widest = line_widths.iter().copied().fold(0.0f32, f32::max);
        CaptionPanel {
            x: (vw - widest) * 0.5 - pad,
            y: top - pad,
            width: widest + 2.0 * pad,
            height: block_height + 2.0 * pad,
            opacity: PANEL_OPACITY,
        }
    });

    CaptionLayout {
        mode,
        font_size,
        line_height,
        runs,
        panel,
    }
}

fn wrap_words(words: Vec<Word>, max_width: f32, space: f32) -> Vec<Vec<Word>> {
    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut current_width = 0.0f32;
    for w in words {
        let needed = if current.is_empty() {
            w.width
        } else {
            current_width + space + w.width
        };
        if !current.is_empty() && needed > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = w.width;
        } else {
            current_width = needed;
        }
        current.push(w);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn line_width(line: &[Word], space: f32) -> f32 {
    let words: f32 = line.iter().map(|w| w.width).sum();
    words + space * line.len().saturating_sub(1) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/visual/caption.rs"]
mod tests;
