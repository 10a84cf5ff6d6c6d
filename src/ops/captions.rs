// ============================================================================
// CAPTION LAYOUT — wrapping, auto-sizing, anchored/rotated placement
// ============================================================================
//
// Pure text-block geometry. Measurement is abstracted behind [`TextMeasure`]
// so this module needs no font data: the app binds an ab_glyph measurer
// (ops::text), tests use fixed-advance fakes.

use crate::collage::{CaptionConfig, CaptionStyle, Rect};

/// Visual padding between caption text and the panel edge. Also the margin
/// added around the activation hit-box.
pub const CAPTION_PADDING: f32 = 10.0;

/// Shown at reduced opacity when a populated panel has no caption yet.
/// Interactive preview only; the export path never draws it.
pub const PLACEHOLDER_TEXT: &str = "Add a caption";
pub const PLACEHOLDER_OPACITY: f32 = 0.35;

/// Hard default size used when a caption has no explicit size and no
/// content to auto-fit against (i.e. the placeholder).
pub const DEFAULT_FONT_SIZE: f32 = 26.0;

const AUTO_MIN_RESULT: f32 = 12.0;
const AUTO_PROBE_FLOOR: f32 = 8.0;
const AUTO_STEP: f32 = 2.0;
const AUTO_MAX_BLOCK_FRACTION: f32 = 0.4;

/// Text measurement capability supplied by the host (font + canvas context
/// equivalent). Widths/heights are in surface pixels at the given size.
pub trait TextMeasure {
    fn line_width(&self, text: &str, style: &CaptionStyle, size: f32) -> f32;
    fn line_height(&self, style: &CaptionStyle, size: f32) -> f32;
}

/// A caption's resolved geometry within its panel (panel-local coordinates).
#[derive(Clone, Debug)]
pub struct CaptionLayout {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    /// Unrotated block extents.
    pub block_w: f32,
    pub block_h: f32,
    /// Top-left of the unrotated block.
    pub block_x: f32,
    pub block_y: f32,
    pub rotation_deg: f32,
    /// AABB of the (possibly rotated) block plus padding; tap-to-edit zone.
    pub hit_box: Rect,
    /// True when this is the preview-only placeholder, not real content.
    pub placeholder: bool,
}

// ---------------------------------------------------------------------------
//  Wrapping
// ---------------------------------------------------------------------------

/// Wrap caption text into lines no wider than `avail_w`.
///
/// Manual newlines split first; words pack greedily; a single word wider
/// than the available width falls back to character-level splitting, which
/// always advances at least one char per line and therefore terminates for
/// any input.
pub fn wrap_lines(
    content: &str,
    avail_w: f32,
    style: &CaptionStyle,
    size: f32,
    measure: &dyn TextMeasure,
) -> Vec<String> {
    let mut out = Vec::new();
    for raw_line in content.split('\n') {
        if raw_line.trim().is_empty() {
            out.push(String::new());
            continue;
        }
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if measure.line_width(&candidate, style, size) <= avail_w {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if measure.line_width(word, style, size) <= avail_w {
                current = word.to_string();
            } else {
                current = split_long_token(word, avail_w, style, size, measure, &mut out);
            }
        }
        out.push(current);
    }
    out
}

/// Character-level fallback for a token wider than the available width.
/// Emits full lines into `out` and returns the unfinished remainder.
fn split_long_token(
    word: &str,
    avail_w: f32,
    style: &CaptionStyle,
    size: f32,
    measure: &dyn TextMeasure,
    out: &mut Vec<String>,
) -> String {
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && measure.line_width(&candidate, style, size) > avail_w {
            out.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }
    current
}

// ---------------------------------------------------------------------------
//  Auto font size
// ---------------------------------------------------------------------------

/// Largest size (stepping down in 2px increments) whose wrapped block fits
/// within 40% of the panel height. Starts at `min(48, max(16, 0.15 × panelH))`
/// and never returns below 12px.
pub fn auto_font_size(
    content: &str,
    panel_w: f32,
    panel_h: f32,
    style: &CaptionStyle,
    measure: &dyn TextMeasure,
) -> f32 {
    let avail_w = (panel_w - 2.0 * CAPTION_PADDING).max(1.0);
    let start = 48.0f32.min(16.0f32.max(panel_h * 0.15));

    let mut size = start;
    while size >= AUTO_PROBE_FLOOR {
        let lines = wrap_lines(content, avail_w, style, size, measure);
        let block_h = lines.len() as f32 * measure.line_height(style, size);
        if block_h <= AUTO_MAX_BLOCK_FRACTION * panel_h {
            return size.max(AUTO_MIN_RESULT);
        }
        size -= AUTO_STEP;
    }
    AUTO_MIN_RESULT
}

// ---------------------------------------------------------------------------
//  Placement
// ---------------------------------------------------------------------------

/// Map the vertical position parameter (−100..=100) to the anchor — the
/// bottom edge of the text block. −100 reaches 10% past the panel's bottom
/// edge, 0 sits at 95% of the height, +100 is flush with the top edge;
/// linear within each half-range.
pub fn anchor_y(pos_y: f32, panel_h: f32) -> f32 {
    let pos = pos_y.clamp(-100.0, 100.0);
    let frac = if pos <= 0.0 {
        let t = (pos + 100.0) / 100.0;
        1.10 + (0.95 - 1.10) * t
    } else {
        let t = pos / 100.0;
        0.95 + (0.0 - 0.95) * t
    };
    frac * panel_h
}

/// Map the horizontal position parameter to the block's center X, sliding
/// linearly from the left padding to the right padding.
pub fn center_x(pos_x: f32, panel_w: f32) -> f32 {
    let t = (pos_x.clamp(-100.0, 100.0) + 100.0) / 200.0;
    CAPTION_PADDING + (panel_w - 2.0 * CAPTION_PADDING).max(0.0) * t
}

/// Rotate the four corners of a rect about its center and return the
/// axis-aligned bounding box of the result.
pub fn rotated_aabb(rect: Rect, rotation_deg: f32) -> Rect {
    if rotation_deg == 0.0 {
        return rect;
    }
    let (sin, cos) = rotation_deg.to_radians().sin_cos();
    let cx = rect.x + rect.w * 0.5;
    let cy = rect.y + rect.h * 0.5;
    let corners = [
        (rect.x, rect.y),
        (rect.right(), rect.y),
        (rect.right(), rect.bottom()),
        (rect.x, rect.bottom()),
    ];
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for (x, y) in corners {
        let dx = x - cx;
        let dy = y - cy;
        let rx = cx + dx * cos - dy * sin;
        let ry = cy + dx * sin + dy * cos;
        min_x = min_x.min(rx);
        min_y = min_y.min(ry);
        max_x = max_x.max(rx);
        max_y = max_y.max(ry);
    }
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

/// Lay out a panel's caption. Returns `None` when there is nothing to draw:
/// no content and no image (the placeholder only appears on populated
/// panels).
pub fn layout_caption(
    panel_w: f32,
    panel_h: f32,
    cfg: &CaptionConfig,
    has_image: bool,
    measure: &dyn TextMeasure,
) -> Option<CaptionLayout> {
    let placeholder = !cfg.has_content();
    if placeholder && !has_image {
        return None;
    }
    let text = if placeholder { PLACEHOLDER_TEXT } else { cfg.content.as_str() };
    let style = &cfg.style;

    let font_size = match style.size {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ if placeholder => DEFAULT_FONT_SIZE,
        _ => auto_font_size(text, panel_w, panel_h, style, measure),
    };

    let avail_w = (panel_w - 2.0 * CAPTION_PADDING).max(1.0);
    let lines = wrap_lines(text, avail_w, style, font_size, measure);
    let line_height = measure.line_height(style, font_size);
    let block_w = lines
        .iter()
        .map(|l| measure.line_width(l, style, font_size))
        .fold(0.0f32, f32::max)
        .max(1.0);
    let block_h = (lines.len() as f32 * line_height).max(1.0);

    // The anchor is the bottom edge: the block grows upward from it.
    let block_y = anchor_y(style.pos_y, panel_h) - block_h;
    let block_x = center_x(style.pos_x, panel_w) - block_w * 0.5;

    let unrotated = Rect::new(block_x, block_y, block_w, block_h);
    let aabb = rotated_aabb(unrotated, style.rotation);
    let hit_box = Rect::new(
        aabb.x - CAPTION_PADDING,
        aabb.y - CAPTION_PADDING,
        aabb.w + 2.0 * CAPTION_PADDING,
        aabb.h + 2.0 * CAPTION_PADDING,
    );

    Some(CaptionLayout {
        lines,
        font_size,
        line_height,
        block_w,
        block_h,
        block_x,
        block_y,
        rotation_deg: style.rotation,
        hit_box,
        placeholder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Fixed-advance measurer: every char is `char_w` wide.
    struct Mono {
        char_w: f32,
        line_h: f32,
    }

    impl TextMeasure for Mono {
        fn line_width(&self, text: &str, _style: &CaptionStyle, _size: f32) -> f32 {
            text.chars().count() as f32 * self.char_w
        }
        fn line_height(&self, _style: &CaptionStyle, _size: f32) -> f32 {
            self.line_h
        }
    }

    /// Size-proportional measurer for auto-size tests.
    struct Scaled;

    impl TextMeasure for Scaled {
        fn line_width(&self, text: &str, _style: &CaptionStyle, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.6
        }
        fn line_height(&self, _style: &CaptionStyle, size: f32) -> f32 {
            size * 1.2
        }
    }

    fn style() -> CaptionStyle {
        CaptionStyle::default()
    }

    #[test]
    fn manual_breaks_come_first() {
        let m = Mono { char_w: 1.0, line_h: 10.0 };
        let lines = wrap_lines("one\ntwo three", 100.0, &style(), 12.0, &m);
        assert_eq!(lines, vec!["one", "two three"]);
    }

    #[test]
    fn words_pack_greedily() {
        let m = Mono { char_w: 10.0, line_h: 10.0 };
        // 8 chars fit per 80px line.
        let lines = wrap_lines("aa bb cc dd", 80.0, &style(), 12.0, &m);
        assert_eq!(lines, vec!["aa bb cc", "dd"]);
    }

    #[test]
    fn unbreakable_token_splits_by_character() {
        let m = Mono { char_w: 10.0, line_h: 10.0 };
        let token = "A-very-long-unbroken-token-exceeding-panel-width";
        // 100px panel: 80px available after padding → 8 chars per line.
        let avail = 100.0 - 2.0 * CAPTION_PADDING;
        let lines = wrap_lines(token, avail, &style(), 12.0, &m);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(m.line_width(line, &style(), 12.0) <= avail, "line {:?} too wide", line);
        }
        // Nothing was lost in the split.
        assert_eq!(lines.concat(), token);
    }

    #[test]
    fn auto_size_respects_block_height_budget() {
        let text = "a few words of caption text";
        let size = auto_font_size(text, 400.0, 300.0, &style(), &Scaled);
        let lines = wrap_lines(text, 380.0, &style(), size, &Scaled);
        let block_h = lines.len() as f32 * Scaled.line_height(&style(), size);
        assert!(block_h <= 0.4 * 300.0 + 1e-3);
        assert!(size >= 12.0);
        // Start cap: min(48, max(16, 0.15×300)) = 45.
        assert!(size <= 45.0);
    }

    #[test]
    fn auto_size_never_drops_below_twelve() {
        // Pathological amount of text in a tiny panel.
        let text = "word ".repeat(200);
        let size = auto_font_size(&text, 60.0, 40.0, &style(), &Scaled);
        assert_eq!(size, 12.0);
    }

    #[test]
    fn anchor_mapping_hits_the_documented_points() {
        assert!((anchor_y(-100.0, 200.0) - 220.0).abs() < 1e-3);
        assert!((anchor_y(0.0, 200.0) - 190.0).abs() < 1e-3);
        assert!((anchor_y(100.0, 200.0) - 0.0).abs() < 1e-3);
        // Halfway points are linear within each half-range.
        assert!((anchor_y(-50.0, 200.0) - 205.0).abs() < 1e-3);
        assert!((anchor_y(50.0, 200.0) - 95.0).abs() < 1e-3);
    }

    #[test]
    fn horizontal_mapping_slides_between_the_paddings() {
        assert_eq!(center_x(-100.0, 400.0), CAPTION_PADDING);
        assert_eq!(center_x(100.0, 400.0), 400.0 - CAPTION_PADDING);
        assert_eq!(center_x(0.0, 400.0), 200.0);
    }

    #[test]
    fn rotated_hit_box_covers_the_rotated_corners() {
        let rect = Rect::new(10.0, 20.0, 100.0, 20.0);
        let aabb = rotated_aabb(rect, 90.0);
        // A 90° rotation about the center swaps the extents.
        assert!((aabb.w - 20.0).abs() < 1e-3);
        assert!((aabb.h - 100.0).abs() < 1e-3);
        let (cx0, cy0) = (rect.x + 50.0, rect.y + 10.0);
        let (cx1, cy1) = (aabb.x + aabb.w * 0.5, aabb.y + aabb.h * 0.5);
        assert!((cx0 - cx1).abs() < 1e-3 && (cy0 - cy1).abs() < 1e-3);
    }

    #[test]
    fn placeholder_only_on_populated_panels() {
        let m = Mono { char_w: 5.0, line_h: 10.0 };
        let cfg = CaptionConfig::default();
        assert!(layout_caption(200.0, 200.0, &cfg, false, &m).is_none());
        let layout = layout_caption(200.0, 200.0, &cfg, true, &m).expect("placeholder");
        assert!(layout.placeholder);
        assert_eq!(layout.lines, vec![PLACEHOLDER_TEXT.to_string()]);
        assert_eq!(layout.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn real_content_is_never_marked_placeholder() {
        let m = Mono { char_w: 5.0, line_h: 10.0 };
        let cfg = CaptionConfig { content: "hello".into(), ..Default::default() };
        let layout = layout_caption(200.0, 200.0, &cfg, false, &m).expect("content");
        assert!(!layout.placeholder);
    }

    proptest! {
        /// Wrap termination + width bound for arbitrary input, including
        /// pathological unbroken tokens.
        #[test]
        fn wrap_terminates_and_respects_width(
            text in "[ a-zA-Z0-9\\-\\n]{0,200}",
            avail in 12.0f32..400.0,
        ) {
            let m = Mono { char_w: 10.0, line_h: 10.0 };
            let lines = wrap_lines(&text, avail, &style(), 12.0, &m);
            for line in &lines {
                prop_assert!(m.line_width(line, &style(), 12.0) <= avail);
            }
        }

        /// The anchor mapping is monotonically decreasing in pos_y.
        #[test]
        fn anchor_is_monotonic(a in -100.0f32..100.0, b in -100.0f32..100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(anchor_y(lo, 200.0) >= anchor_y(hi, 200.0) - 1e-4);
        }
    }
}
