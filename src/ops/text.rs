// ============================================================================
// CAPTION RASTERIZATION — ab_glyph glyph drawing, stroke outline, rotation
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, ScaleFont, point};
use image::RgbaImage;

use crate::collage::{CaptionStyle, HAlign, Rect};
use crate::ops::captions::{CaptionLayout, TextMeasure};

// ---------------------------------------------------------------------------
//  Font loading (font-kit)
// ---------------------------------------------------------------------------

/// System font cache keyed by (family, weight, italic). Lookup failures are
/// cached too, so a missing family costs one font-kit query per session.
/// Interior-mutable so one shared store serves the renderer and the text
/// measurer in the same pass.
#[derive(Default)]
pub struct FontStore {
    cache: Mutex<HashMap<(String, u16, bool), Option<FontArc>>>,
}

impl FontStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Font for a caption style, falling back to any sans-serif the system
    /// can offer. `None` means no usable font exists at all; callers skip
    /// the caption rather than fail.
    pub fn get(&self, style: &CaptionStyle) -> Option<FontArc> {
        let mut cache = match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (style.family.clone(), style.weight, style.italic);
        if let Some(cached) = cache.get(&key) {
            return cached.clone();
        }
        let loaded = load_system_font(&style.family, style.weight, style.italic)
            .or_else(|| load_system_font("sans-serif", style.weight, style.italic))
            .or_else(|| load_system_font("Liberation Sans", 400, false))
            .or_else(|| load_system_font("DejaVu Sans", 400, false));
        if loaded.is_none() {
            crate::log_warn!("no usable font for family '{}'", style.family);
        }
        cache.insert(key, loaded.clone());
        loaded
    }
}

/// Measurement over whatever font the store resolves for each style. When
/// no font loads at all, falls back to a rough proportional estimate so
/// caption hit zones still exist.
impl TextMeasure for FontStore {
    fn line_width(&self, text: &str, style: &CaptionStyle, size: f32) -> f32 {
        match self.get(style) {
            Some(font) => AbGlyphMeasure { font: &font }.line_width(text, style, size),
            None => text.chars().count() as f32 * size * 0.55,
        }
    }

    fn line_height(&self, style: &CaptionStyle, size: f32) -> f32 {
        match self.get(style) {
            Some(font) => AbGlyphMeasure { font: &font }.line_height(style, size),
            None => size * 1.2,
        }
    }
}

/// Load a font by family name, CSS-style weight and italic flag from the
/// system. Returns `None` if no match can be loaded.
pub fn load_system_font(family: &str, weight: u16, italic: bool) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::{Properties, Style, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);
    if italic {
        props.style = Style::Italic;
    }

    let family_name = match family {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        other => FamilyName::Title(other.to_string()),
    };

    let handle = SystemSource::new()
        .select_best_match(&[family_name], &props)
        .ok()?;
    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// Sorted, deduplicated system font family names for the style panel.
pub fn enumerate_system_fonts() -> Vec<String> {
    match font_kit::source::SystemSource::new().all_families() {
        Ok(mut families) => {
            families.sort();
            families.dedup();
            families
        }
        Err(_) => {
            #[cfg(target_os = "linux")]
            {
                vec!["Liberation Sans".to_string(), "DejaVu Sans".to_string()]
            }
            #[cfg(not(target_os = "linux"))]
            {
                vec!["Arial".to_string(), "Helvetica".to_string()]
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Measurement (TextMeasure over a real font)
// ---------------------------------------------------------------------------

/// [`TextMeasure`] backed by an ab_glyph font: kerned advance widths and the
/// font's natural line height.
pub struct AbGlyphMeasure<'a> {
    pub font: &'a FontArc,
}

impl TextMeasure for AbGlyphMeasure<'_> {
    fn line_width(&self, text: &str, _style: &CaptionStyle, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        let mut width = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    fn line_height(&self, _style: &CaptionStyle, size: f32) -> f32 {
        self.font.as_scaled(size).height()
    }
}

// ---------------------------------------------------------------------------
//  Rasterization
// ---------------------------------------------------------------------------

/// Draw a laid-out caption block onto the surface, clipped to `clip`
/// (normally the panel rect — text past the panel edge is windowed away).
///
/// The block is rasterized unrotated into a coverage buffer (fill plus a
/// dilated stroke ring), then composited with an inverse-rotation sample so
/// the visual rotation and the hit-box math in `ops::captions` agree on the
/// block center.
pub fn draw_caption(
    surface: &mut RgbaImage,
    clip: Rect,
    panel_x: f32,
    panel_y: f32,
    layout: &CaptionLayout,
    style: &CaptionStyle,
    font: &FontArc,
    opacity: f32,
) {
    let pad = (style.stroke_width.max(0.0).ceil() + 2.0) as i32;
    let buf_w = (layout.block_w.ceil() as i32 + 2 * pad).max(1) as usize;
    let buf_h = (layout.block_h.ceil() as i32 + 2 * pad).max(1) as usize;

    let fill_cov = rasterize_block(layout, style, font, buf_w, buf_h, pad as f32);
    let stroke_cov = if style.stroke_width > 0.0 {
        Some(dilate(&fill_cov, buf_w, buf_h, style.stroke_width))
    } else {
        None
    };

    // Surface-space center of the unrotated block; rotation pivots here.
    let cx = panel_x + layout.block_x + layout.block_w * 0.5;
    let cy = panel_y + layout.block_y + layout.block_h * 0.5;

    // Surface-space AABB of the rotated, padded block, clipped to the panel.
    let padded = Rect::new(
        panel_x + layout.block_x - pad as f32,
        panel_y + layout.block_y - pad as f32,
        buf_w as f32,
        buf_h as f32,
    );
    let bounds = crate::ops::captions::rotated_aabb(padded, layout.rotation_deg).intersect(&clip);
    let x0 = bounds.x.floor().max(0.0) as u32;
    let y0 = bounds.y.floor().max(0.0) as u32;
    let x1 = (bounds.right().ceil() as u32).min(surface.width());
    let y1 = (bounds.bottom().ceil() as u32).min(surface.height());
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let (sin, cos) = (-layout.rotation_deg.to_radians()).sin_cos();
    let buf_origin_x = cx - buf_w as f32 * 0.5;
    let buf_origin_y = cy - buf_h as f32 * 0.5;

    for y in y0..y1 {
        for x in x0..x1 {
            let sx = x as f32 + 0.5;
            let sy = y as f32 + 0.5;
            // Inverse-rotate the surface point into block-local space.
            let dx = sx - cx;
            let dy = sy - cy;
            let bx = cx + dx * cos - dy * sin - buf_origin_x;
            let by = cy + dx * sin + dy * cos - buf_origin_y;

            if let Some(stroke) = &stroke_cov {
                let cov = sample_coverage(stroke, buf_w, buf_h, bx, by);
                if cov > 0.003 {
                    blend_px(surface, x, y, style.stroke_color, cov * opacity);
                }
            }
            let cov = sample_coverage(&fill_cov, buf_w, buf_h, bx, by);
            if cov > 0.003 {
                blend_px(surface, x, y, style.color, cov * opacity);
            }
        }
    }
}

/// Rasterize the wrapped lines into a single-channel coverage buffer.
/// Lines are aligned within the block per the style's horizontal alignment.
fn rasterize_block(
    layout: &CaptionLayout,
    style: &CaptionStyle,
    font: &FontArc,
    buf_w: usize,
    buf_h: usize,
    pad: f32,
) -> Vec<f32> {
    let mut cov = vec![0.0f32; buf_w * buf_h];
    let scaled = font.as_scaled(layout.font_size);
    let ascent = scaled.ascent();
    let measure = AbGlyphMeasure { font };

    for (i, line) in layout.lines.iter().enumerate() {
        let line_w = measure.line_width(line, style, layout.font_size);
        let start_x = pad
            + match style.align {
                HAlign::Left => 0.0,
                HAlign::Center => (layout.block_w - line_w) * 0.5,
                HAlign::Right => layout.block_w - line_w,
            };
        let baseline = pad + i as f32 * layout.line_height + ascent;

        let mut cursor = start_x;
        let mut prev = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(p) = prev {
                cursor += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(layout.font_size, point(cursor, baseline));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let gb = outlined.px_bounds();
                outlined.draw(|px, py, c| {
                    let tx = gb.min.x as i32 + px as i32;
                    let ty = gb.min.y as i32 + py as i32;
                    if tx >= 0 && ty >= 0 && (tx as usize) < buf_w && (ty as usize) < buf_h {
                        let idx = ty as usize * buf_w + tx as usize;
                        cov[idx] = cov[idx].max(c);
                    }
                });
            }
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
    }
    cov
}

/// Max-dilate a coverage buffer by `radius` px (disc kernel). This is the
/// stroke ring: drawn in the stroke color underneath the fill pass.
fn dilate(cov: &[f32], w: usize, h: usize, radius: f32) -> Vec<f32> {
    let r = radius.ceil() as i32;
    let r2 = radius * radius;
    let mut out = vec![0.0f32; cov.len()];
    for y in 0..h as i32 {
        for x in 0..w as i32 {
            let mut best = 0.0f32;
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx * dx + dy * dy) as f32 > r2 {
                        continue;
                    }
                    let (sx, sy) = (x + dx, y + dy);
                    if sx >= 0 && sy >= 0 && (sx as usize) < w && (sy as usize) < h {
                        best = best.max(cov[sy as usize * w + sx as usize]);
                        if best >= 1.0 {
                            break;
                        }
                    }
                }
                if best >= 1.0 {
                    break;
                }
            }
            out[y as usize * w + x as usize] = best;
        }
    }
    out
}

/// Bilinear coverage sample; out-of-bounds reads as zero.
fn sample_coverage(cov: &[f32], w: usize, h: usize, x: f32, y: f32) -> f32 {
    let fx = x - 0.5;
    let fy = y - 0.5;
    let x0 = fx.floor() as i32;
    let y0 = fy.floor() as i32;
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let at = |xi: i32, yi: i32| -> f32 {
        if xi < 0 || yi < 0 || xi as usize >= w || yi as usize >= h {
            0.0
        } else {
            cov[yi as usize * w + xi as usize]
        }
    };
    let top = at(x0, y0) * (1.0 - tx) + at(x0 + 1, y0) * tx;
    let bot = at(x0, y0 + 1) * (1.0 - tx) + at(x0 + 1, y0 + 1) * tx;
    top * (1.0 - ty) + bot * ty
}

/// Source-over blend of `color` at `alpha` onto one surface pixel.
fn blend_px(surface: &mut RgbaImage, x: u32, y: u32, color: [u8; 4], alpha: f32) {
    let a = (alpha * color[3] as f32 / 255.0).clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst = surface.get_pixel_mut(x, y);
    for c in 0..3 {
        dst.0[c] = (color[c] as f32 * a + dst.0[c] as f32 * (1.0 - a)).round() as u8;
    }
    dst.0[3] = ((a + dst.0[3] as f32 / 255.0 * (1.0 - a)) * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dilate_grows_a_point_into_a_disc() {
        let mut cov = vec![0.0f32; 49];
        cov[3 * 7 + 3] = 1.0;
        let out = dilate(&cov, 7, 7, 2.0);
        assert_eq!(out[3 * 7 + 3], 1.0);
        assert_eq!(out[3 * 7 + 1], 1.0); // two to the left: inside the disc
        assert_eq!(out[0], 0.0); // corner: outside
    }

    #[test]
    fn coverage_sampling_is_zero_outside() {
        let cov = vec![1.0f32; 4];
        assert_eq!(sample_coverage(&cov, 2, 2, -5.0, -5.0), 0.0);
        assert!(sample_coverage(&cov, 2, 2, 1.0, 1.0) > 0.9);
    }

    #[test]
    fn blend_is_a_noop_at_zero_alpha() {
        let mut img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 255]));
        blend_px(&mut img, 0, 0, [255, 255, 255, 255], 0.0);
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
        blend_px(&mut img, 0, 0, [255, 255, 255, 255], 1.0);
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
