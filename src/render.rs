// ============================================================================
// RENDERER — CPU compositing of the collage scene, preview + export paths
// ============================================================================
//
// Both entry points walk the same scene code: per panel, background fill,
// then the cover-fitted image (or the add-affordance), then the caption
// block clipped to the panel. The interactive path additionally draws hover
// chrome and low-opacity placeholder captions; the export path suppresses
// exactly those and nothing else, which is what keeps the two pixel-
// identical for real content.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::collage::{CollageState, ImageTransform, Panel, PanelId, Rect};
use crate::ops::captions::{self, PLACEHOLDER_OPACITY};
use crate::ops::fit;
use crate::ops::text::{AbGlyphMeasure, FontStore, draw_caption};

/// Surface background (shows through the border gaps).
const SURFACE_COLOR: [u8; 4] = [255, 255, 255, 255];
/// Fill behind an empty (or still-loading) panel.
const EMPTY_PANEL_FILL: [u8; 4] = [229, 231, 235, 255];
/// Fill behind a populated panel; visible only until the image covers it.
const PANEL_FILL: [u8; 4] = [209, 213, 219, 255];
/// Add-affordance glyph color (the plus in empty panels).
const AFFORDANCE_COLOR: [u8; 4] = [156, 163, 175, 255];
/// Hover/active accent.
const ACCENT: [u8; 4] = [66, 133, 244, 255];
const HOVER_TINT: [u8; 4] = [66, 133, 244, 28];

/// Transient UI state the preview draws on top of the scene. The export
/// path never sees one of these.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionSnapshot {
    pub hovered: Option<usize>,
    pub active: Option<PanelId>,
}

/// Interactive preview render: full scene plus placeholders and hover/active
/// chrome.
pub fn render(
    state: &CollageState,
    images: &[Option<Arc<RgbaImage>>],
    fonts: &FontStore,
    snapshot: &InteractionSnapshot,
) -> RgbaImage {
    compose(state, images, fonts, Some(snapshot))
}

/// Export render: identical geometry and content, minus all transient
/// affordances (placeholder captions, hover chrome, add icons).
pub fn export_pixels(
    state: &CollageState,
    images: &[Option<Arc<RgbaImage>>],
    fonts: &FontStore,
) -> RgbaImage {
    compose(state, images, fonts, None)
}

fn compose(
    state: &CollageState,
    images: &[Option<Arc<RgbaImage>>],
    fonts: &FontStore,
    chrome: Option<&InteractionSnapshot>,
) -> RgbaImage {
    let (w, h) = state.surface_size();
    let mut surface = RgbaImage::from_pixel(w.max(1), h.max(1), Rgba(SURFACE_COLOR));
    let surface_rect = Rect::new(0.0, 0.0, surface.width() as f32, surface.height() as f32);

    for panel in state.panels() {
        let clip = panel.rect().intersect(&surface_rect);
        if clip.w < 1.0 || clip.h < 1.0 {
            continue;
        }

        // A mapped slot whose bitmap hasn't decoded yet renders as empty.
        let bitmap = state
            .image_for(panel.id)
            .and_then(|idx| images.get(idx))
            .and_then(|slot| slot.as_deref());

        fill_rect(
            &mut surface,
            clip,
            if bitmap.is_some() { PANEL_FILL } else { EMPTY_PANEL_FILL },
        );

        match bitmap {
            Some(img) => {
                draw_image_cover(&mut surface, clip, panel, img, state.transform_for(panel.id));
            }
            None => {
                if chrome.is_some() {
                    draw_add_affordance(&mut surface, panel);
                }
            }
        }

        draw_panel_caption(&mut surface, clip, panel, state, bitmap.is_some(), fonts, chrome.is_some());
    }

    if let Some(snapshot) = chrome {
        draw_chrome(&mut surface, state, snapshot);
    }
    surface
}

// ---------------------------------------------------------------------------
//  Images
// ---------------------------------------------------------------------------

/// Draw a panel's image, cover-fitted and clipped. Row-parallel: each
/// surface row inside the clip is sampled independently.
fn draw_image_cover(
    surface: &mut RgbaImage,
    clip: Rect,
    panel: &Panel,
    img: &RgbaImage,
    transform: ImageTransform,
) {
    let fitted = fit::fit_image(img.width(), img.height(), panel.width, panel.height, transform);
    if fitted.scale <= 0.0 {
        return;
    }
    let inv = 1.0 / fitted.scale;

    let x0 = clip.x.floor().max(0.0) as usize;
    let y0 = clip.y.floor().max(0.0) as usize;
    let x1 = (clip.right().ceil() as usize).min(surface.width() as usize);
    let y1 = (clip.bottom().ceil() as usize).min(surface.height() as usize);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let stride = surface.width() as usize * 4;
    let (panel_x, panel_y) = (panel.x, panel.y);
    let (off_x, off_y) = (fitted.offset_x, fitted.offset_y);

    surface
        .par_chunks_mut(stride)
        .enumerate()
        .skip(y0)
        .take(y1 - y0)
        .for_each(|(y, row)| {
            let sy = ((y as f32 + 0.5) - panel_y - off_y) * inv;
            for x in x0..x1 {
                let sx = ((x as f32 + 0.5) - panel_x - off_x) * inv;
                let px = sample_bilinear(img, sx, sy);
                row[x * 4..x * 4 + 4].copy_from_slice(&px);
            }
        });
}

/// Bilinear sample with edge clamping; always returns an opaque pixel.
fn sample_bilinear(img: &RgbaImage, x: f32, y: f32) -> [u8; 4] {
    let max_x = (img.width() - 1) as f32;
    let max_y = (img.height() - 1) as f32;
    let fx = (x - 0.5).clamp(0.0, max_x);
    let fy = (y - 0.5).clamp(0.0, max_y);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(img.width() - 1);
    let y1 = (y0 + 1).min(img.height() - 1);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x1, y0).0;
    let p01 = img.get_pixel(x0, y1).0;
    let p11 = img.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..3 {
        let top = p00[c] as f32 * (1.0 - tx) + p10[c] as f32 * tx;
        let bot = p01[c] as f32 * (1.0 - tx) + p11[c] as f32 * tx;
        out[c] = (top * (1.0 - ty) + bot * ty).round() as u8;
    }
    out[3] = 255;
    out
}

// ---------------------------------------------------------------------------
//  Captions
// ---------------------------------------------------------------------------

fn draw_panel_caption(
    surface: &mut RgbaImage,
    clip: Rect,
    panel: &Panel,
    state: &CollageState,
    has_image: bool,
    fonts: &FontStore,
    interactive: bool,
) {
    let cfg = match state.captions.get(&panel.id) {
        Some(cfg) => cfg.clone(),
        None => state.caption_or_default(panel.id),
    };
    let Some(font) = fonts.get(&cfg.style) else {
        // No usable font on this system: captions are skipped identically
        // on both render paths.
        return;
    };

    let measure = AbGlyphMeasure { font: &font };
    let Some(layout) =
        captions::layout_caption(panel.width, panel.height, &cfg, has_image, &measure)
    else {
        return;
    };
    if layout.placeholder && !interactive {
        return;
    }
    let opacity = if layout.placeholder { PLACEHOLDER_OPACITY } else { 1.0 };
    draw_caption(surface, clip, panel.x, panel.y, &layout, &cfg.style, &font, opacity);
}

// ---------------------------------------------------------------------------
//  Preview-only chrome
// ---------------------------------------------------------------------------

fn draw_add_affordance(surface: &mut RgbaImage, panel: &Panel) {
    let cx = panel.x + panel.width * 0.5;
    let cy = panel.y + panel.height * 0.5;
    let arm = (panel.width.min(panel.height) * 0.12).clamp(4.0, 32.0);
    let thick = (arm * 0.3).max(2.0);
    fill_rect(
        surface,
        Rect::new(cx - arm, cy - thick * 0.5, arm * 2.0, thick),
        AFFORDANCE_COLOR,
    );
    fill_rect(
        surface,
        Rect::new(cx - thick * 0.5, cy - arm, thick, arm * 2.0),
        AFFORDANCE_COLOR,
    );
}

fn draw_chrome(surface: &mut RgbaImage, state: &CollageState, snapshot: &InteractionSnapshot) {
    if let Some(index) = snapshot.hovered
        && let Some(panel) = state.panels().get(index)
    {
        blend_rect(surface, panel.rect(), HOVER_TINT);
        stroke_rect(surface, panel.rect(), ACCENT, 2.0);
    }
    if let Some(id) = snapshot.active
        && let Some(panel) = state.panel_by_id(id)
    {
        stroke_rect(surface, panel.rect(), ACCENT, 3.0);
    }
}

// ---------------------------------------------------------------------------
//  Primitive fills
// ---------------------------------------------------------------------------

fn bounds_of(surface: &RgbaImage, rect: Rect) -> (u32, u32, u32, u32) {
    let x0 = rect.x.floor().max(0.0) as u32;
    let y0 = rect.y.floor().max(0.0) as u32;
    let x1 = (rect.right().ceil().max(0.0) as u32).min(surface.width());
    let y1 = (rect.bottom().ceil().max(0.0) as u32).min(surface.height());
    (x0, y0, x1, y1)
}

fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: [u8; 4]) {
    let (x0, y0, x1, y1) = bounds_of(surface, rect);
    for y in y0..y1 {
        for x in x0..x1 {
            surface.put_pixel(x, y, Rgba(color));
        }
    }
}

/// Alpha-blend a translucent color over a rect.
fn blend_rect(surface: &mut RgbaImage, rect: Rect, color: [u8; 4]) {
    let alpha = color[3] as f32 / 255.0;
    let (x0, y0, x1, y1) = bounds_of(surface, rect);
    for y in y0..y1 {
        for x in x0..x1 {
            let dst = surface.get_pixel_mut(x, y);
            for c in 0..3 {
                dst.0[c] =
                    (color[c] as f32 * alpha + dst.0[c] as f32 * (1.0 - alpha)).round() as u8;
            }
        }
    }
}

fn stroke_rect(surface: &mut RgbaImage, rect: Rect, color: [u8; 4], width: f32) {
    let w = width.max(1.0);
    fill_rect(surface, Rect::new(rect.x, rect.y, rect.w, w), color);
    fill_rect(surface, Rect::new(rect.x, rect.bottom() - w, rect.w, w), color);
    fill_rect(surface, Rect::new(rect.x, rect.y, w, rect.h), color);
    fill_rect(surface, Rect::new(rect.right() - w, rect.y, w, rect.h), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::LayoutSpec;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::from_pixel(w, h, Rgba(color)))
    }

    fn state_2x1() -> CollageState {
        let mut s = CollageState::new(400, 200, LayoutSpec::grid(vec![1.0, 1.0], vec![1.0]), 2);
        s.set_border_px(0.0);
        s
    }

    #[test]
    fn populated_panel_is_fully_covered_by_its_image() {
        let mut state = state_2x1();
        state.assign_image(PanelId(0), 0);
        let images = vec![Some(solid(37, 91, [200, 10, 10, 255]))];
        let fonts = FontStore::new();
        let out = export_pixels(&state, &images, &fonts);
        // Every pixel of panel 0 carries image color; no background leaks.
        for y in 0..200 {
            for x in 0..200 {
                assert_eq!(out.get_pixel(x, y).0, [200, 10, 10, 255], "leak at {},{}", x, y);
            }
        }
        // Panel 1 stays the empty tint.
        assert_eq!(out.get_pixel(300, 100).0, EMPTY_PANEL_FILL);
    }

    #[test]
    fn loading_image_renders_as_empty_panel() {
        let mut state = state_2x1();
        state.assign_image(PanelId(0), 0);
        let images: Vec<Option<Arc<RgbaImage>>> = vec![None];
        let fonts = FontStore::new();
        let out = export_pixels(&state, &images, &fonts);
        assert_eq!(out.get_pixel(100, 100).0, EMPTY_PANEL_FILL);
    }

    #[test]
    fn add_affordance_appears_only_in_preview() {
        let state = state_2x1();
        let images: Vec<Option<Arc<RgbaImage>>> = Vec::new();
        let fonts = FontStore::new();
        let preview = render(&state, &images, &fonts, &InteractionSnapshot::default());
        let export = export_pixels(&state, &images, &fonts);
        // Preview draws the plus glyph at the panel center; export does not.
        assert_eq!(preview.get_pixel(100, 100).0, AFFORDANCE_COLOR);
        assert_eq!(export.get_pixel(100, 100).0, EMPTY_PANEL_FILL);
    }

    #[test]
    fn hover_chrome_appears_only_in_preview() {
        let mut state = state_2x1();
        state.assign_image(PanelId(0), 0);
        let images = vec![Some(solid(50, 50, [10, 200, 10, 255]))];
        let fonts = FontStore::new();
        let snapshot = InteractionSnapshot { hovered: Some(0), active: None };
        let hovered = render(&state, &images, &fonts, &snapshot);
        let export = export_pixels(&state, &images, &fonts);
        assert_ne!(hovered.get_pixel(100, 100).0, export.get_pixel(100, 100).0);
        // Outside the hovered panel (and clear of panel 1's add icon) the
        // two agree.
        assert_eq!(hovered.get_pixel(210, 10).0, export.get_pixel(210, 10).0);
    }

    #[test]
    fn transform_pans_the_visible_crop() {
        let mut state = state_2x1();
        state.assign_image(PanelId(0), 0);
        // Left half black, right half white, wide enough to pan.
        let mut img = RgbaImage::from_pixel(400, 200, Rgba([0, 0, 0, 255]));
        for y in 0..200 {
            for x in 200..400 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let images = vec![Some(Arc::new(img))];
        let fonts = FontStore::new();

        let centered = export_pixels(&state, &images, &fonts);
        state.set_transform(
            PanelId(0),
            crate::ops::fit::clamp_transform(
                400,
                200,
                200.0,
                200.0,
                ImageTransform { scale: 1.0, position_x: 1e9, position_y: 0.0 },
            ),
        );
        let panned = export_pixels(&state, &images, &fonts);
        // Centered view straddles the seam; fully panned right shows only
        // the image's left (black) half.
        assert_eq!(centered.get_pixel(10, 100).0, [0, 0, 0, 255]);
        assert_eq!(centered.get_pixel(190, 100).0, [255, 255, 255, 255]);
        assert_eq!(panned.get_pixel(190, 100).0, [0, 0, 0, 255]);
    }

    #[test]
    fn degenerate_surface_still_renders() {
        let state = CollageState::new(0, 0, LayoutSpec::uniform(2, 2), 4);
        let fonts = FontStore::new();
        let out = export_pixels(&state, &[], &fonts);
        assert!(out.width() >= 1 && out.height() >= 1);
    }
}
