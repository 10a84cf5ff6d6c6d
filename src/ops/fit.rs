// ============================================================================
// IMAGE FIT — cover scaling, pan clamping, zoom-at-point
// ============================================================================
//
// Pure functions of (image size, panel size, transform). The invariant all
// of them preserve: a populated panel is always fully covered by its image,
// never letterboxed. Clamping is idempotent, so callers may re-apply it on
// every render and every gesture update.

use crate::collage::{ImageTransform, MAX_ZOOM};

/// Tolerance for "the image exactly fits this axis". Cover fitting matches
/// one axis up to float error; inside this band the pan is pinned to zero.
const FIT_EPS: f32 = 1e-3;

/// Final panel-local placement of an image: total pixel scale plus the
/// offset of the image's top-left corner from the panel's top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedImage {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub draw_w: f32,
    pub draw_h: f32,
}

/// Base "cover" scale: the image fills the panel completely, cropping the
/// overhang. The ruling axis is chosen by comparing aspect ratios rather
/// than taking a literal max of the two scale factors, which drifts at the
/// boundary.
pub fn cover_base_scale(img_w: u32, img_h: u32, panel_w: f32, panel_h: f32) -> f32 {
    if img_w == 0 || img_h == 0 || panel_w <= 0.0 || panel_h <= 0.0 {
        return 1.0;
    }
    let img_aspect = img_w as f32 / img_h as f32;
    let panel_aspect = panel_w / panel_h;
    if img_aspect > panel_aspect {
        // Image is relatively wider: height rules, width overhangs.
        panel_h / img_h as f32
    } else {
        panel_w / img_w as f32
    }
}

/// Clamp a transform so the scaled image still covers the panel.
///
/// Scale is clamped to `[1, MAX_ZOOM]`. On any axis where the scaled image
/// is larger than the panel, the position may slide within
/// `[panel − scaled − center, −center]`; where it exactly fits, the position
/// is forced to zero so the image cannot drift sideways.
pub fn clamp_transform(
    img_w: u32,
    img_h: u32,
    panel_w: f32,
    panel_h: f32,
    t: ImageTransform,
) -> ImageTransform {
    let scale = if t.scale.is_finite() { t.scale.clamp(1.0, MAX_ZOOM) } else { 1.0 };
    let total = cover_base_scale(img_w, img_h, panel_w, panel_h) * scale;
    let scaled_w = img_w as f32 * total;
    let scaled_h = img_h as f32 * total;
    let center_x = (panel_w - scaled_w) * 0.5;
    let center_y = (panel_h - scaled_h) * 0.5;

    let clamp_axis = |pos: f32, scaled: f32, panel: f32, center: f32| -> f32 {
        if scaled > panel + FIT_EPS {
            let pos = if pos.is_finite() { pos } else { 0.0 };
            pos.clamp(panel - scaled - center, -center)
        } else {
            0.0
        }
    };

    ImageTransform {
        scale,
        position_x: clamp_axis(t.position_x, scaled_w, panel_w, center_x),
        position_y: clamp_axis(t.position_y, scaled_h, panel_h, center_y),
    }
}

/// Resolve the final placement of an image inside a panel. The transform is
/// clamped on the way in, so the result always covers the panel.
pub fn fit_image(
    img_w: u32,
    img_h: u32,
    panel_w: f32,
    panel_h: f32,
    t: ImageTransform,
) -> FittedImage {
    let t = clamp_transform(img_w, img_h, panel_w, panel_h, t);
    let total = cover_base_scale(img_w, img_h, panel_w, panel_h) * t.scale;
    let draw_w = img_w as f32 * total;
    let draw_h = img_h as f32 * total;
    FittedImage {
        scale: total,
        offset_x: (panel_w - draw_w) * 0.5 + t.position_x,
        offset_y: (panel_h - draw_h) * 0.5 + t.position_y,
        draw_w,
        draw_h,
    }
}

/// Zoom while keeping the image pixel under `(focal_x, focal_y)` (panel-local)
/// fixed: map the focal point into image space with the current transform,
/// then solve the position that maps it back under the focal point at the
/// new scale, then re-clamp.
pub fn zoom_at(
    img_w: u32,
    img_h: u32,
    panel_w: f32,
    panel_h: f32,
    current: ImageTransform,
    focal_x: f32,
    focal_y: f32,
    new_scale: f32,
) -> ImageTransform {
    let base = cover_base_scale(img_w, img_h, panel_w, panel_h);
    let cur = clamp_transform(img_w, img_h, panel_w, panel_h, current);
    let cur_fit = fit_image(img_w, img_h, panel_w, panel_h, cur);

    // Focal point in image space under the current transform.
    let u = (focal_x - cur_fit.offset_x) / cur_fit.scale.max(f32::EPSILON);
    let v = (focal_y - cur_fit.offset_y) / cur_fit.scale.max(f32::EPSILON);

    let scale = if new_scale.is_finite() { new_scale.clamp(1.0, MAX_ZOOM) } else { cur.scale };
    let total = base * scale;
    let center_x = (panel_w - img_w as f32 * total) * 0.5;
    let center_y = (panel_h - img_h as f32 * total) * 0.5;

    clamp_transform(
        img_w,
        img_h,
        panel_w,
        panel_h,
        ImageTransform {
            scale,
            position_x: focal_x - u * total - center_x,
            position_y: focal_y - v * total - center_y,
        },
    )
}

/// Pan by a panel-local pixel delta, re-clamped.
pub fn pan_by(
    img_w: u32,
    img_h: u32,
    panel_w: f32,
    panel_h: f32,
    current: ImageTransform,
    dx: f32,
    dy: f32,
) -> ImageTransform {
    clamp_transform(
        img_w,
        img_h,
        panel_w,
        panel_h,
        ImageTransform {
            scale: current.scale,
            position_x: current.position_x + dx,
            position_y: current.position_y + dy,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cover_scale_matches_the_ruling_axis() {
        // Wide image in a square panel: height rules.
        assert_eq!(cover_base_scale(800, 400, 200.0, 200.0), 0.5);
        // Tall image in a square panel: width rules.
        assert_eq!(cover_base_scale(400, 800, 200.0, 200.0), 0.5);
        // Same aspect: both axes fit exactly.
        assert_eq!(cover_base_scale(400, 200, 200.0, 100.0), 0.5);
    }

    #[test]
    fn exactly_fitting_axis_pins_position_to_zero() {
        // 800×400 covered into 200×200: width overhangs, height fits exactly.
        let t = clamp_transform(
            800,
            400,
            200.0,
            200.0,
            ImageTransform { scale: 1.0, position_x: 37.0, position_y: 37.0 },
        );
        assert_eq!(t.position_y, 0.0);
        // X may pan but only within the overhang: scaled_w = 400, center = −100.
        assert!(t.position_x <= 100.0 && t.position_x >= -100.0);
    }

    #[test]
    fn covered_panel_has_no_visible_background() {
        for &(px, py, s) in &[(0.0f32, 0.0f32, 1.0f32), (500.0, -500.0, 2.5), (-9999.0, 9999.0, 5.0)] {
            let fitted = fit_image(
                640,
                480,
                300.0,
                150.0,
                ImageTransform { scale: s, position_x: px, position_y: py },
            );
            assert!(fitted.offset_x <= FIT_EPS);
            assert!(fitted.offset_y <= FIT_EPS);
            assert!(fitted.offset_x + fitted.draw_w >= 300.0 - FIT_EPS);
            assert!(fitted.offset_y + fitted.draw_h >= 150.0 - FIT_EPS);
        }
    }

    #[test]
    fn zoom_at_top_left_corner_keeps_that_pixel_fixed() {
        let start = ImageTransform::default();
        let before = fit_image(800, 600, 200.0, 200.0, start);
        let u0 = (0.0 - before.offset_x) / before.scale;
        let v0 = (0.0 - before.offset_y) / before.scale;

        let zoomed = zoom_at(800, 600, 200.0, 200.0, start, 0.0, 0.0, 2.0);
        let after = fit_image(800, 600, 200.0, 200.0, zoomed);
        // The image pixel that sat at the corner must still sit there, ±1px.
        let x_after = after.offset_x + u0 * after.scale;
        let y_after = after.offset_y + v0 * after.scale;
        assert!(x_after.abs() <= 1.0, "x drifted to {}", x_after);
        assert!(y_after.abs() <= 1.0, "y drifted to {}", y_after);
        assert_eq!(after.scale, before.scale * 2.0);
    }

    #[test]
    fn zoom_scale_is_clamped_to_bounds() {
        let t = zoom_at(800, 600, 200.0, 200.0, ImageTransform::default(), 100.0, 100.0, 40.0);
        assert_eq!(t.scale, MAX_ZOOM);
        let t = zoom_at(800, 600, 200.0, 200.0, t, 100.0, 100.0, 0.1);
        assert_eq!(t.scale, 1.0);
    }

    proptest! {
        /// Clamping twice yields exactly the same transform as clamping once.
        #[test]
        fn clamp_is_idempotent(
            img_w in 1u32..4000,
            img_h in 1u32..4000,
            panel_w in 1.0f32..1200.0,
            panel_h in 1.0f32..1200.0,
            scale in -2.0f32..10.0,
            px in -5000.0f32..5000.0,
            py in -5000.0f32..5000.0,
        ) {
            let t = ImageTransform { scale, position_x: px, position_y: py };
            let once = clamp_transform(img_w, img_h, panel_w, panel_h, t);
            let twice = clamp_transform(img_w, img_h, panel_w, panel_h, once);
            prop_assert_eq!(once, twice);
        }

        /// Coverage invariant: any clamped transform fully covers the panel.
        #[test]
        fn clamped_transforms_cover_the_panel(
            img_w in 1u32..4000,
            img_h in 1u32..4000,
            panel_w in 1.0f32..1200.0,
            panel_h in 1.0f32..1200.0,
            scale in 1.0f32..5.0,
            px in -5000.0f32..5000.0,
            py in -5000.0f32..5000.0,
        ) {
            let t = ImageTransform { scale, position_x: px, position_y: py };
            let f = fit_image(img_w, img_h, panel_w, panel_h, t);
            // Tolerance scales with the magnitudes involved in the float math.
            let eps = 0.01f32.max(panel_w.max(panel_h) * 1e-4);
            prop_assert!(f.offset_x <= eps);
            prop_assert!(f.offset_y <= eps);
            prop_assert!(f.offset_x + f.draw_w >= panel_w - eps);
            prop_assert!(f.offset_y + f.draw_h >= panel_h - eps);
        }
    }
}
