// ============================================================================
// GRID LAYOUT — track sizing, named areas, border zones, drag redistribution
// ============================================================================
//
// Everything in here degrades instead of failing: malformed track strings,
// unknown area names and non-rectangular area regions all fall back to a
// square-ish equal-weight grid, and degenerate surfaces clamp every derived
// extent to at least 1px. The resolver must never panic mid-edit.

use crate::collage::{AreaGrid, BorderAxis, BorderZone, LayoutSpec, Panel, PanelId, Rect};

/// Half-width of a border zone's draggable hit region, px.
pub const ZONE_HIT_HALF: f32 = 8.0;

/// Minimum track weight fraction: 5% of the axis average.
const MIN_WEIGHT_FRACTION: f32 = 0.05;

// ---------------------------------------------------------------------------
//  Track string parsing
// ---------------------------------------------------------------------------

/// Result of parsing a track-size string. `Fallback` carries the reason and
/// is consumed by the resolver without ever being thrown.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackParse {
    Ok(Vec<f32>),
    Fallback(&'static str),
}

impl TrackParse {
    /// The parsed weights, or `n` equal tracks when parsing fell back.
    pub fn weights_or_equal(self, n: usize) -> Vec<f32> {
        match self {
            TrackParse::Ok(w) => w,
            TrackParse::Fallback(_) => vec![1.0; n.max(1)],
        }
    }
}

/// Parse a track list: whitespace-separated positive weights ("1 2 1",
/// "1.5 1") or the `repeat(N)` shorthand for N equal tracks.
pub fn parse_tracks(input: &str) -> TrackParse {
    let input = input.trim();
    if input.is_empty() {
        return TrackParse::Fallback("empty track list");
    }

    if let Some(rest) = input.strip_prefix("repeat(") {
        let Some(count_str) = rest.strip_suffix(')') else {
            return TrackParse::Fallback("unterminated repeat()");
        };
        return match count_str.trim().parse::<usize>() {
            Ok(n) if n >= 1 && n <= 64 => TrackParse::Ok(vec![1.0; n]),
            _ => TrackParse::Fallback("bad repeat() count"),
        };
    }

    let mut weights = Vec::new();
    for token in input.split_whitespace() {
        match token.parse::<f32>() {
            Ok(w) if w.is_finite() && w > 0.0 => weights.push(w),
            _ => return TrackParse::Fallback("non-positive or non-numeric weight"),
        }
    }
    if weights.is_empty() {
        TrackParse::Fallback("empty track list")
    } else {
        TrackParse::Ok(weights)
    }
}

// ---------------------------------------------------------------------------
//  Track sizing
// ---------------------------------------------------------------------------

/// Replace an unusable weight list (empty, non-finite or non-positive
/// entries) with equal weights of the same length.
fn sanitize_weights(weights: &[f32]) -> Vec<f32> {
    if weights.is_empty() {
        return vec![1.0];
    }
    if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
        return vec![1.0; weights.len()];
    }
    weights.to_vec()
}

/// Pixel span available to the tracks of one axis after removing the outer
/// margins and inter-track gaps. Clamped so every track can get ≥ 1px.
fn available_span(span: f32, tracks: usize, border: f32) -> f32 {
    let tracks = tracks.max(1) as f32;
    (span - 2.0 * border - (tracks - 1.0) * border).max(tracks)
}

/// Pixels per weight unit for one axis. This is the ratio the border solver
/// uses to convert a pixel drag delta into a weight delta.
pub fn unit_px_per_weight(weights: &[f32], span: f32, border: f32) -> f32 {
    let weights = sanitize_weights(weights);
    let total: f32 = weights.iter().sum();
    available_span(span, weights.len(), border) / total.max(f32::EPSILON)
}

/// Per-track pixel sizes and start offsets (outer margin and gaps included
/// in the offsets). Each size is at least 1px.
fn track_layout(weights: &[f32], span: f32, border: f32) -> (Vec<f32>, Vec<f32>) {
    let weights = sanitize_weights(weights);
    let unit = unit_px_per_weight(&weights, span, border);
    let sizes: Vec<f32> = weights.iter().map(|w| (w * unit).max(1.0)).collect();

    let mut offsets = Vec::with_capacity(sizes.len());
    let mut cursor = border;
    for size in &sizes {
        offsets.push(cursor);
        cursor += size + border;
    }
    (sizes, offsets)
}

// ---------------------------------------------------------------------------
//  Panel resolution
// ---------------------------------------------------------------------------

/// Derive concrete panel rects from a layout spec. Panels cover `[0, count)`
/// in order; ids are stable slot ids. Never panics — any inconsistency in
/// the spec degrades to [`fallback_spec`].
pub fn resolve_panels(
    spec: &LayoutSpec,
    count: usize,
    surface_w: f32,
    surface_h: f32,
    border: f32,
) -> Vec<Panel> {
    let count = count.max(1);
    let surface_w = surface_w.max(1.0);
    let surface_h = surface_h.max(1.0);

    if let Some(panels) = try_resolve(spec, count, surface_w, surface_h, border) {
        return panels;
    }
    // Degenerate or mismatched spec: square-ish grid, no named areas.
    let fallback = fallback_spec(count);
    try_resolve(&fallback, count, surface_w, surface_h, border)
        .unwrap_or_default()
}

/// Equal-weight `ceil(sqrt(n))`-column grid able to hold `n` panels.
pub fn fallback_spec(count: usize) -> LayoutSpec {
    let count = count.max(1);
    let cols = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    LayoutSpec::uniform(cols, rows)
}

fn try_resolve(
    spec: &LayoutSpec,
    count: usize,
    surface_w: f32,
    surface_h: f32,
    border: f32,
) -> Option<Vec<Panel>> {
    let (col_sizes, col_offsets) = track_layout(&spec.columns, surface_w, border);
    let (row_sizes, row_offsets) = track_layout(&spec.rows, surface_h, border);

    match (&spec.areas, &spec.panel_areas) {
        (Some(areas), Some(panel_areas)) => resolve_area_panels(
            areas, panel_areas, count, &col_sizes, &col_offsets, &row_sizes, &row_offsets, border,
        ),
        _ => resolve_cell_panels(count, &col_sizes, &col_offsets, &row_sizes, &row_offsets),
    }
}

/// One panel per grid cell, row-major. `None` when the grid is too small.
fn resolve_cell_panels(
    count: usize,
    col_sizes: &[f32],
    col_offsets: &[f32],
    row_sizes: &[f32],
    row_offsets: &[f32],
) -> Option<Vec<Panel>> {
    let cols = col_sizes.len();
    if cols * row_sizes.len() < count {
        return None;
    }
    let panels = (0..count)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Panel {
                id: PanelId(i as u32),
                index: i,
                x: col_offsets[col],
                y: row_offsets[row],
                width: col_sizes[col],
                height: row_sizes[row],
            }
        })
        .collect();
    Some(panels)
}

/// Panels as bounding boxes of their named-area cells, with internal gaps
/// absorbed into the span. `None` on any malformed area input.
fn resolve_area_panels(
    areas: &AreaGrid,
    panel_areas: &[String],
    count: usize,
    col_sizes: &[f32],
    col_offsets: &[f32],
    row_sizes: &[f32],
    row_offsets: &[f32],
    border: f32,
) -> Option<Vec<Panel>> {
    if !areas.is_rectangular()
        || areas.cols != col_sizes.len()
        || areas.rows() != row_sizes.len()
        || panel_areas.len() < count
    {
        return None;
    }

    let mut panels = Vec::with_capacity(count);
    for i in 0..count {
        let name = &panel_areas[i];
        let (c0, r0, c1, r1) = area_bounds(areas, name)?;

        let x = col_offsets[c0];
        let y = row_offsets[r0];
        let width: f32 =
            col_sizes[c0..=c1].iter().sum::<f32>() + (c1 - c0) as f32 * border;
        let height: f32 =
            row_sizes[r0..=r1].iter().sum::<f32>() + (r1 - r0) as f32 * border;

        panels.push(Panel {
            id: PanelId(i as u32),
            index: i,
            x,
            y,
            width: width.max(1.0),
            height: height.max(1.0),
        });
    }
    Some(panels)
}

/// Bounding cell range of an area name, validated to be a filled rectangle.
/// `None` when the name is absent or its region is ragged.
fn area_bounds(areas: &AreaGrid, name: &str) -> Option<(usize, usize, usize, usize)> {
    let cols = areas.cols;
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    for (idx, cell) in areas.names.iter().enumerate() {
        if cell != name {
            continue;
        }
        let (c, r) = (idx % cols, idx / cols);
        bounds = Some(match bounds {
            None => (c, r, c, r),
            Some((c0, r0, c1, r1)) => (c0.min(c), r0.min(r), c1.max(c), r1.max(r)),
        });
    }
    let (c0, r0, c1, r1) = bounds?;

    // The matching cells must exactly fill their bounding box.
    for r in r0..=r1 {
        for c in c0..=c1 {
            if areas.names[r * cols + c] != *name {
                return None;
            }
        }
    }
    Some((c0, r0, c1, r1))
}

// ---------------------------------------------------------------------------
//  Border zones
// ---------------------------------------------------------------------------

/// One zone per internal grid division, spanning the full surface along the
/// cross axis. Recomputed alongside the panels.
pub fn derive_zones(
    spec: &LayoutSpec,
    surface_w: f32,
    surface_h: f32,
    border: f32,
) -> Vec<BorderZone> {
    let (col_sizes, col_offsets) = track_layout(&spec.columns, surface_w, border);
    let (row_sizes, row_offsets) = track_layout(&spec.rows, surface_h, border);
    let mut zones = Vec::new();

    for i in 0..col_sizes.len().saturating_sub(1) {
        let center = col_offsets[i] + col_sizes[i] + border * 0.5;
        zones.push(BorderZone {
            axis: BorderAxis::Vertical,
            index: i,
            hit: Rect::new(center - ZONE_HIT_HALF, 0.0, ZONE_HIT_HALF * 2.0, surface_h),
            center,
        });
    }
    for i in 0..row_sizes.len().saturating_sub(1) {
        let center = row_offsets[i] + row_sizes[i] + border * 0.5;
        zones.push(BorderZone {
            axis: BorderAxis::Horizontal,
            index: i,
            hit: Rect::new(0.0, center - ZONE_HIT_HALF, surface_w, ZONE_HIT_HALF * 2.0),
            center,
        });
    }
    zones
}

/// Border zone under a surface-space point, if any.
pub fn zone_at(zones: &[BorderZone], x: f32, y: f32) -> Option<BorderZone> {
    zones.iter().find(|z| z.hit.contains(x, y)).copied()
}

// ---------------------------------------------------------------------------
//  Drag redistribution
// ---------------------------------------------------------------------------

/// Convert a pixel drag delta on divider `index` into adjusted track
/// weights: `+delta` on track `index`, `−delta` on `index + 1`, so the axis
/// weight sum is conserved. Each neighbor is held at a minimum of 5% of the
/// axis average by clamping the delta (not rejecting it — rejection causes
/// jitter at the limit). Returns `None` when nothing changed.
pub fn drag_border(
    spec: &LayoutSpec,
    axis: BorderAxis,
    index: usize,
    delta_px: f32,
    surface_w: f32,
    surface_h: f32,
    border: f32,
) -> Option<LayoutSpec> {
    let (weights, span) = match axis {
        BorderAxis::Vertical => (sanitize_weights(&spec.columns), surface_w),
        BorderAxis::Horizontal => (sanitize_weights(&spec.rows), surface_h),
    };
    if index + 1 >= weights.len() || !delta_px.is_finite() {
        return None;
    }

    let unit = unit_px_per_weight(&weights, span, border);
    let total: f32 = weights.iter().sum();
    let min_weight = MIN_WEIGHT_FRACTION * (total / weights.len() as f32);

    let lo = min_weight - weights[index];
    let hi = weights[index + 1] - min_weight;
    if lo > hi {
        // Both neighbors already pinned at the minimum.
        return None;
    }
    let delta = (delta_px / unit).clamp(lo, hi);
    if delta.abs() < 1e-6 {
        return None;
    }

    let mut weights = weights;
    weights[index] += delta;
    weights[index + 1] -= delta;

    let mut adjusted = spec.clone();
    match axis {
        BorderAxis::Vertical => adjusted.columns = weights,
        BorderAxis::Horizontal => adjusted.rows = weights,
    }
    Some(adjusted)
}
