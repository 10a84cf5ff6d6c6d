// ============================================================================
// COLLAGE MODEL — layout spec, panels, transforms, captions, derived geometry
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ops::layout;

/// Maximum user zoom multiplier on top of the cover-fit base scale.
pub const MAX_ZOOM: f32 = 5.0;

/// Uniform border thickness default (outer margin and inter-panel gap), px.
pub const DEFAULT_BORDER_PX: f32 = 8.0;

// ---------------------------------------------------------------------------
//  Geometry primitives
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle in surface pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Intersection, clamped to zero size when the rects don't overlap.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        Rect::new(x0, y0, (x1 - x0).max(0.0), (y1 - y0).max(0.0))
    }
}

// ---------------------------------------------------------------------------
//  Layout spec
// ---------------------------------------------------------------------------

/// Rectangular grid of area names, row-major. Width is `cols`; the row count
/// follows from `names.len() / cols`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaGrid {
    pub cols: usize,
    pub names: Vec<String>,
}

impl AreaGrid {
    pub fn rows(&self) -> usize {
        if self.cols == 0 { 0 } else { self.names.len() / self.cols }
    }

    /// A grid is usable when it is rectangular and non-empty.
    pub fn is_rectangular(&self) -> bool {
        self.cols > 0 && !self.names.is_empty() && self.names.len() % self.cols == 0
    }
}

/// Declarative grid description: column/row track weights plus optional
/// named-area assignment. Weights are relative ("fr" units), not pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub columns: Vec<f32>,
    pub rows: Vec<f32>,
    /// Area-name grid, when this layout places panels by name.
    pub areas: Option<AreaGrid>,
    /// Area name per panel index. Only meaningful together with `areas`.
    pub panel_areas: Option<Vec<String>>,
}

impl LayoutSpec {
    /// Plain weighted grid without named areas.
    pub fn grid(columns: Vec<f32>, rows: Vec<f32>) -> Self {
        Self { columns, rows, areas: None, panel_areas: None }
    }

    /// Equal-weight `cols` × `rows` grid.
    pub fn uniform(cols: usize, rows: usize) -> Self {
        Self::grid(vec![1.0; cols.max(1)], vec![1.0; rows.max(1)])
    }
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self::uniform(2, 2)
    }
}

// ---------------------------------------------------------------------------
//  Derived geometry: panels and border zones
// ---------------------------------------------------------------------------

/// Stable per-slot panel identifier. Mappings keyed by `PanelId` survive
/// re-derivation of the panel rects; ids above the panel count are pruned
/// when the count shrinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(pub u32);

/// One rectangular cell of the collage, in surface pixel space. Purely
/// derived — regenerated whenever surface size, spec or panel count change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Panel {
    pub id: PanelId,
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Panel {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        self.rect().contains(px, py)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderAxis {
    /// Divider between column `index` and `index + 1` (drag moves it left/right).
    Vertical,
    /// Divider between row `index` and `index + 1` (drag moves it up/down).
    Horizontal,
}

/// Draggable hit-region over one internal grid division. Ephemeral, derived
/// alongside the panels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderZone {
    pub axis: BorderAxis,
    pub index: usize,
    pub hit: Rect,
    /// Divider center along the drag axis.
    pub center: f32,
}

// ---------------------------------------------------------------------------
//  Per-panel user state
// ---------------------------------------------------------------------------

/// User zoom/pan on top of the centered cover fit. `scale` is a multiplier
/// (1.0 = exactly covering); `position` is the panel-local pixel offset from
/// the centered placement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    pub scale: f32,
    pub position_x: f32,
    pub position_y: f32,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self { scale: 1.0, position_x: 0.0, position_y: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl HAlign {
    pub fn label(&self) -> &'static str {
        match self {
            HAlign::Left => "Left",
            HAlign::Center => "Center",
            HAlign::Right => "Right",
        }
    }

    pub fn all() -> &'static [HAlign] {
        &[HAlign::Left, HAlign::Center, HAlign::Right]
    }
}

/// Caption styling. `size: None` means "auto-fit to the panel".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub family: String,
    pub size: Option<f32>,
    pub weight: u16,
    pub italic: bool,
    pub color: [u8; 4],
    pub stroke_color: [u8; 4],
    pub stroke_width: f32,
    pub align: HAlign,
    /// Horizontal placement in −100..=100 (0 = centered).
    pub pos_x: f32,
    /// Vertical placement in −100..=100 (0 = near the bottom edge).
    pub pos_y: f32,
    /// Rotation in degrees about the text block center.
    pub rotation: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: None,
            weight: 400,
            italic: false,
            color: [255, 255, 255, 255],
            stroke_color: [0, 0, 0, 255],
            stroke_width: 2.0,
            align: HAlign::Center,
            pos_x: 0.0,
            pos_y: 0.0,
            rotation: 0.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionConfig {
    pub content: String,
    pub style: CaptionStyle,
}

impl CaptionConfig {
    /// True when there is real (non-whitespace) caption text.
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
//  Collage state
// ---------------------------------------------------------------------------

/// The whole editing model: declarative inputs (surface size, spec, count,
/// per-panel user state) plus the panels/zones derived from them.
///
/// Derivation is cheap and runs eagerly on every dependency change, so the
/// derived lists are always in sync with the inputs — there is no staleness
/// to invalidate.
#[derive(Clone, Debug)]
pub struct CollageState {
    surface_w: u32,
    surface_h: u32,
    border_px: f32,
    spec: LayoutSpec,
    panel_count: usize,

    /// Panel id → index into the host's image collection. Absent = empty panel.
    pub mapping: HashMap<PanelId, usize>,
    pub transforms: HashMap<PanelId, ImageTransform>,
    pub captions: HashMap<PanelId, CaptionConfig>,

    /// "Last used" caption style; seeds the style of newly created captions.
    pub caption_defaults: CaptionStyle,

    panels: Vec<Panel>,
    zones: Vec<BorderZone>,

    /// Bumped on every mutation that changes what a render would produce.
    revision: u64,
}

impl CollageState {
    pub fn new(surface_w: u32, surface_h: u32, spec: LayoutSpec, panel_count: usize) -> Self {
        let mut state = Self {
            surface_w: surface_w.max(1),
            surface_h: surface_h.max(1),
            border_px: DEFAULT_BORDER_PX,
            spec,
            panel_count: panel_count.max(1),
            mapping: HashMap::new(),
            transforms: HashMap::new(),
            captions: HashMap::new(),
            caption_defaults: CaptionStyle::default(),
            panels: Vec::new(),
            zones: Vec::new(),
            revision: 0,
        };
        state.derive();
        state
    }

    // ---- accessors ----------------------------------------------------------

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_w, self.surface_h)
    }

    pub fn border_px(&self) -> f32 {
        self.border_px
    }

    pub fn spec(&self) -> &LayoutSpec {
        &self.spec
    }

    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn zones(&self) -> &[BorderZone] {
        &self.zones
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn panel_by_id(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn panel_at(&self, x: f32, y: f32) -> Option<&Panel> {
        self.panels.iter().find(|p| p.contains(x, y))
    }

    /// Image index assigned to a panel, if any.
    pub fn image_for(&self, id: PanelId) -> Option<usize> {
        self.mapping.get(&id).copied()
    }

    /// Transform for a panel; identity when none was ever set.
    pub fn transform_for(&self, id: PanelId) -> ImageTransform {
        self.transforms.get(&id).copied().unwrap_or_default()
    }

    // ---- input mutation (each re-derives or bumps the revision) -------------

    pub fn set_surface_size(&mut self, w: u32, h: u32) {
        let (w, h) = (w.max(1), h.max(1));
        if (w, h) != (self.surface_w, self.surface_h) {
            self.surface_w = w;
            self.surface_h = h;
            self.derive();
        }
    }

    pub fn set_border_px(&mut self, border: f32) {
        let border = border.clamp(0.0, 64.0);
        if border != self.border_px {
            self.border_px = border;
            self.derive();
        }
    }

    pub fn set_spec(&mut self, spec: LayoutSpec) {
        if spec != self.spec {
            self.spec = spec;
            self.derive();
        }
    }

    pub fn set_panel_count(&mut self, count: usize) {
        let count = count.clamp(1, 32);
        if count != self.panel_count {
            self.panel_count = count;
            // Orphaned per-panel state is dropped, not resurrected later.
            self.mapping.retain(|id, _| (id.0 as usize) < count);
            self.transforms.retain(|id, _| (id.0 as usize) < count);
            self.captions.retain(|id, _| (id.0 as usize) < count);
            self.derive();
        }
    }

    /// Assign (or replace) the image shown in a panel. Resets the panel's
    /// transform: a different image invalidates the old pan/zoom.
    pub fn assign_image(&mut self, id: PanelId, image_index: usize) {
        self.mapping.insert(id, image_index);
        self.transforms.remove(&id);
        self.revision += 1;
    }

    /// Clear a panel back to the empty state.
    pub fn clear_image(&mut self, id: PanelId) {
        self.mapping.remove(&id);
        self.transforms.remove(&id);
        self.revision += 1;
    }

    /// Remove an image from the collection: drop mappings to it and shift
    /// higher indices down (mirrors removal from the host's image list).
    pub fn remove_image_index(&mut self, image_index: usize) {
        self.mapping.retain(|_, idx| *idx != image_index);
        for idx in self.mapping.values_mut() {
            if *idx > image_index {
                *idx -= 1;
            }
        }
        self.revision += 1;
    }

    pub fn set_transform(&mut self, id: PanelId, t: ImageTransform) {
        self.transforms.insert(id, t);
        self.revision += 1;
    }

    /// Store caption text/style for a panel and remember the style as the
    /// session default for future captions.
    pub fn set_caption(&mut self, id: PanelId, cfg: CaptionConfig) {
        self.caption_defaults = cfg.style.clone();
        self.captions.insert(id, cfg);
        self.revision += 1;
    }

    /// Caption for a panel, or a fresh one seeded from the session defaults.
    pub fn caption_or_default(&self, id: PanelId) -> CaptionConfig {
        self.captions.get(&id).cloned().unwrap_or_else(|| CaptionConfig {
            content: String::new(),
            style: self.caption_defaults.clone(),
        })
    }

    /// Apply a border-drag delta: redistribute the two neighboring track
    /// weights and re-derive. Returns the new spec for the layout-changed
    /// notification, or `None` when the delta was fully absorbed by clamping.
    pub fn drag_border(&mut self, axis: BorderAxis, index: usize, delta_px: f32) -> Option<LayoutSpec> {
        let adjusted = layout::drag_border(
            &self.spec,
            axis,
            index,
            delta_px,
            self.surface_w as f32,
            self.surface_h as f32,
            self.border_px,
        )?;
        self.spec = adjusted.clone();
        self.derive();
        Some(adjusted)
    }

    // ---- derivation ---------------------------------------------------------

    /// Re-derive panels and border zones from the current inputs. Runs on
    /// every dependency change, including each border-drag frame.
    fn derive(&mut self) {
        self.panels = layout::resolve_panels(
            &self.spec,
            self.panel_count,
            self.surface_w as f32,
            self.surface_h as f32,
            self.border_px,
        );
        self.zones = layout::derive_zones(
            &self.spec,
            self.surface_w as f32,
            self.surface_h as f32,
            self.border_px,
        );
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_regenerate_on_resize() {
        let mut state = CollageState::new(400, 200, LayoutSpec::grid(vec![1.0, 1.0], vec![1.0]), 2);
        state.set_border_px(0.0);
        let before: Vec<Rect> = state.panels().iter().map(|p| p.rect()).collect();
        state.set_surface_size(800, 200);
        let after: Vec<Rect> = state.panels().iter().map(|p| p.rect()).collect();
        assert_ne!(before, after);
        assert_eq!(after[1].x, 400.0);
    }

    #[test]
    fn shrinking_panel_count_prunes_orphaned_state() {
        let mut state = CollageState::new(400, 400, LayoutSpec::uniform(2, 2), 4);
        state.assign_image(PanelId(3), 0);
        state.set_caption(PanelId(3), CaptionConfig { content: "x".into(), ..Default::default() });
        state.set_panel_count(2);
        assert!(state.image_for(PanelId(3)).is_none());
        assert!(state.captions.get(&PanelId(3)).is_none());
    }

    #[test]
    fn removing_an_image_shifts_higher_mappings() {
        let mut state = CollageState::new(400, 400, LayoutSpec::uniform(2, 2), 4);
        state.assign_image(PanelId(0), 0);
        state.assign_image(PanelId(1), 1);
        state.assign_image(PanelId(2), 2);
        state.remove_image_index(1);
        assert_eq!(state.image_for(PanelId(0)), Some(0));
        assert_eq!(state.image_for(PanelId(1)), None);
        assert_eq!(state.image_for(PanelId(2)), Some(1));
    }

    #[test]
    fn caption_style_becomes_session_default() {
        let mut state = CollageState::new(400, 400, LayoutSpec::uniform(2, 2), 4);
        let mut cfg = CaptionConfig { content: "hello".into(), ..Default::default() };
        cfg.style.stroke_width = 4.0;
        state.set_caption(PanelId(0), cfg);
        assert_eq!(state.caption_or_default(PanelId(1)).style.stroke_width, 4.0);
    }
}
