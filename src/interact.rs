// ============================================================================
// INTERACTION — hit-test precedence, gesture routing, mode state machine
// ============================================================================
//
// All pointer/touch/wheel input funnels through one InteractionSession. The
// session owns every piece of transient UI state (hover settle timer, press
// tracking, pinch baseline) as explicit fields with a start/update/end
// lifecycle, so the whole state machine runs without any UI toolkit: events
// carry surface-space coordinates and a caller-supplied timestamp.
//
// Hit precedence per event, top to bottom:
//   1. an active border drag consumes everything until release;
//   2. a border zone under the pointer (only when no panel is in transform
//      or caption-editing) wins over panel content;
//   3./4. an active caption-edit/transform panel captures its own rect and
//      turns small outside taps into dismissals;
//   5. caption activation zones, then plain panel taps.

use crate::collage::{BorderAxis, BorderZone, CollageState, ImageTransform, LayoutSpec, PanelId};
use crate::ops::captions::{self, TextMeasure};
use crate::ops::{fit, layout};

/// Hover is applied only after the pointer rests this long over a panel,
/// to avoid flicker during momentum scrolling. Leaving clears immediately.
pub const HOVER_SETTLE_SECS: f64 = 0.05;

/// A press is a tap (and can dismiss an active mode) only when it travels
/// less than this and releases within [`DISMISS_MAX_SECS`]. Longer or
/// farther presses are incidental scrolls/drags and must not dismiss.
pub const TAP_SLOP_PX: f32 = 4.0;
pub const DISMISS_MAX_SECS: f64 = 0.5;

/// Wheel delta → zoom factor rate (factor = 1 + delta × rate).
pub const WHEEL_ZOOM_RATE: f32 = 0.005;

// ---------------------------------------------------------------------------
//  Events
// ---------------------------------------------------------------------------

/// Raw input in surface pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    Wheel { x: f32, y: f32, delta: f32 },
    TouchStart { id: u64, x: f32, y: f32 },
    TouchMove { id: u64, x: f32, y: f32 },
    TouchEnd { id: u64, x: f32, y: f32 },
}

/// User intent surfaced to the host. The host decides what a panel
/// activation means (pick a file, open the library, show a replace menu).
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    PanelActivated { index: usize, id: PanelId },
    CaptionChanged { id: PanelId },
    TransformChanged { id: PanelId, transform: ImageTransform },
    LayoutChanged(LayoutSpec),
}

/// Exactly one interaction mode at any instant. At most one panel can be in
/// `Transform` or `CaptionEditing`; border dragging excludes both.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionMode {
    Idle,
    Hovering(usize),
    Transform(PanelId),
    CaptionEditing(PanelId),
    BorderDragging(BorderZone),
}

// ---------------------------------------------------------------------------
//  Session internals
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
enum PressKind {
    /// Undecided; resolves to tap/dismiss (or nothing) on release.
    Tap,
    /// Dragging the image inside a transform-mode panel.
    PanDrag(PanelId),
    /// Dragging the border zone held in the mode.
    BorderDrag,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    kind: PressKind,
    start_t: f64,
    last_x: f32,
    last_y: f32,
    max_travel: f32,
    start_x: f32,
    start_y: f32,
}

impl Press {
    fn new(kind: PressKind, x: f32, y: f32, now: f64) -> Self {
        Self { kind, start_t: now, last_x: x, last_y: y, max_travel: 0.0, start_x: x, start_y: y }
    }

    fn advance(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = (x - self.last_x, y - self.last_y);
        self.last_x = x;
        self.last_y = y;
        let travel = ((x - self.start_x).powi(2) + (y - self.start_y).powi(2)).sqrt();
        self.max_travel = self.max_travel.max(travel);
        delta
    }

    fn is_tap(&self, now: f64) -> bool {
        self.max_travel <= TAP_SLOP_PX && now - self.start_t <= DISMISS_MAX_SECS
    }
}

#[derive(Clone, Copy, Debug)]
struct TouchPoint {
    id: u64,
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug)]
struct Pinch {
    panel: PanelId,
    start_dist: f32,
    start_scale: f32,
}

/// Everything the router needs besides its own state: the collage model,
/// the natural size of each decoded image (None while still loading), and
/// a text measurer for caption activation zones.
pub struct RouterCtx<'a> {
    pub state: &'a mut CollageState,
    pub image_sizes: &'a [Option<(u32, u32)>],
    pub measure: &'a dyn TextMeasure,
}

impl RouterCtx<'_> {
    /// Natural size of the image assigned to a panel, when decoded.
    fn image_size_for(&self, id: PanelId) -> Option<(u32, u32)> {
        let idx = self.state.image_for(id)?;
        self.image_sizes.get(idx).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
//  Session
// ---------------------------------------------------------------------------

pub struct InteractionSession {
    mode: InteractionMode,
    hover_candidate: Option<(usize, f64)>,
    press: Option<Press>,
    touches: Vec<TouchPoint>,
    pinch: Option<Pinch>,
}

impl Default for InteractionSession {
    fn default() -> Self {
        Self::start()
    }
}

impl InteractionSession {
    /// Begin a fresh session (idle, no timers, no captured gestures).
    pub fn start() -> Self {
        Self {
            mode: InteractionMode::Idle,
            hover_candidate: None,
            press: None,
            touches: Vec::new(),
            pinch: None,
        }
    }

    /// Tear the session down: cancels the hover timer and any in-flight
    /// drag/pinch, returning to idle.
    pub fn end(&mut self) {
        self.mode = InteractionMode::Idle;
        self.hover_candidate = None;
        self.press = None;
        self.touches.clear();
        self.pinch = None;
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Panel currently in transform mode, if any.
    pub fn transform_panel(&self) -> Option<PanelId> {
        match self.mode {
            InteractionMode::Transform(id) => Some(id),
            _ => None,
        }
    }

    /// Panel currently in caption-editing mode, if any.
    pub fn caption_panel(&self) -> Option<PanelId> {
        match self.mode {
            InteractionMode::CaptionEditing(id) => Some(id),
            _ => None,
        }
    }

    pub fn hovered_panel(&self) -> Option<usize> {
        match self.mode {
            InteractionMode::Hovering(i) => Some(i),
            _ => None,
        }
    }

    // ---- host-driven mode entry ---------------------------------------------

    /// Enter transform mode on a populated panel. Legal only from idle or
    /// hover — an active mode must be dismissed first.
    pub fn begin_transform(&mut self, state: &CollageState, id: PanelId) -> bool {
        if !matches!(self.mode, InteractionMode::Idle | InteractionMode::Hovering(_)) {
            return false;
        }
        if state.panel_by_id(id).is_none() || state.image_for(id).is_none() {
            return false;
        }
        self.mode = InteractionMode::Transform(id);
        self.hover_candidate = None;
        true
    }

    /// Enter caption-editing mode on a panel. Legal only from idle or hover.
    pub fn begin_caption_edit(&mut self, state: &CollageState, id: PanelId) -> bool {
        if !matches!(self.mode, InteractionMode::Idle | InteractionMode::Hovering(_)) {
            return false;
        }
        if state.panel_by_id(id).is_none() {
            return false;
        }
        self.mode = InteractionMode::CaptionEditing(id);
        self.hover_candidate = None;
        true
    }

    /// Leave transform/caption-editing/border-drag, back to idle.
    pub fn end_active_mode(&mut self) {
        self.mode = InteractionMode::Idle;
        self.press = None;
        self.pinch = None;
    }

    // ---- frame tick ---------------------------------------------------------

    /// Promote a settled hover candidate. Call once per frame.
    pub fn tick(&mut self, now: f64) {
        if let Some((index, since)) = self.hover_candidate
            && matches!(self.mode, InteractionMode::Idle | InteractionMode::Hovering(_))
            && now - since >= HOVER_SETTLE_SECS
        {
            self.mode = InteractionMode::Hovering(index);
            self.hover_candidate = None;
        }
    }

    // ---- event routing ------------------------------------------------------

    pub fn handle_event(&mut self, ctx: &mut RouterCtx, ev: InputEvent, now: f64) -> Vec<EngineEvent> {
        match ev {
            InputEvent::PointerDown { x, y } => self.press_at(ctx, x, y, now),
            InputEvent::PointerMove { x, y } => self.move_to(ctx, x, y, now),
            InputEvent::PointerUp { x, y } => self.release_at(ctx, x, y, now),
            InputEvent::Wheel { x, y, delta } => self.wheel(ctx, x, y, delta),
            InputEvent::TouchStart { id, x, y } => self.touch_start(ctx, id, x, y, now),
            InputEvent::TouchMove { id, x, y } => self.touch_move(ctx, id, x, y, now),
            InputEvent::TouchEnd { id, x, y } => self.touch_end(ctx, id, x, y, now),
        }
    }

    fn press_at(&mut self, ctx: &mut RouterCtx, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        if matches!(self.mode, InteractionMode::BorderDragging(_)) {
            // Stray double-down mid drag: keep the existing gesture.
            return Vec::new();
        }

        // Border zones are only eligible while no panel mode is active.
        if matches!(self.mode, InteractionMode::Idle | InteractionMode::Hovering(_))
            && let Some(zone) = layout::zone_at(ctx.state.zones(), x, y)
        {
            self.mode = InteractionMode::BorderDragging(zone);
            self.hover_candidate = None;
            self.press = Some(Press::new(PressKind::BorderDrag, x, y, now));
            return Vec::new();
        }

        let kind = match self.mode {
            InteractionMode::Transform(id) => {
                let inside = ctx.state.panel_by_id(id).is_some_and(|p| p.contains(x, y));
                if inside && ctx.image_size_for(id).is_some() {
                    PressKind::PanDrag(id)
                } else {
                    PressKind::Tap
                }
            }
            _ => PressKind::Tap,
        };
        self.press = Some(Press::new(kind, x, y, now));
        Vec::new()
    }

    fn move_to(&mut self, ctx: &mut RouterCtx, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if let Some(mut press) = self.press.take() {
            let (dx, dy) = press.advance(x, y);
            match press.kind {
                PressKind::BorderDrag => {
                    if let InteractionMode::BorderDragging(zone) = self.mode {
                        let delta = match zone.axis {
                            BorderAxis::Vertical => dx,
                            BorderAxis::Horizontal => dy,
                        };
                        if let Some(spec) = ctx.state.drag_border(zone.axis, zone.index, delta) {
                            events.push(EngineEvent::LayoutChanged(spec));
                            // The divider moved: re-bind the mode to the
                            // freshly derived zone so the next delta uses
                            // current geometry.
                            if let Some(updated) = ctx
                                .state
                                .zones()
                                .iter()
                                .find(|z| z.axis == zone.axis && z.index == zone.index)
                            {
                                self.mode = InteractionMode::BorderDragging(*updated);
                            }
                        }
                    }
                }
                PressKind::PanDrag(id) => {
                    events.extend(self.pan_panel(ctx, id, dx, dy));
                }
                PressKind::Tap => {}
            }
            self.press = Some(press);
            return events;
        }

        // No press: hover bookkeeping (idle/hover only).
        if matches!(self.mode, InteractionMode::Idle | InteractionMode::Hovering(_)) {
            match ctx.state.panel_at(x, y) {
                Some(panel) => {
                    let index = panel.index;
                    if self.mode != InteractionMode::Hovering(index)
                        && self.hover_candidate.map(|(i, _)| i) != Some(index)
                    {
                        self.hover_candidate = Some((index, now));
                    }
                }
                None => {
                    // Leaving panels clears hover immediately, no settle delay.
                    if matches!(self.mode, InteractionMode::Hovering(_)) {
                        self.mode = InteractionMode::Idle;
                    }
                    self.hover_candidate = None;
                }
            }
            self.tick(now);
        }
        events
    }

    fn release_at(&mut self, ctx: &mut RouterCtx, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        let Some(mut press) = self.press.take() else {
            return Vec::new();
        };
        press.advance(x, y);

        match self.mode {
            InteractionMode::BorderDragging(_) => {
                // Release always ends the drag; there is no timeout path.
                self.mode = InteractionMode::Idle;
                Vec::new()
            }
            InteractionMode::Transform(id) => {
                if press.kind == PressKind::Tap {
                    self.maybe_dismiss(ctx, id, &press, x, y, now);
                }
                Vec::new()
            }
            InteractionMode::CaptionEditing(id) => {
                self.maybe_dismiss(ctx, id, &press, x, y, now);
                Vec::new()
            }
            InteractionMode::Idle | InteractionMode::Hovering(_) => {
                if press.is_tap(now) {
                    self.resolve_tap(ctx, x, y)
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Tap outside the active panel → dismiss back to idle. Long or moving
    /// presses are scrolls and leave the mode alone.
    fn maybe_dismiss(&mut self, ctx: &RouterCtx, active: PanelId, press: &Press, x: f32, y: f32, now: f64) {
        let inside = ctx.state.panel_by_id(active).is_some_and(|p| p.contains(x, y));
        if !inside && press.is_tap(now) {
            self.mode = InteractionMode::Idle;
            self.pinch = None;
        }
    }

    /// Idle-mode tap: caption activation zone first, then plain panel
    /// activation (empty panels included — the host treats that as "assign
    /// an image"). Taps on no panel at all are silently ignored.
    fn resolve_tap(&mut self, ctx: &mut RouterCtx, x: f32, y: f32) -> Vec<EngineEvent> {
        let Some(panel) = ctx.state.panel_at(x, y).copied() else {
            return Vec::new();
        };
        let has_image = ctx.image_size_for(panel.id).is_some();
        let cfg = ctx.state.caption_or_default(panel.id);
        if let Some(layout) =
            captions::layout_caption(panel.width, panel.height, &cfg, has_image, ctx.measure)
        {
            let local_x = x - panel.x;
            let local_y = y - panel.y;
            if layout.hit_box.contains(local_x, local_y) {
                self.mode = InteractionMode::CaptionEditing(panel.id);
                self.hover_candidate = None;
                return Vec::new();
            }
        }
        vec![EngineEvent::PanelActivated { index: panel.index, id: panel.id }]
    }

    fn wheel(&mut self, ctx: &mut RouterCtx, x: f32, y: f32, delta: f32) -> Vec<EngineEvent> {
        // Wheel only zooms the transform-mode panel under the pointer;
        // anything else stays pass-through for native scrolling.
        let InteractionMode::Transform(id) = self.mode else {
            return Vec::new();
        };
        let Some(panel) = ctx.state.panel_by_id(id).copied() else {
            return Vec::new();
        };
        if !panel.contains(x, y) {
            return Vec::new();
        }
        let Some((img_w, img_h)) = ctx.image_size_for(id) else {
            return Vec::new();
        };

        let current = ctx.state.transform_for(id);
        let factor = 1.0 + delta * WHEEL_ZOOM_RATE;
        let next = fit::zoom_at(
            img_w,
            img_h,
            panel.width,
            panel.height,
            current,
            x - panel.x,
            y - panel.y,
            current.scale * factor,
        );
        if next == current {
            return Vec::new();
        }
        ctx.state.set_transform(id, next);
        vec![EngineEvent::TransformChanged { id, transform: next }]
    }

    fn pan_panel(&mut self, ctx: &mut RouterCtx, id: PanelId, dx: f32, dy: f32) -> Vec<EngineEvent> {
        let Some(panel) = ctx.state.panel_by_id(id).copied() else {
            return Vec::new();
        };
        let Some((img_w, img_h)) = ctx.image_size_for(id) else {
            return Vec::new();
        };
        let current = ctx.state.transform_for(id);
        let next = fit::pan_by(img_w, img_h, panel.width, panel.height, current, dx, dy);
        if next == current {
            return Vec::new();
        }
        ctx.state.set_transform(id, next);
        vec![EngineEvent::TransformChanged { id, transform: next }]
    }

    // ---- touch path ---------------------------------------------------------

    fn touch_start(&mut self, ctx: &mut RouterCtx, id: u64, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        self.touches.retain(|t| t.id != id);
        self.touches.push(TouchPoint { id, x, y });

        if let InteractionMode::Transform(panel) = self.mode
            && self.touches.len() == 2
        {
            // Second finger: promote to a pinch session. The single-finger
            // press (pan or tap) is cancelled, not resolved.
            self.press = None;
            self.pinch = Some(Pinch {
                panel,
                start_dist: self.touch_distance().max(1.0),
                start_scale: ctx.state.transform_for(panel).scale,
            });
            return Vec::new();
        }
        if self.touches.len() == 1 {
            return self.press_at(ctx, x, y, now);
        }
        Vec::new()
    }

    fn touch_move(&mut self, ctx: &mut RouterCtx, id: u64, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        if let Some(t) = self.touches.iter_mut().find(|t| t.id == id) {
            t.x = x;
            t.y = y;
        }

        if let Some(pinch) = self.pinch
            && self.touches.len() >= 2
        {
            return self.apply_pinch(ctx, pinch);
        }
        if self.touches.len() == 1 {
            return self.move_to(ctx, x, y, now);
        }
        Vec::new()
    }

    fn touch_end(&mut self, ctx: &mut RouterCtx, id: u64, x: f32, y: f32, now: f64) -> Vec<EngineEvent> {
        let was_single = self.touches.len() == 1;
        self.touches.retain(|t| t.id != id);

        if self.touches.len() < 2 && self.pinch.is_some() {
            self.pinch = None;
            // A leftover finger starts a fresh pan rather than inheriting
            // the pinch baseline (which would make the image jump).
            if let (InteractionMode::Transform(panel), Some(rest)) =
                (self.mode, self.touches.first().copied())
            {
                let kind = if ctx.image_size_for(panel).is_some() {
                    PressKind::PanDrag(panel)
                } else {
                    PressKind::Tap
                };
                self.press = Some(Press::new(kind, rest.x, rest.y, now));
            }
            return Vec::new();
        }
        if was_single {
            return self.release_at(ctx, x, y, now);
        }
        Vec::new()
    }

    fn apply_pinch(&mut self, ctx: &mut RouterCtx, pinch: Pinch) -> Vec<EngineEvent> {
        let Some(panel) = ctx.state.panel_by_id(pinch.panel).copied() else {
            return Vec::new();
        };
        let Some((img_w, img_h)) = ctx.image_size_for(pinch.panel) else {
            return Vec::new();
        };
        let ratio = self.touch_distance().max(1.0) / pinch.start_dist;
        let (mid_x, mid_y) = self.touch_midpoint();

        let current = ctx.state.transform_for(pinch.panel);
        let next = fit::zoom_at(
            img_w,
            img_h,
            panel.width,
            panel.height,
            current,
            mid_x - panel.x,
            mid_y - panel.y,
            pinch.start_scale * ratio,
        );
        if next == current {
            return Vec::new();
        }
        ctx.state.set_transform(pinch.panel, next);
        vec![EngineEvent::TransformChanged { id: pinch.panel, transform: next }]
    }

    fn touch_distance(&self) -> f32 {
        if self.touches.len() < 2 {
            return 0.0;
        }
        let (a, b) = (self.touches[0], self.touches[1]);
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    fn touch_midpoint(&self) -> (f32, f32) {
        if self.touches.len() < 2 {
            return (0.0, 0.0);
        }
        let (a, b) = (self.touches[0], self.touches[1]);
        ((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::{CaptionConfig, CaptionStyle, LayoutSpec};

    /// Fixed-advance measurer so caption hit zones are predictable.
    struct Mono;

    impl TextMeasure for Mono {
        fn line_width(&self, text: &str, _style: &CaptionStyle, _size: f32) -> f32 {
            text.chars().count() as f32 * 8.0
        }
        fn line_height(&self, _style: &CaptionStyle, _size: f32) -> f32 {
            20.0
        }
    }

    fn state_2x1() -> CollageState {
        let mut s = CollageState::new(400, 200, LayoutSpec::grid(vec![1.0, 1.0], vec![1.0]), 2);
        s.set_border_px(0.0);
        s
    }

    fn ev(session: &mut InteractionSession, state: &mut CollageState, sizes: &[Option<(u32, u32)>], e: InputEvent, now: f64) -> Vec<EngineEvent> {
        let mut ctx = RouterCtx { state, image_sizes: sizes, measure: &Mono };
        session.handle_event(&mut ctx, e, now)
    }

    #[test]
    fn tap_on_a_panel_activates_it() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 300.0, y: 100.0 }, 0.0);
        let events = ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 300.0, y: 100.0 }, 0.1);
        assert_eq!(events, vec![EngineEvent::PanelActivated { index: 1, id: PanelId(1) }]);
    }

    #[test]
    fn slow_or_travelling_presses_do_not_activate() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        // Too slow.
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 100.0, y: 100.0 }, 0.0);
        assert!(ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 100.0, y: 100.0 }, 0.8).is_empty());
        // Too far.
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 100.0, y: 100.0 }, 1.0);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 140.0, y: 100.0 }, 1.05);
        assert!(ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 100.0, y: 100.0 }, 1.1).is_empty());
    }

    #[test]
    fn hover_settles_after_the_delay_and_clears_immediately() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 50.0, y: 50.0 }, 0.0);
        assert_eq!(session.mode(), InteractionMode::Idle);
        session.tick(0.01);
        assert_eq!(session.mode(), InteractionMode::Idle);
        session.tick(0.06);
        assert_eq!(session.mode(), InteractionMode::Hovering(0));
        // Off every panel: cleared with no delay.
        state.set_border_px(20.0);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 1.0, y: 1.0 }, 0.07);
        assert_eq!(session.mode(), InteractionMode::Idle);
    }

    #[test]
    fn border_zone_wins_over_panel_content_when_idle() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 200.0, y: 100.0 }, 0.0);
        assert!(matches!(session.mode(), InteractionMode::BorderDragging(z) if z.axis == BorderAxis::Vertical));
        let events = ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 240.0, y: 100.0 }, 0.05);
        assert!(matches!(events.as_slice(), [EngineEvent::LayoutChanged(_)]));
        // Weight sum conserved through the drag.
        let sum: f32 = state.spec().columns.iter().sum();
        assert!((sum - 2.0).abs() < 1e-4);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 240.0, y: 100.0 }, 0.1);
        assert_eq!(session.mode(), InteractionMode::Idle);
    }

    #[test]
    fn border_zones_are_ineligible_while_a_panel_mode_is_active() {
        let mut state = state_2x1();
        let sizes = [Some((800u32, 600u32))];
        state.assign_image(PanelId(0), 0);
        let mut session = InteractionSession::start();
        assert!(session.begin_transform(&state, PanelId(0)));
        let spec_before = state.spec().clone();
        // Press on the divider: must NOT start a border drag.
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 200.0, y: 100.0 }, 0.0);
        assert!(matches!(session.mode(), InteractionMode::Transform(_)));
        ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 260.0, y: 100.0 }, 0.05);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 260.0, y: 100.0 }, 0.1);
        assert_eq!(state.spec(), &spec_before);
    }

    #[test]
    fn outside_tap_dismisses_transform_mode() {
        let mut state = state_2x1();
        let sizes = [Some((800u32, 600u32))];
        state.assign_image(PanelId(0), 0);
        let mut session = InteractionSession::start();
        assert!(session.begin_transform(&state, PanelId(0)));
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 300.0, y: 100.0 }, 0.0);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 300.0, y: 100.0 }, 0.1);
        assert_eq!(session.mode(), InteractionMode::Idle);
    }

    #[test]
    fn scrolling_touch_outside_does_not_dismiss_caption_editing() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        assert!(session.begin_caption_edit(&state, PanelId(0)));
        // A long, travelling press outside the panel (page scroll).
        ev(&mut session, &mut state, &sizes, InputEvent::TouchStart { id: 1, x: 300.0, y: 100.0 }, 0.0);
        ev(&mut session, &mut state, &sizes, InputEvent::TouchMove { id: 1, x: 300.0, y: 160.0 }, 0.3);
        ev(&mut session, &mut state, &sizes, InputEvent::TouchEnd { id: 1, x: 300.0, y: 160.0 }, 0.7);
        assert_eq!(session.mode(), InteractionMode::CaptionEditing(PanelId(0)));
        // A quick small tap outside does dismiss.
        ev(&mut session, &mut state, &sizes, InputEvent::TouchStart { id: 2, x: 300.0, y: 100.0 }, 1.0);
        ev(&mut session, &mut state, &sizes, InputEvent::TouchEnd { id: 2, x: 300.0, y: 100.0 }, 1.1);
        assert_eq!(session.mode(), InteractionMode::Idle);
    }

    #[test]
    fn drag_in_transform_mode_pans_and_stays_clamped() {
        let mut state = state_2x1();
        let sizes = [Some((800u32, 200u32))];
        state.assign_image(PanelId(0), 0);
        let mut session = InteractionSession::start();
        assert!(session.begin_transform(&state, PanelId(0)));

        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 100.0, y: 100.0 }, 0.0);
        let events = ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 150.0, y: 100.0 }, 0.05);
        assert!(matches!(events.as_slice(), [EngineEvent::TransformChanged { .. }]));
        let t = state.transform_for(PanelId(0));
        // 800×200 in a 200×200 panel: x range is ±300, y is pinned.
        assert!(t.position_x <= 300.0 && t.position_x > 0.0);
        assert_eq!(t.position_y, 0.0);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 150.0, y: 100.0 }, 0.1);
        assert!(matches!(session.mode(), InteractionMode::Transform(_)));
    }

    #[test]
    fn two_finger_pinch_scales_about_the_midpoint() {
        let mut state = state_2x1();
        let sizes = [Some((800u32, 600u32))];
        state.assign_image(PanelId(0), 0);
        let mut session = InteractionSession::start();
        assert!(session.begin_transform(&state, PanelId(0)));

        ev(&mut session, &mut state, &sizes, InputEvent::TouchStart { id: 1, x: 80.0, y: 100.0 }, 0.0);
        ev(&mut session, &mut state, &sizes, InputEvent::TouchStart { id: 2, x: 120.0, y: 100.0 }, 0.01);
        // Spread the fingers to twice the distance: scale doubles.
        ev(&mut session, &mut state, &sizes, InputEvent::TouchMove { id: 1, x: 60.0, y: 100.0 }, 0.05);
        let events = ev(&mut session, &mut state, &sizes, InputEvent::TouchMove { id: 2, x: 140.0, y: 100.0 }, 0.06);
        assert!(matches!(events.as_slice(), [EngineEvent::TransformChanged { .. }]));
        let t = state.transform_for(PanelId(0));
        assert!((t.scale - 2.0).abs() < 1e-3);
        // Lifting one finger ends the pinch; the other can keep panning.
        ev(&mut session, &mut state, &sizes, InputEvent::TouchEnd { id: 1, x: 60.0, y: 100.0 }, 0.1);
        assert!(session.pinch.is_none());
        assert!(matches!(session.mode(), InteractionMode::Transform(_)));
    }

    #[test]
    fn tap_on_caption_zone_enters_caption_editing() {
        let mut state = state_2x1();
        let sizes = [Some((800u32, 600u32))];
        state.assign_image(PanelId(0), 0);
        state.set_caption(
            PanelId(0),
            CaptionConfig { content: "hello".into(), style: CaptionStyle { size: Some(20.0), ..Default::default() } },
        );
        let mut session = InteractionSession::start();
        // Default anchor: caption block bottom sits at 95% of panel height,
        // centered horizontally. Tap just above it.
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 100.0, y: 180.0 }, 0.0);
        let events = ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 100.0, y: 180.0 }, 0.05);
        assert!(events.is_empty());
        assert_eq!(session.mode(), InteractionMode::CaptionEditing(PanelId(0)));
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        let mut state = state_2x1();
        state.assign_image(PanelId(0), 0);
        state.assign_image(PanelId(1), 1);
        let mut session = InteractionSession::start();
        assert!(session.begin_transform(&state, PanelId(0)));
        // No second transform, no caption edit, while one is active.
        assert!(!session.begin_transform(&state, PanelId(1)));
        assert!(!session.begin_caption_edit(&state, PanelId(1)));
        session.end_active_mode();
        assert!(session.begin_caption_edit(&state, PanelId(1)));
        assert!(!session.begin_transform(&state, PanelId(0)));
    }

    #[test]
    fn events_with_no_panel_or_zone_are_ignored() {
        let mut state = state_2x1();
        state.set_border_px(20.0);
        let sizes = [];
        let mut session = InteractionSession::start();
        // Press/release in the outer margin.
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 2.0, y: 2.0 }, 0.0);
        let events = ev(&mut session, &mut state, &sizes, InputEvent::PointerUp { x: 2.0, y: 2.0 }, 0.05);
        assert!(events.is_empty());
        assert_eq!(session.mode(), InteractionMode::Idle);
    }

    #[test]
    fn session_end_clears_all_transient_state() {
        let mut state = state_2x1();
        let sizes = [];
        let mut session = InteractionSession::start();
        ev(&mut session, &mut state, &sizes, InputEvent::PointerMove { x: 50.0, y: 50.0 }, 0.0);
        ev(&mut session, &mut state, &sizes, InputEvent::PointerDown { x: 200.0, y: 100.0 }, 0.01);
        session.end();
        assert_eq!(session.mode(), InteractionMode::Idle);
        assert!(session.press.is_none());
        assert!(session.hover_candidate.is_none());
    }
}
