// ============================================================================
// EDITOR VIEW — the interactive collage surface inside the egui window
// ============================================================================
//
// Owns the preview texture and the screen↔surface coordinate mapping. All
// gesture interpretation lives in `interact::InteractionSession`; this
// widget only translates egui input into surface-space `InputEvent`s and
// keeps the texture in sync with the model revision.

use std::sync::Arc;

use eframe::egui;
use egui::{Color32, ColorImage, Rect as UiRect, TextureOptions, Vec2, pos2};
use image::RgbaImage;

use crate::collage::{BorderAxis, CollageState};
use crate::interact::{EngineEvent, InputEvent, InteractionMode, InteractionSession, RouterCtx, WHEEL_ZOOM_RATE};
use crate::ops::captions::TextMeasure;
use crate::ops::layout;
use crate::ops::text::FontStore;
use crate::render::{self, InteractionSnapshot};

pub struct EditorView {
    texture: Option<egui::TextureHandle>,
    rendered_revision: u64,
    rendered_snapshot: InteractionSnapshot,
    last_pointer: Option<(f32, f32)>,
}

impl EditorView {
    pub fn new() -> Self {
        Self {
            texture: None,
            rendered_revision: u64::MAX,
            rendered_snapshot: InteractionSnapshot::default(),
            last_pointer: None,
        }
    }

    /// Force a re-render on the next frame (e.g. after an image decoded).
    pub fn invalidate(&mut self) {
        self.rendered_revision = u64::MAX;
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut CollageState,
        images: &[Option<Arc<RgbaImage>>],
        fonts: &FontStore,
        session: &mut InteractionSession,
        measure: &dyn TextMeasure,
    ) -> Vec<EngineEvent> {
        let now = ui.input(|i| i.time);
        session.tick(now);

        let snapshot = snapshot_of(session);
        if self.rendered_revision != state.revision() || self.rendered_snapshot != snapshot {
            let preview = render::render(state, images, fonts, &snapshot);
            let color_image = ColorImage::from_rgba_unmultiplied(
                [preview.width() as usize, preview.height() as usize],
                preview.as_raw(),
            );
            match &mut self.texture {
                Some(tex) => tex.set(color_image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ui.ctx().load_texture(
                        "collage-preview",
                        color_image,
                        TextureOptions::LINEAR,
                    ));
                }
            }
            self.rendered_revision = state.revision();
            self.rendered_snapshot = snapshot;
        }

        let available = ui.available_size();
        let sense = egui::Sense::click_and_drag().union(egui::Sense::hover());
        let (response, painter) = ui.allocate_painter(available, sense);

        // Letterbox the surface into the widget, preserving aspect.
        let (sw, sh) = state.surface_size();
        let scale = (available.x / sw as f32)
            .min(available.y / sh as f32)
            .min(1.0)
            .max(0.01);
        let disp = Vec2::new(sw as f32 * scale, sh as f32 * scale);
        let origin = response.rect.center() - disp * 0.5;
        let display_rect = UiRect::from_min_size(origin, disp);

        if let Some(tex) = &self.texture {
            painter.image(
                tex.id(),
                display_rect,
                UiRect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        let to_surface = |pos: egui::Pos2| -> (f32, f32) {
            (
                (pos.x - display_rect.min.x) / scale,
                (pos.y - display_rect.min.y) / scale,
            )
        };

        let sizes = image_sizes(images);
        let mut events = Vec::new();
        let mut emit = |session: &mut InteractionSession, state: &mut CollageState, ev: InputEvent| {
            let mut ctx = RouterCtx { state, image_sizes: &sizes, measure };
            events.extend(session.handle_event(&mut ctx, ev, now));
        };

        let hover_pos = response.hover_pos();
        let (pressed, down, released) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
            )
        });
        let over_ui = ui.ctx().is_pointer_over_area() && !response.hovered();

        if let Some(pos) = hover_pos {
            let (sx, sy) = to_surface(pos);
            if pressed && !over_ui {
                emit(session, state, InputEvent::PointerDown { x: sx, y: sy });
            }
            if self.last_pointer != Some((sx, sy)) && (down || !pressed) {
                emit(session, state, InputEvent::PointerMove { x: sx, y: sy });
                self.last_pointer = Some((sx, sy));
            }
            if released {
                emit(session, state, InputEvent::PointerUp { x: sx, y: sy });
            }

            // Wheel zoom: consumed only while the pointed-at panel is in
            // transform mode, so ordinary page scrolling stays native.
            let zooming = matches!(session.mode(), InteractionMode::Transform(id)
                if state.panel_by_id(id).is_some_and(|p| p.contains(sx, sy)));
            if zooming {
                let scroll = ui.ctx().input_mut(|i| {
                    let dy = i.scroll_delta.y;
                    if dy.abs() > 0.1 {
                        i.scroll_delta.y = 0.0;
                    }
                    dy
                });
                if scroll.abs() > 0.1 {
                    emit(session, state, InputEvent::Wheel { x: sx, y: sy, delta: scroll });
                }
                // Pinch arrives pre-aggregated from egui; reuse the wheel
                // routing by converting the factor back to a wheel delta.
                if let Some(zoom) = ui.input(|i| i.multi_touch().map(|mt| mt.zoom_delta))
                    && (zoom - 1.0).abs() > 1e-3
                {
                    emit(session, state, InputEvent::Wheel {
                        x: sx,
                        y: sy,
                        delta: (zoom - 1.0) / WHEEL_ZOOM_RATE,
                    });
                }
            }
        } else if released {
            // Release outside the widget still ends any drag in flight.
            if let Some((sx, sy)) = self.last_pointer {
                emit(session, state, InputEvent::PointerUp { x: sx, y: sy });
            }
        }

        self.update_cursor(ui, state, session, hover_pos.map(to_surface));
        events
    }

    /// Resize cursors over border zones, grab cursor while panning.
    fn update_cursor(
        &self,
        ui: &egui::Ui,
        state: &CollageState,
        session: &InteractionSession,
        surface_pos: Option<(f32, f32)>,
    ) {
        let icon = match session.mode() {
            InteractionMode::BorderDragging(zone) => Some(match zone.axis {
                BorderAxis::Vertical => egui::CursorIcon::ResizeHorizontal,
                BorderAxis::Horizontal => egui::CursorIcon::ResizeVertical,
            }),
            InteractionMode::Transform(_) => Some(egui::CursorIcon::Grab),
            InteractionMode::Idle | InteractionMode::Hovering(_) => {
                surface_pos.and_then(|(x, y)| {
                    layout::zone_at(state.zones(), x, y).map(|z| match z.axis {
                        BorderAxis::Vertical => egui::CursorIcon::ResizeHorizontal,
                        BorderAxis::Horizontal => egui::CursorIcon::ResizeVertical,
                    })
                })
            }
            InteractionMode::CaptionEditing(_) => None,
        };
        if let Some(icon) = icon {
            ui.ctx().set_cursor_icon(icon);
        }
    }
}

/// Natural sizes of the decoded bitmaps (None while loading), the shape the
/// gesture router consumes.
fn image_sizes(images: &[Option<Arc<RgbaImage>>]) -> Vec<Option<(u32, u32)>> {
    images
        .iter()
        .map(|slot| slot.as_ref().map(|img| (img.width(), img.height())))
        .collect()
}

fn snapshot_of(session: &InteractionSession) -> InteractionSnapshot {
    InteractionSnapshot {
        hovered: session.hovered_panel(),
        active: session.transform_panel().or(session.caption_panel()),
    }
}
