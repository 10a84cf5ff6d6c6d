// ============================================================================
// STYLE PANEL — caption editor and zoom controls for the active panel
// ============================================================================
//
// The panel's contents follow the interaction mode: caption-editing shows
// the text editor and typography controls, transform shows the zoom
// controls, idle shows a hint. Every edit goes straight into CollageState
// and surfaces as an EngineEvent so the app can mark the project dirty.

use std::sync::Arc;

use eframe::egui;
use egui::Color32;
use image::RgbaImage;

use crate::collage::{CollageState, HAlign, ImageTransform, MAX_ZOOM, PanelId};
use crate::interact::{EngineEvent, InteractionSession};
use crate::ops::fit;

pub struct StylePanel {
    font_families: Vec<String>,
}

impl StylePanel {
    pub fn new(font_families: Vec<String>) -> Self {
        Self { font_families }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut CollageState,
        images: &[Option<Arc<RgbaImage>>],
        session: &mut InteractionSession,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if let Some(id) = session.caption_panel() {
            self.caption_controls(ui, state, session, id, &mut events);
        } else if let Some(id) = session.transform_panel() {
            self.transform_controls(ui, state, images, session, id, &mut events);
        } else {
            ui.heading("Panel");
            ui.separator();
            ui.label("Click a photo to adjust its crop.");
            ui.label("Click a caption (or the caption area) to edit text.");
            ui.label("Drag the borders between panels to resize them.");
        }
        events
    }

    fn caption_controls(
        &self,
        ui: &mut egui::Ui,
        state: &mut CollageState,
        session: &mut InteractionSession,
        id: PanelId,
        events: &mut Vec<EngineEvent>,
    ) {
        ui.heading("Caption");
        ui.separator();

        let mut cfg = state.caption_or_default(id);
        let mut changed = false;

        changed |= ui
            .add(egui::TextEdit::multiline(&mut cfg.content).desired_rows(3).hint_text("Caption text"))
            .changed();

        ui.add_space(4.0);

        egui::ComboBox::from_label("Font")
            .selected_text(cfg.style.family.clone())
            .show_ui(ui, |ui| {
                for family in &self.font_families {
                    if ui
                        .selectable_label(cfg.style.family == *family, family)
                        .clicked()
                    {
                        cfg.style.family = family.clone();
                        changed = true;
                    }
                }
            });

        let mut auto_size = cfg.style.size.is_none();
        if ui.checkbox(&mut auto_size, "Auto size").changed() {
            cfg.style.size = if auto_size { None } else { Some(26.0) };
            changed = true;
        }
        if let Some(size) = &mut cfg.style.size {
            changed |= ui
                .add(egui::Slider::new(size, 8.0..=120.0).text("Size"))
                .changed();
        }

        ui.horizontal(|ui| {
            let mut bold = cfg.style.weight >= 600;
            if ui.checkbox(&mut bold, "Bold").changed() {
                cfg.style.weight = if bold { 700 } else { 400 };
                changed = true;
            }
            changed |= ui.checkbox(&mut cfg.style.italic, "Italic").changed();
        });

        ui.horizontal(|ui| {
            ui.label("Fill");
            changed |= color_edit(ui, &mut cfg.style.color);
            ui.label("Stroke");
            changed |= color_edit(ui, &mut cfg.style.stroke_color);
        });
        changed |= ui
            .add(egui::Slider::new(&mut cfg.style.stroke_width, 0.0..=8.0).text("Stroke width"))
            .changed();

        ui.horizontal(|ui| {
            for align in HAlign::all() {
                if ui
                    .selectable_label(cfg.style.align == *align, align.label())
                    .clicked()
                {
                    cfg.style.align = *align;
                    changed = true;
                }
            }
        });

        changed |= ui
            .add(egui::Slider::new(&mut cfg.style.pos_x, -100.0..=100.0).text("Horizontal"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut cfg.style.pos_y, -100.0..=100.0).text("Vertical"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut cfg.style.rotation, -180.0..=180.0).text("Rotation"))
            .changed();

        if changed {
            state.set_caption(id, cfg);
            events.push(EngineEvent::CaptionChanged { id });
        }

        ui.add_space(8.0);
        if ui.button("Done").clicked() {
            session.end_active_mode();
        }
    }

    fn transform_controls(
        &self,
        ui: &mut egui::Ui,
        state: &mut CollageState,
        images: &[Option<Arc<RgbaImage>>],
        session: &mut InteractionSession,
        id: PanelId,
        events: &mut Vec<EngineEvent>,
    ) {
        ui.heading("Photo");
        ui.separator();

        let panel = state.panel_by_id(id).copied();
        let size = state
            .image_for(id)
            .and_then(|idx| images.get(idx))
            .and_then(|slot| slot.as_ref().map(|img| (img.width(), img.height())));

        let (Some(panel), Some((img_w, img_h))) = (panel, size) else {
            ui.label("Loading image…");
            return;
        };

        let current = state.transform_for(id);
        let mut zoom = current.scale;
        if ui
            .add(egui::Slider::new(&mut zoom, 1.0..=MAX_ZOOM).text("Zoom"))
            .changed()
        {
            // Slider zoom keeps the panel center fixed.
            let next = fit::zoom_at(
                img_w,
                img_h,
                panel.width,
                panel.height,
                current,
                panel.width * 0.5,
                panel.height * 0.5,
                zoom,
            );
            if next != current {
                state.set_transform(id, next);
                events.push(EngineEvent::TransformChanged { id, transform: next });
            }
        }
        ui.label("Drag the photo to reposition it.");

        ui.add_space(4.0);
        if ui.button("Reset crop").clicked() {
            let next = ImageTransform::default();
            state.set_transform(id, next);
            events.push(EngineEvent::TransformChanged { id, transform: next });
        }

        ui.add_space(8.0);
        if ui.button("Done").clicked() {
            session.end_active_mode();
        }
    }
}

/// RGBA array ↔ egui color picker shim.
fn color_edit(ui: &mut egui::Ui, rgba: &mut [u8; 4]) -> bool {
    let mut color = Color32::from_rgba_unmultiplied(rgba[0], rgba[1], rgba[2], rgba[3]);
    let changed = ui.color_edit_button_srgba(&mut color).changed();
    if changed {
        *rgba = [color.r(), color.g(), color.b(), color.a()];
    }
    changed
}
