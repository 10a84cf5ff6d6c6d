// ============================================================================
// TEMPLATES PANEL — layout picker, panel count, border and surface controls
// ============================================================================

use eframe::egui;

use crate::project::Project;
use crate::templates::{self, Category, TEMPLATES};

pub struct TemplatesPanel;

impl TemplatesPanel {
    pub fn new() -> Self {
        Self
    }

    /// Returns true when anything layout-affecting changed.
    pub fn show(&mut self, ui: &mut egui::Ui, project: &mut Project) -> bool {
        let mut changed = false;

        ui.heading("Layout");
        ui.separator();

        for category in Category::all() {
            ui.label(egui::RichText::new(category.label()).strong());
            for t in TEMPLATES.iter().filter(|t| t.category == *category) {
                let selected = project.template_id.as_deref() == Some(t.id);
                if ui.selectable_label(selected, t.label).clicked() && !selected {
                    // An unknown id here would mean a stale catalog entry;
                    // the resolver's fallback grid covers that case too.
                    let spec = templates::resolve_template(t.id)
                        .unwrap_or_else(|| crate::ops::layout::fallback_spec(t.panel_count));
                    project.state.set_spec(spec);
                    project.state.set_panel_count(t.panel_count);
                    project.template_id = Some(t.id.to_string());
                    changed = true;
                }
            }
            ui.add_space(6.0);
        }

        ui.separator();

        let mut count = project.state.panel_count();
        if ui
            .add(egui::Slider::new(&mut count, 1..=12).text("Panels"))
            .changed()
        {
            project.state.set_panel_count(count);
            changed = true;
        }

        let mut border = project.state.border_px();
        if ui
            .add(egui::Slider::new(&mut border, 0.0..=40.0).text("Border"))
            .changed()
        {
            project.state.set_border_px(border);
            changed = true;
        }

        ui.add_space(6.0);
        ui.label("Surface");
        let (mut w, mut h) = project.state.surface_size();
        ui.horizontal(|ui| {
            let rw = ui.add(egui::DragValue::new(&mut w).clamp_range(64..=8192).suffix(" px"));
            ui.label("×");
            let rh = ui.add(egui::DragValue::new(&mut h).clamp_range(64..=8192).suffix(" px"));
            if rw.changed() || rh.changed() {
                project.state.set_surface_size(w, h);
                changed = true;
            }
        });

        if changed {
            project.mark_dirty();
        }
        changed
    }
}
