// ============================================================================
// MOSAICO APP — egui shell around the collage engine
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;

use eframe::egui;
use image::RgbaImage;

use crate::collage::{CollageState, PanelId};
use crate::components::editor::EditorView;
use crate::components::style_panel::StylePanel;
use crate::components::templates_panel::TemplatesPanel;
use crate::interact::{EngineEvent, InteractionSession};
use crate::io::{self, IoResult, SaveFormat};
use crate::ops::text::{FontStore, enumerate_system_fonts};
use crate::project::Project;
use crate::templates;
use crate::{log_err, log_info, log_warn};

/// Default surface size for a fresh project.
const DEFAULT_SURFACE: (u32, u32) = (1600, 1200);

pub struct MosaicoApp {
    project: Project,
    /// Decoded image collection; `None` slots are still loading (or failed).
    images: Vec<Option<Arc<RgbaImage>>>,

    fonts: FontStore,
    session: InteractionSession,

    editor: EditorView,
    templates_panel: TemplatesPanel,
    style_panel: StylePanel,

    // Background IO pipeline (image decode, project load, export encode).
    io_tx: mpsc::Sender<IoResult>,
    io_rx: mpsc::Receiver<IoResult>,
    pending_io: usize,

    status: String,
    untitled_counter: usize,
}

impl MosaicoApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (io_tx, io_rx) = mpsc::channel();
        let state = fresh_state();
        Self {
            project: Project::new_untitled(1, state),
            images: Vec::new(),
            fonts: FontStore::new(),
            session: InteractionSession::start(),
            editor: EditorView::new(),
            templates_panel: TemplatesPanel::new(),
            style_panel: StylePanel::new(enumerate_system_fonts()),
            io_tx,
            io_rx,
            pending_io: 0,
            status: "Add photos to get started".to_string(),
            untitled_counter: 1,
        }
    }

    // ---- background IO ------------------------------------------------------

    fn drain_io(&mut self) {
        while let Ok(result) = self.io_rx.try_recv() {
            self.pending_io = self.pending_io.saturating_sub(1);
            match result {
                IoResult::ImageLoaded { slot, image, path } => {
                    log_info!("decoded {} ({}×{})", path.display(), image.width(), image.height());
                    if let Some(entry) = self.images.get_mut(slot) {
                        *entry = Some(Arc::new(image));
                        self.editor.invalidate();
                    }
                }
                IoResult::LoadFailed { slot, error } => {
                    // The slot stays empty; its panels keep rendering as
                    // empty rather than failing the session.
                    log_warn!("image load failed (slot {}): {}", slot, error);
                    self.status = error;
                }
                IoResult::ProjectLoaded { loaded, path } => {
                    self.adopt_project(Project::from_file(
                        path,
                        loaded.state,
                        loaded.image_paths,
                        loaded.template_id,
                    ));
                    self.status = format!("Opened {}", self.project.name);
                }
                IoResult::ProjectLoadFailed { error } => {
                    log_err!("project load failed: {}", error);
                    self.status = error;
                }
                IoResult::ExportComplete { path, error } => match error {
                    None => self.status = format!("Exported {}", path.display()),
                    Some(e) => {
                        log_err!("export failed: {}", e);
                        self.status = e;
                    }
                },
            }
        }
    }

    /// Swap in a project and restart image loading for its collection.
    fn adopt_project(&mut self, project: Project) {
        self.session.end();
        self.images = vec![None; project.image_paths.len()];
        self.project = project;
        self.editor.invalidate();
        for (slot, path) in self.project.image_paths.iter().enumerate() {
            if let Some(path) = path {
                self.pending_io += 1;
                io::spawn_image_load(slot, path.clone(), self.io_tx.clone());
            }
        }
    }

    // ---- file actions -------------------------------------------------------

    fn new_project(&mut self) {
        self.untitled_counter += 1;
        let counter = self.untitled_counter;
        self.adopt_project(Project::new_untitled(counter, fresh_state()));
        self.status = "New collage".to_string();
    }

    fn open_project_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Mosaico project", &[io::PROJECT_EXTENSION])
            .pick_file()
        {
            self.pending_io += 1;
            io::spawn_project_load(path, self.io_tx.clone());
        }
    }

    fn save_project(&mut self, force_dialog: bool) {
        let path = match (&self.project.path, force_dialog) {
            (Some(path), false) => Some(path.clone()),
            _ => rfd::FileDialog::new()
                .add_filter("Mosaico project", &[io::PROJECT_EXTENSION])
                .set_file_name(&format!("{}.{}", self.project.name.trim_end_matches(".mco"), io::PROJECT_EXTENSION))
                .save_file(),
        };
        let Some(path) = path else { return };

        match io::save_project(
            &self.project.state,
            &self.project.image_paths,
            self.project.template_id.as_deref(),
            &path,
        ) {
            Ok(()) => {
                self.project.path = Some(path);
                self.project.update_name_from_path();
                self.project.mark_clean();
                self.status = format!("Saved {}", self.project.name);
            }
            Err(e) => {
                log_err!("save failed: {}", e);
                self.status = e;
            }
        }
    }

    fn add_photos_dialog(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", io::IMAGE_EXTENSIONS)
            .pick_files()
        else {
            return;
        };
        let slots: Vec<usize> = paths.iter().map(|p| self.push_image_slot(p.clone())).collect();
        // Fill empty panels front to back with the new photos.
        let empty_panels: Vec<PanelId> = self
            .project
            .state
            .panels()
            .iter()
            .map(|p| p.id)
            .filter(|id| self.project.state.image_for(*id).is_none())
            .collect();
        for (id, slot) in empty_panels.into_iter().zip(slots) {
            self.project.state.assign_image(id, slot);
        }
        self.project.mark_dirty();
    }

    /// Register a new collection slot and start decoding it.
    fn push_image_slot(&mut self, path: PathBuf) -> usize {
        let slot = self.images.len();
        self.images.push(None);
        self.project.image_paths.push(Some(path.clone()));
        self.pending_io += 1;
        io::spawn_image_load(slot, path, self.io_tx.clone());
        slot
    }

    /// Host reaction to a panel activation: empty panels get a file picker,
    /// populated ones enter transform mode.
    fn on_panel_activated(&mut self, id: PanelId) {
        if self.project.state.image_for(id).is_some() {
            self.session.begin_transform(&self.project.state, id);
            return;
        }
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", io::IMAGE_EXTENSIONS)
            .pick_file()
        {
            let slot = self.push_image_slot(path);
            self.project.state.assign_image(id, slot);
            self.project.mark_dirty();
        }
    }

    fn export_dialog(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("WEBP", &["webp"])
            .add_filter("BMP", &["bmp"])
            .set_file_name("collage.png")
            .save_file()
        else {
            return;
        };
        let format = SaveFormat::from_extension(
            path.extension().and_then(|e| e.to_str()).unwrap_or("png"),
        );
        // Render on the UI thread (it is the same pass the preview just
        // drew); only the encode goes to a worker.
        let surface = crate::render::export_pixels(&self.project.state, &self.images, &self.fonts);
        self.pending_io += 1;
        io::spawn_export(surface, path, format, 90, self.io_tx.clone());
        self.status = "Exporting…".to_string();
    }

    /// Paste an image from the system clipboard into the first empty panel
    /// (or the hovered one).
    fn paste_photo(&mut self) {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(c) => c,
            Err(e) => {
                log_warn!("clipboard unavailable: {}", e);
                return;
            }
        };
        let img = match clipboard.get_image() {
            Ok(img) => img,
            Err(_) => {
                self.status = "Clipboard has no image".to_string();
                return;
            }
        };
        let Some(rgba) = RgbaImage::from_raw(
            img.width as u32,
            img.height as u32,
            img.bytes.into_owned(),
        ) else {
            log_warn!("clipboard image had inconsistent dimensions");
            return;
        };

        let target = self
            .session
            .hovered_panel()
            .and_then(|i| self.project.state.panels().get(i).map(|p| p.id))
            .or_else(|| {
                self.project
                    .state
                    .panels()
                    .iter()
                    .map(|p| p.id)
                    .find(|id| self.project.state.image_for(*id).is_none())
            });
        let Some(id) = target else {
            self.status = "No free panel for the pasted image".to_string();
            return;
        };

        let slot = self.images.len();
        self.images.push(Some(Arc::new(rgba)));
        self.project.image_paths.push(None); // clipboard images have no path
        self.project.state.assign_image(id, slot);
        self.project.mark_dirty();
        self.editor.invalidate();
        self.status = "Pasted image".to_string();
    }

    // ---- UI -----------------------------------------------------------------

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.new_project();
                        ui.close_menu();
                    }
                    if ui.button("Open Project…").clicked() {
                        self.open_project_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Save").clicked() {
                        self.save_project(false);
                        ui.close_menu();
                    }
                    if ui.button("Save As…").clicked() {
                        self.save_project(true);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Add Photos…").clicked() {
                        self.add_photos_dialog();
                        ui.close_menu();
                    }
                    if ui.button("Export…").clicked() {
                        self.export_dialog();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui.button("Paste Photo").clicked() {
                        self.paste_photo();
                        ui.close_menu();
                    }
                    let active = self.session.transform_panel();
                    if ui
                        .add_enabled(active.is_some(), egui::Button::new("Clear Panel"))
                        .clicked()
                    {
                        if let Some(id) = active {
                            self.project.state.clear_image(id);
                            self.session.end_active_mode();
                            self.project.mark_dirty();
                        }
                        ui.close_menu();
                    }
                });
                ui.separator();
                ui.label(self.project.display_title());
            });
        });
    }

    fn handle_events(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            match event {
                EngineEvent::PanelActivated { id, .. } => self.on_panel_activated(id),
                EngineEvent::LayoutChanged(_) => {
                    // Border drags diverge from the picked template.
                    self.project.template_id = None;
                    self.project.mark_dirty();
                }
                EngineEvent::TransformChanged { .. } | EngineEvent::CaptionChanged { .. } => {
                    self.project.mark_dirty();
                }
            }
        }
    }
}

impl eframe::App for MosaicoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_io();

        self.menu_bar(ctx);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.pending_io > 0 {
                    ui.spinner();
                }
                ui.label(&self.status);
            });
        });

        egui::SidePanel::left("templates")
            .default_width(180.0)
            .show(ctx, |ui| {
                self.templates_panel.show(ui, &mut self.project);
            });

        let style_events = egui::SidePanel::right("style")
            .default_width(240.0)
            .show(ctx, |ui| {
                self.style_panel.show(ui, &mut self.project.state, &self.images, &mut self.session)
            })
            .inner;

        let editor_events = egui::CentralPanel::default()
            .show(ctx, |ui| {
                self.editor.show(
                    ui,
                    &mut self.project.state,
                    &self.images,
                    &self.fonts,
                    &mut self.session,
                    &self.fonts,
                )
            })
            .inner;

        self.handle_events(style_events);
        self.handle_events(editor_events);

        // Keep polling while decodes are in flight so results land promptly.
        if self.pending_io > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

fn fresh_state() -> CollageState {
    let spec = templates::resolve_template("grid-2x2")
        .unwrap_or_else(|| crate::ops::layout::fallback_spec(4));
    CollageState::new(DEFAULT_SURFACE.0, DEFAULT_SURFACE.1, spec, 4)
}
