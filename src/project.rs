use std::path::PathBuf;

use uuid::Uuid;

use crate::collage::CollageState;

/// Single open collage document.
pub struct Project {
    pub id: Uuid,
    pub state: CollageState,
    /// Decoded bitmaps live in the app; the project remembers where each
    /// collection slot came from so it can be reloaded.
    pub image_paths: Vec<Option<PathBuf>>,
    /// Template the layout was based on, for the picker highlight. The
    /// spec itself is authoritative (border drags diverge from the template).
    pub template_id: Option<String>,
    /// `None` for unsaved/untitled projects.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,
    /// Display name (derived from path or "Untitled-X").
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, state: CollageState) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            image_paths: Vec::new(),
            template_id: Some("grid-2x2".to_string()),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        }
    }

    pub fn from_file(
        path: PathBuf,
        state: CollageState,
        image_paths: Vec<Option<PathBuf>>,
        template_id: Option<String>,
    ) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            id: Uuid::new_v4(),
            state,
            image_paths,
            template_id,
            path: Some(path),
            is_dirty: false,
            name,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn update_name_from_path(&mut self) {
        if let Some(ref path) = self.path {
            self.name = path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string());
        }
    }

    /// Window/tab title: name with a dirty marker.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}
