// ============================================================================
// IO — image decode/encode, .mco project files, background loading
// ============================================================================

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::collage::{CaptionConfig, CaptionStyle, CollageState, ImageTransform, LayoutSpec, PanelId};

pub const PROJECT_EXTENSION: &str = "mco";

/// Raster extensions the open-image dialog accepts.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif", "tif", "tiff"];

// ---------------------------------------------------------------------------
//  Raster encode/decode
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaveFormat::Png => "PNG",
            SaveFormat::Jpeg => "JPEG",
            SaveFormat::Webp => "WEBP",
            SaveFormat::Bmp => "BMP",
        }
    }

    pub fn all() -> &'static [SaveFormat] {
        &[SaveFormat::Png, SaveFormat::Jpeg, SaveFormat::Webp, SaveFormat::Bmp]
    }

    /// Infer from a file extension; PNG when unknown.
    pub fn from_extension(ext: &str) -> SaveFormat {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => SaveFormat::Jpeg,
            "webp" => SaveFormat::Webp,
            "bmp" => SaveFormat::Bmp,
            _ => SaveFormat::Png,
        }
    }
}

/// Decode any supported raster file into RGBA.
pub fn load_image_sync(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("cannot decode '{}': {}", path.display(), e))?;
    Ok(img.into_rgba8())
}

/// Encode a rendered surface to disk in the requested format.
/// `quality` applies to JPEG only (1–100).
pub fn encode_and_write(
    img: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let file = File::create(path)
        .map_err(|e| format!("cannot create '{}': {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    let (w, h) = img.dimensions();

    match format {
        SaveFormat::Png => PngEncoder::new(&mut writer)
            .write_image(img.as_raw(), w, h, ColorType::Rgba8)
            .map_err(|e| format!("PNG encode failed: {}", e)),
        SaveFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            let rgb = DynamicImage::ImageRgba8(img.clone()).into_rgb8();
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
                .write_image(rgb.as_raw(), w, h, ColorType::Rgb8)
                .map_err(|e| format!("JPEG encode failed: {}", e))
        }
        SaveFormat::Webp => WebPEncoder::new_lossless(&mut writer)
            .write_image(img.as_raw(), w, h, ColorType::Rgba8)
            .map_err(|e| format!("WEBP encode failed: {}", e)),
        SaveFormat::Bmp => BmpEncoder::new(&mut writer)
            .write_image(img.as_raw(), w, h, ColorType::Rgba8)
            .map_err(|e| format!("BMP encode failed: {}", e)),
    }
}

// ---------------------------------------------------------------------------
//  .MCO PROJECT FILE FORMAT
// ---------------------------------------------------------------------------
//
// Bincode-serialized, magic-prefixed. Stores the layout and per-panel state
// plus the *paths* of the collection images, never pixels: a missing file on
// reload simply leaves its panels empty.

const MCO_MAGIC_V1: &str = "MCO1";

#[derive(Serialize, Deserialize)]
struct ProjectFileV1 {
    magic: String,
    surface_w: u32,
    surface_h: u32,
    border_px: f32,
    panel_count: usize,
    template_id: Option<String>,
    spec: LayoutSpec,
    image_paths: Vec<Option<String>>,
    mapping: Vec<(u32, usize)>,
    transforms: Vec<(u32, ImageTransform)>,
    captions: Vec<(u32, CaptionConfig)>,
    caption_defaults: CaptionStyle,
}

/// Everything reconstructed from a project file. Bitmaps are not included;
/// the caller re-decodes `image_paths` (missing files degrade to empty
/// panels).
pub struct LoadedProject {
    pub state: CollageState,
    pub image_paths: Vec<Option<PathBuf>>,
    pub template_id: Option<String>,
}

pub fn save_project(
    state: &CollageState,
    image_paths: &[Option<PathBuf>],
    template_id: Option<&str>,
    path: &Path,
) -> Result<(), String> {
    let (surface_w, surface_h) = state.surface_size();
    let file = ProjectFileV1 {
        magic: MCO_MAGIC_V1.to_string(),
        surface_w,
        surface_h,
        border_px: state.border_px(),
        panel_count: state.panel_count(),
        template_id: template_id.map(str::to_string),
        spec: state.spec().clone(),
        image_paths: image_paths
            .iter()
            .map(|p| p.as_ref().map(|p| p.to_string_lossy().into_owned()))
            .collect(),
        mapping: state.mapping.iter().map(|(id, idx)| (id.0, *idx)).collect(),
        transforms: state.transforms.iter().map(|(id, t)| (id.0, *t)).collect(),
        captions: state.captions.iter().map(|(id, c)| (id.0, c.clone())).collect(),
        caption_defaults: state.caption_defaults.clone(),
    };

    let out = File::create(path)
        .map_err(|e| format!("cannot create '{}': {}", path.display(), e))?;
    bincode::serialize_into(BufWriter::new(out), &file)
        .map_err(|e| format!("project serialize failed: {}", e))
}

pub fn load_project(path: &Path) -> Result<LoadedProject, String> {
    let input = File::open(path)
        .map_err(|e| format!("cannot open '{}': {}", path.display(), e))?;
    let file: ProjectFileV1 = bincode::deserialize_from(BufReader::new(input))
        .map_err(|e| format!("not a Mosaico project: {}", e))?;
    if file.magic != MCO_MAGIC_V1 {
        return Err(format!("unrecognized project header '{}'", file.magic));
    }

    let mut state = CollageState::new(file.surface_w, file.surface_h, file.spec, file.panel_count);
    state.set_border_px(file.border_px);
    for (id, idx) in file.mapping {
        state.mapping.insert(PanelId(id), idx);
    }
    for (id, t) in file.transforms {
        state.transforms.insert(PanelId(id), t);
    }
    for (id, c) in file.captions {
        state.captions.insert(PanelId(id), c);
    }
    state.caption_defaults = file.caption_defaults;

    Ok(LoadedProject {
        state,
        image_paths: file.image_paths.iter().map(|p| p.as_ref().map(PathBuf::from)).collect(),
        template_id: file.template_id,
    })
}

// ---------------------------------------------------------------------------
//  Background IO pipeline
// ---------------------------------------------------------------------------

/// Result delivered from a background IO thread. Drained by the app once
/// per frame; gesture handling never blocks on decode.
pub enum IoResult {
    /// An image file finished decoding for a collection slot.
    ImageLoaded {
        slot: usize,
        image: RgbaImage,
        path: PathBuf,
    },
    /// Decoding failed; the slot stays empty and its panels render empty.
    LoadFailed { slot: usize, error: String },
    /// A project file was parsed in the background.
    ProjectLoaded {
        loaded: Box<LoadedProject>,
        path: PathBuf,
    },
    ProjectLoadFailed { error: String },
    /// An export finished writing (or failed).
    ExportComplete { path: PathBuf, error: Option<String> },
}

pub fn spawn_image_load(slot: usize, path: PathBuf, tx: Sender<IoResult>) {
    std::thread::spawn(move || {
        let result = match load_image_sync(&path) {
            Ok(image) => IoResult::ImageLoaded { slot, image, path },
            Err(error) => IoResult::LoadFailed { slot, error },
        };
        let _ = tx.send(result);
    });
}

pub fn spawn_project_load(path: PathBuf, tx: Sender<IoResult>) {
    std::thread::spawn(move || {
        let result = match load_project(&path) {
            Ok(loaded) => IoResult::ProjectLoaded { loaded: Box::new(loaded), path },
            Err(error) => IoResult::ProjectLoadFailed { error },
        };
        let _ = tx.send(result);
    });
}

pub fn spawn_export(surface: RgbaImage, path: PathBuf, format: SaveFormat, quality: u8, tx: Sender<IoResult>) {
    std::thread::spawn(move || {
        let error = encode_and_write(&surface, &path, format, quality).err();
        let _ = tx.send(IoResult::ExportComplete { path, error });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::{CaptionConfig, LayoutSpec};

    #[test]
    fn project_files_round_trip() {
        let mut state = CollageState::new(800, 600, LayoutSpec::grid(vec![2.0, 1.0], vec![1.0]), 2);
        state.set_border_px(12.0);
        state.assign_image(PanelId(0), 0);
        state.set_transform(PanelId(0), ImageTransform { scale: 2.0, position_x: 10.0, position_y: 0.0 });
        state.set_caption(PanelId(1), CaptionConfig { content: "summer".into(), ..Default::default() });

        let dir = std::env::temp_dir();
        let path = dir.join(format!("mosaico-test-{}.mco", uuid::Uuid::new_v4()));
        let paths = vec![Some(PathBuf::from("/photos/a.jpg")), None];
        save_project(&state, &paths, Some("split-v"), &path).expect("save");

        let loaded = load_project(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.state.surface_size(), (800, 600));
        assert_eq!(loaded.state.border_px(), 12.0);
        assert_eq!(loaded.state.spec(), state.spec());
        assert_eq!(loaded.state.image_for(PanelId(0)), Some(0));
        assert_eq!(loaded.state.transform_for(PanelId(0)).scale, 2.0);
        assert_eq!(loaded.state.captions.get(&PanelId(1)).unwrap().content, "summer");
        assert_eq!(loaded.template_id.as_deref(), Some("split-v"));
        assert_eq!(loaded.image_paths, vec![Some(PathBuf::from("/photos/a.jpg")), None]);
    }

    #[test]
    fn garbage_files_are_rejected_not_panicked() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("mosaico-test-{}.mco", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"definitely not bincode").expect("write");
        let result = load_project(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn format_inference_from_extension() {
        assert_eq!(SaveFormat::from_extension("JPG"), SaveFormat::Jpeg);
        assert_eq!(SaveFormat::from_extension("webp"), SaveFormat::Webp);
        assert_eq!(SaveFormat::from_extension("weird"), SaveFormat::Png);
    }
}
