// ============================================================================
// Mosaico CLI — headless collage export via command-line arguments
// ============================================================================
//
// Usage examples:
//   mosaico --input trip.mco --output trip.png
//   mosaico -i trip.mco -o wall.jpg --quality 85        (format from output ext)
//   mosaico -i projects/*.mco --output-dir exports/ --format png
//   mosaico -i trip.mco -o big.png --width 3200 --height 2400
//
// No GUI is opened in CLI mode. Rendering uses the same export path as the
// in-app "Export" action, so a headless render is pixel-identical to what
// the preview showed (minus placeholders and hover chrome).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;

use crate::io::{SaveFormat, encode_and_write, load_image_sync, load_project};
use crate::ops::text::FontStore;
use crate::render;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Mosaico headless collage exporter.
///
/// Render .mco collage projects to raster files without opening the GUI.
#[derive(Parser, Debug)]
#[command(
    name = "mosaico",
    about = "Mosaico headless collage exporter",
    long_about = "Render Mosaico collage projects (.mco) to PNG, JPEG, WEBP or BMP\n\
                  without opening the GUI.\n\n\
                  Example:\n  \
                  mosaico --input trip.mco --output trip.png\n  \
                  mosaico -i projects/*.mco --output-dir exports/ --format jpeg"
)]
pub struct CliArgs {
    /// Input project file(s). Glob patterns accepted (e.g. "*.mco").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the project stem and the format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp.
    /// When omitted, inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Override the surface width stored in the project.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Override the surface height stored in the project.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Print per-file timing and image-loading details.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all projects exported, `1` = one or more failed.
pub fn run(args: CliArgs) -> ExitCode {
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch export.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, save_format, &args) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-project export pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    format: SaveFormat,
    args: &CliArgs,
) -> Result<(), String> {
    // -- Step 1: Load the project ----------------------------------------
    let loaded = load_project(input).map_err(|e| format!("load failed: {}", e))?;
    let mut state = loaded.state;

    if args.width.is_some() || args.height.is_some() {
        let (w, h) = state.surface_size();
        state.set_surface_size(args.width.unwrap_or(w), args.height.unwrap_or(h));
    }

    // -- Step 2: Decode the collection images ------------------------------
    // A missing or unreadable file leaves its slot empty; the panels that
    // referenced it export as empty tint, same as the preview would show.
    let mut images = Vec::with_capacity(loaded.image_paths.len());
    for (slot, path) in loaded.image_paths.iter().enumerate() {
        let decoded = match path {
            Some(p) => match load_image_sync(p) {
                Ok(img) => Some(Arc::new(img)),
                Err(e) => {
                    eprintln!("  warning: slot {}: {}", slot, e);
                    None
                }
            },
            None => None,
        };
        if args.verbose
            && let Some(img) = &decoded
        {
            println!("  [image] slot {}: {}×{}", slot, img.width(), img.height());
        }
        images.push(decoded);
    }

    // -- Step 3: Render and encode -----------------------------------------
    let fonts = FontStore::new();
    let surface = render::export_pixels(&state, &images, &fonts);
    encode_and_write(&surface, output, format, args.quality)
        .map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f);
    }
    if let Some(out) = output {
        return SaveFormat::from_extension(
            out.extension().and_then(|e| e.to_str()).unwrap_or(""),
        );
    }
    SaveFormat::Png
}

/// Compute the output path for a single project file.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (batch directory, derives filename from project stem)
/// 3. Fallback: next to the project, same stem, the format's extension
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(format!("{}.{}", stem, ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_falls_back_next_to_the_input() {
        let p = build_output_path(Path::new("/proj/trip.mco"), None, None, SaveFormat::Png);
        assert_eq!(p, Some(PathBuf::from("/proj/trip.png")));
    }

    #[test]
    fn output_dir_takes_the_project_stem() {
        let p = build_output_path(
            Path::new("/proj/trip.mco"),
            None,
            Some(Path::new("/out")),
            SaveFormat::Jpeg,
        );
        assert_eq!(p, Some(PathBuf::from("/out/trip.jpg")));
    }

    #[test]
    fn format_argument_beats_output_extension() {
        assert_eq!(parse_format(Some("webp"), Some(Path::new("x.png"))), SaveFormat::Webp);
        assert_eq!(parse_format(None, Some(Path::new("x.jpg"))), SaveFormat::Jpeg);
        assert_eq!(parse_format(None, None), SaveFormat::Png);
    }
}
