use eframe::egui;

use mosaico::app::MosaicoApp;
use mosaico::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    // Routed before any window exists so batch exports can run from scripts
    // and CI without a display.
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_maximized(true)
            .with_title("Mosaico"),
        ..Default::default()
    };

    eframe::run_native(
        "Mosaico",
        options,
        Box::new(|cc| Box::new(MosaicoApp::new(cc))),
    )
}
