#![warn(clippy::all, rust_2018_idioms)]

#[cfg(not(target_arch = "wasm32"))]
use penpage::{PageApp, Settings};

#[cfg(not(target_arch = "wasm32"))]
const SETTINGS_FILE: &str = "penpage.json";

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // Optional settings file in the working directory
    let settings = if std::path::Path::new(SETTINGS_FILE).exists() {
        match Settings::load(SETTINGS_FILE) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("ignoring {SETTINGS_FILE}: {err}");
                Settings::default()
            }
        }
    } else {
        Settings::default()
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 760.0])
            .with_min_inner_size([400.0, 300.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "penpage",
        native_options,
        Box::new(move |cc| Ok(Box::new(PageApp::new(cc, settings)?))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {}
