use eframe::egui;

use animpal::settings::{AppSettings, MIN_WINDOW_SIZE};

mod app;
mod controls;
mod panels;
mod preview;

use app::AnimPalApp;

fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let settings = AppSettings::load();
    let window = settings.window_or_default();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Animator's Pal")
            .with_position([window.x, window.y])
            .with_inner_size([window.width, window.height])
            .with_min_inner_size(MIN_WINDOW_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        "Animator's Pal",
        options,
        Box::new(|cc| Ok(Box::new(AnimPalApp::new(cc, settings)))),
    )
}
