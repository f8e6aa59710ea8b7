mod app;
mod color;
mod ui;

use app::RustyKernelApp;
use eframe::egui;
use rusty_kernel::config::Settings;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Kernel – Local Regression Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(RustyKernelApp::new(settings)))),
    )
}
