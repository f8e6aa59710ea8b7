use eframe::egui;

use rusty_kernel::config::Settings;
use rusty_kernel::state::AppState;

use crate::ui::{panels, plot};

/// Share of the central panel height given to the regression plot; the
/// kernel plot gets the rest.
const MAIN_PLOT_SHARE: f32 = 0.68;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyKernelApp {
    pub state: AppState,
}

impl RustyKernelApp {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for RustyKernelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: regression controls ----
        egui::SidePanel::left("control_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let height = ui.available_height();
            plot::regression_plot(ui, &mut self.state, height * MAIN_PLOT_SHARE);
            ui.separator();
            plot::kernel_plot(ui, &self.state);
        });
    }
}
