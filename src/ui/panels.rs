use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};

use rusty_kernel::data::loader;
use rusty_kernel::data::model::Point;
use rusty_kernel::regression::Kernel;
use rusty_kernel::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – regression controls
// ---------------------------------------------------------------------------

/// Render the left control panel. Every widget change goes through an
/// `AppState` setter, which recomputes the plots.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Local regression");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Kernel selector ----
            ui.strong("Kernel");
            let mut kernel = state.kernel;
            egui::ComboBox::from_id_salt("kernel")
                .selected_text(kernel.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for k in Kernel::ALL {
                        ui.selectable_value(&mut kernel, k, k.to_string());
                    }
                });
            if kernel != state.kernel {
                state.set_kernel(kernel);
            }
            if state.kernel.is_compact() && state.uncovered > 0 {
                ui.label(
                    RichText::new(format!(
                        "{} grid points have no data within one bandwidth; the curve has gaps",
                        state.uncovered
                    ))
                    .small()
                    .color(Color32::YELLOW),
                );
            }

            // ---- Bandwidth / order ----
            let [h_min, h_max] = state.settings.bandwidth_range;
            let mut bandwidth = state.bandwidth;
            if ui
                .add(
                    Slider::new(&mut bandwidth, h_min..=h_max)
                        .logarithmic(true)
                        .text("bandwidth"),
                )
                .changed()
            {
                state.set_bandwidth(bandwidth);
            }

            let mut order = state.order;
            if ui
                .add(Slider::new(&mut order, 0..=state.settings.max_order).text("order"))
                .changed()
            {
                state.set_order(order);
            }

            if let Some(fit) = &state.probe_fit {
                if fit.degree < state.order {
                    ui.label(
                        RichText::new(format!(
                            "Degree lowered to {} at the probe (too few points in the window)",
                            fit.degree
                        ))
                        .color(Color32::YELLOW),
                    );
                }
            }

            ui.separator();

            // ---- Probe ----
            ui.checkbox(&mut state.show_probe, "Show probe");
            let (x_lo, x_hi) = state.x_range();
            let mut probe = state.probe_x;
            if ui
                .add_enabled(
                    state.show_probe,
                    Slider::new(&mut probe, x_lo..=x_hi).text("probe x"),
                )
                .changed()
            {
                state.set_probe(probe);
            }

            let mut grid_points = state.grid_points;
            if ui
                .add(Slider::new(&mut grid_points, 10..=1000).text("grid points"))
                .changed()
            {
                state.set_grid_points(grid_points);
            }

            let mut compare = state.compare_orders;
            if ui.checkbox(&mut compare, "Compare orders 0–3").changed() {
                state.set_compare_orders(compare);
            }

            ui.separator();

            // ---- Training points ----
            ui.strong("Training points");
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Resample").clicked() {
                    state.resample();
                }
                if ui.button("Clear").clicked() {
                    state.clear_points();
                }
            });
            if ui.button("Suggest bandwidth (LOOCV)").clicked() {
                state.suggest_bandwidth();
            }
            if let Some(selection) = &state.selection {
                let rmse = selection
                    .scores
                    .iter()
                    .find(|&&(h, _)| h == selection.bandwidth)
                    .map(|&(_, s)| s)
                    .unwrap_or(f64::NAN);
                ui.label(format!(
                    "LOOCV: h = {:.3}, RMSE = {rmse:.4}",
                    selection.bandwidth
                ));
            }

            ui.label(
                RichText::new(
                    "Drag points to move them. Shift-click adds a point, \
                     right-click removes one, click moves the probe.",
                )
                .small()
                .weak(),
            );

            let header_text = format!("Points  ({})", state.training.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("points_table")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    points_table(ui, state);
                });
        });
}

/// Editable table of the training points with their weight at the probe.
fn points_table(ui: &mut Ui, state: &mut AppState) {
    let mut edit: Option<(usize, Point)> = None;
    let mut remove: Option<usize> = None;

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            for title in ["#", "x", "y", "weight", ""] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for (i, p) in state.training.points().iter().enumerate() {
                let weight = state.probe_weights.get(i).copied();
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(i.to_string());
                    });
                    row.col(|ui| {
                        let mut x = p.x;
                        if ui.add(DragValue::new(&mut x).speed(0.01)).changed() {
                            edit = Some((i, Point::new(x, p.y)));
                        }
                    });
                    row.col(|ui| {
                        let mut y = p.y;
                        if ui.add(DragValue::new(&mut y).speed(0.01)).changed() {
                            edit = Some((i, Point::new(p.x, y)));
                        }
                    });
                    row.col(|ui| {
                        ui.label(weight.map(|w| format!("{w:.3}")).unwrap_or_default());
                    });
                    row.col(|ui| {
                        if ui.small_button("✕").clicked() {
                            remove = Some(i);
                        }
                    });
                });
            }
        });

    if let Some((i, point)) = edit {
        state.move_point(i, point);
    }
    if let Some(i) = remove {
        state.remove_point(i);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open points…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save points…").clicked() {
                save_points_dialog(state);
                ui.close_menu();
            }
            if ui.button("Export curve…").clicked() {
                export_curve_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} points · {} kernel · h = {:.3} · order {}",
            state.training.len(),
            state.kernel,
            state.bandwidth,
            state.order
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open training points")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_file(&path) {
            Ok(points) => {
                log::info!("Loaded {} points from {}", points.len(), path.display());
                state.set_points(points);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn save_points_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save training points")
        .add_filter("JSON", &["json"])
        .set_file_name("points.json")
        .save_file();

    if let Some(path) = file {
        if let Err(e) = loader::save_points(&path, state.training.points()) {
            log::error!("Failed to save points: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        } else {
            log::info!("Saved {} points to {}", state.training.len(), path.display());
        }
    }
}

pub fn export_curve_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export fitted curve")
        .add_filter("CSV", &["csv"])
        .set_file_name("curve.csv")
        .save_file();

    if let Some(path) = file {
        let curve = state.curve_points();
        if let Err(e) = loader::save_curve(&path, &curve) {
            log::error!("Failed to export curve: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        } else {
            log::info!("Exported {} curve points to {}", curve.len(), path.display());
        }
    }
}
