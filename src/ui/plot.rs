use eframe::egui::{Modifiers, PointerButton, Pos2, Ui};
use egui_plot::{
    Legend, Line, LineStyle, Plot, PlotPoint, PlotPoints, PlotResponse, PlotTransform, PlotUi,
    Points, VLine,
};

use rusty_kernel::data::model::{linspace, Point};
use rusty_kernel::state::AppState;

use crate::color::{self, CURVE_COLOR, DRAGGED_COLOR, KERNEL_COLOR, PROBE_COLOR};

/// Screen distance (points) within which a click or drag grabs a point.
const PICK_RADIUS: f32 = 12.0;

/// The local polynomial is drawn over `probe ± LOCAL_SPAN * bandwidth`.
const LOCAL_SPAN: f64 = 2.0;

const LOCAL_SAMPLES: usize = 80;

// ---------------------------------------------------------------------------
// Regression plot (upper central panel)
// ---------------------------------------------------------------------------

/// Render the scatter and fitted curves, then apply any point edits made
/// with the mouse.
///
/// * drag a point to move it
/// * shift-click to add a point
/// * right-click (or ctrl/cmd-click) a point to remove it
/// * plain click to move the probe
pub fn regression_plot(ui: &mut Ui, state: &mut AppState, height: f32) {
    let (modifiers, press_origin) = ui.input(|i| (i.modifiers, i.pointer.press_origin()));

    let response = Plot::new("regression_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label("x")
        .y_axis_label("y")
        .allow_drag(false)
        .allow_boxed_zoom(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| draw_regression(plot_ui, state));

    handle_point_edits(state, &response, modifiers, press_origin);
}

fn draw_regression(plot_ui: &mut PlotUi, state: &AppState) {
    let colors = color::generate_palette(state.comparison.len());
    for ((order, curve), c) in state.comparison.iter().zip(colors) {
        // Segments share a name so the legend shows one entry per order.
        for segment in curve {
            plot_ui.line(
                Line::new(PlotPoints::from(segment.clone()))
                    .name(format!("order {order}"))
                    .color(c.gamma_multiply(0.7))
                    .width(1.0),
            );
        }
    }

    for segment in &state.curve {
        plot_ui.line(
            Line::new(PlotPoints::from(segment.clone()))
                .name(format!("local fit (order {})", state.order))
                .color(CURVE_COLOR)
                .width(2.5),
        );
    }

    if state.show_probe {
        plot_ui.vline(
            VLine::new(state.probe_x)
                .name("probe")
                .color(PROBE_COLOR)
                .style(LineStyle::dashed_dense()),
        );

        if let Some(fit) = &state.probe_fit {
            let span = LOCAL_SPAN * state.bandwidth;
            let local: PlotPoints = linspace(fit.center - span, fit.center + span, LOCAL_SAMPLES)
                .into_iter()
                .map(|x| [x, fit.evaluate(x)])
                .collect();
            plot_ui.line(
                Line::new(local)
                    .name(format!("local polynomial (degree {})", fit.degree))
                    .color(PROBE_COLOR)
                    .style(LineStyle::dashed_loose())
                    .width(1.5),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(vec![[fit.center, fit.value()]]))
                    .name("probe")
                    .color(PROBE_COLOR)
                    .radius(5.0),
            );
        }
    }

    // Colour each training point by its weight at the probe.
    let weights_fresh = state.probe_weights.len() == state.training.len();
    for (i, p) in state.training.points().iter().enumerate() {
        let color = if state.dragging == Some(i) {
            DRAGGED_COLOR
        } else if state.show_probe && weights_fresh {
            color::weight_color(state.probe_weights[i])
        } else {
            KERNEL_COLOR
        };
        plot_ui.points(
            Points::new(PlotPoints::from(vec![[p.x, p.y]]))
                .name("training points")
                .color(color)
                .radius(if state.dragging == Some(i) { 6.0 } else { 4.0 }),
        );
    }
}

fn pick_point(state: &AppState, transform: &PlotTransform, pos: Pos2) -> Option<usize> {
    pick_in_screen(state, |p| transform.position_from_point(&PlotPoint::new(p.x, p.y)), pos)
}

fn pick_in_screen(state: &AppState, to_screen: impl Fn(&Point) -> Pos2, pos: Pos2) -> Option<usize> {
    state
        .training
        .nearest(PICK_RADIUS as f64, |p| to_screen(p).distance(pos) as f64)
}

/// Where a drag grabs: the press position, since by the time egui reports
/// the drag the pointer has already moved past its drag threshold.
fn grab_position(press_origin: Option<Pos2>, pointer: Pos2) -> Pos2 {
    press_origin.unwrap_or(pointer)
}

fn handle_point_edits(
    state: &mut AppState,
    plot: &PlotResponse<()>,
    modifiers: Modifiers,
    press_origin: Option<Pos2>,
) {
    let response = &plot.response;
    let transform = &plot.transform;
    let Some(pos) = response.interact_pointer_pos().or(response.hover_pos()) else {
        return;
    };
    let cursor = transform.value_from_position(pos);

    if response.drag_started_by(PointerButton::Primary) {
        state.dragging = pick_point(state, transform, grab_position(press_origin, pos));
    }
    if response.dragged_by(PointerButton::Primary) {
        if let Some(i) = state.dragging {
            state.move_point(i, Point::new(cursor.x, cursor.y));
        }
    }
    if response.drag_stopped() {
        state.dragging = None;
    }

    if response.clicked() {
        if modifiers.shift {
            state.add_point(Point::new(cursor.x, cursor.y));
        } else if modifiers.command {
            if let Some(i) = pick_point(state, transform, pos) {
                state.remove_point(i);
            }
        } else {
            state.set_probe(cursor.x);
        }
    }
    if response.secondary_clicked() {
        if let Some(i) = pick_point(state, transform, pos) {
            state.remove_point(i);
        }
    }
}

// ---------------------------------------------------------------------------
// Kernel plot (lower central panel)
// ---------------------------------------------------------------------------

/// Render the kernel profile centred at the probe and the weight it gives
/// each training point.
pub fn kernel_plot(ui: &mut Ui, state: &AppState) {
    let (lo, hi) = state.x_range();
    let kernel = state.kernel;
    let h = state.bandwidth;
    let profile = |x: f64| kernel.evaluate((x - state.probe_x) / h);

    Plot::new("kernel_plot")
        .legend(Legend::default())
        .x_axis_label("x")
        .y_axis_label("weight")
        .include_x(lo)
        .include_x(hi)
        .include_y(0.0)
        .include_y(1.05)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let curve: PlotPoints = linspace(lo, hi, state.grid_points.max(200))
                .into_iter()
                .map(|x| [x, profile(x)])
                .collect();
            plot_ui.line(
                Line::new(curve)
                    .name(format!("{kernel} kernel, h = {h:.3}"))
                    .color(KERNEL_COLOR)
                    .width(2.0),
            );

            let weights: PlotPoints = state
                .training
                .points()
                .iter()
                .map(|p| [p.x, profile(p.x)])
                .collect();
            plot_ui.points(
                Points::new(weights)
                    .name("point weights")
                    .color(color::weight_color(1.0))
                    .radius(3.5),
            );

            plot_ui.vline(
                VLine::new(state.probe_x)
                    .name("probe")
                    .color(PROBE_COLOR)
                    .style(LineStyle::dashed_dense()),
            );
        });
}
