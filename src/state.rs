use std::f64::consts::TAU;

use crate::config::Settings;
use crate::data::model::{linspace, Point, TrainingSet};
use crate::data::sample::noisy_sine;
use crate::regression::bandwidth::{candidate_bandwidths, select_bandwidth, Selection};
use crate::regression::{FitError, Kernel, LocalFit, LocalRegression};

/// Orders drawn as thin reference curves when comparison is on.
pub const COMPARISON_ORDERS: [usize; 4] = [0, 1, 2, 3];

/// Number of candidates scored by "Suggest bandwidth".
const CANDIDATE_COUNT: usize = 24;

/// Fraction of the data range added on each side of the query grid.
const GRID_PADDING: f64 = 0.1;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Inputs (training points and regression parameters) are only changed
/// through the setters below; each one recomputes the derived fields.
pub struct AppState {
    pub settings: Settings,

    /// Editable scatter.
    pub training: TrainingSet,

    pub kernel: Kernel,
    pub bandwidth: f64,
    pub order: usize,
    pub grid_points: usize,

    /// Query x whose kernel weights and local polynomial are shown.
    pub probe_x: f64,
    pub show_probe: bool,
    pub compare_orders: bool,

    /// Fitted curve over the query grid, split into segments wherever a
    /// grid point has no training data inside a compact kernel's window.
    pub curve: Vec<Vec<[f64; 2]>>,

    /// Grid points left out of `curve` for lack of support.
    pub uncovered: usize,

    /// `(order, curve)` for each entry of [`COMPARISON_ORDERS`].
    pub comparison: Vec<(usize, Vec<Vec<[f64; 2]>>)>,

    /// Local polynomial fitted at `probe_x`.
    pub probe_fit: Option<LocalFit>,

    /// Relative kernel weight of each training point at `probe_x`.
    pub probe_weights: Vec<f64>,

    /// Scores from the last bandwidth suggestion.
    pub selection: Option<Selection>,

    /// Index of the point being dragged in the plot.
    pub dragging: Option<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    next_seed: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let training = TrainingSet::new(noisy_sine(
            settings.sample_size,
            settings.noise,
            settings.seed,
        ));
        let mut state = Self {
            kernel: settings.kernel,
            bandwidth: settings.bandwidth,
            order: settings.order,
            grid_points: settings.grid_points,
            probe_x: 0.0,
            show_probe: true,
            compare_orders: false,
            curve: Vec::new(),
            uncovered: 0,
            comparison: Vec::new(),
            probe_fit: None,
            probe_weights: Vec::new(),
            selection: None,
            dragging: None,
            status_message: None,
            next_seed: settings.seed.wrapping_add(1),
            training,
            settings,
        };
        state.center_probe();
        state.recompute();
        state
    }

    /// x extent of the query grid: the data range plus some padding.
    pub fn x_range(&self) -> (f64, f64) {
        match self.training.bounds() {
            Some((lo, hi)) if hi > lo => {
                let pad = (hi - lo) * GRID_PADDING;
                (lo - pad, hi + pad)
            }
            Some((x, _)) => (x - 1.0, x + 1.0),
            None => (0.0, TAU),
        }
    }

    // -- Parameter setters -------------------------------------------------

    pub fn set_bandwidth(&mut self, bandwidth: f64) {
        let [lo, hi] = self.settings.bandwidth_range;
        self.bandwidth = bandwidth.clamp(lo, hi);
        self.recompute();
    }

    pub fn set_order(&mut self, order: usize) {
        self.order = order.min(self.settings.max_order);
        self.recompute();
    }

    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = kernel;
        self.recompute();
    }

    pub fn set_probe(&mut self, x: f64) {
        self.probe_x = x;
        self.recompute();
    }

    pub fn set_grid_points(&mut self, n: usize) {
        self.grid_points = n.max(2);
        self.recompute();
    }

    pub fn set_compare_orders(&mut self, on: bool) {
        self.compare_orders = on;
        self.recompute();
    }

    // -- Training point edits ----------------------------------------------

    pub fn move_point(&mut self, index: usize, point: Point) {
        if self.training.set_point(index, point) {
            self.recompute();
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.training.add(point);
        self.recompute();
    }

    pub fn remove_point(&mut self, index: usize) {
        if self.training.remove(index).is_some() {
            self.dragging = None;
            self.recompute();
        }
    }

    /// Replace all training points (e.g. after loading a file).
    pub fn set_points(&mut self, points: Vec<Point>) {
        self.training = TrainingSet::new(points);
        self.dragging = None;
        self.selection = None;
        self.center_probe();
        self.recompute();
    }

    /// Draw a fresh noisy sine sample with the next seed.
    pub fn resample(&mut self) {
        let seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(1);
        log::info!("Resampling {} points with seed {seed}", self.settings.sample_size);
        self.set_points(noisy_sine(self.settings.sample_size, self.settings.noise, seed));
    }

    pub fn clear_points(&mut self) {
        self.set_points(Vec::new());
    }

    /// Pick the bandwidth with the lowest leave-one-out error.
    pub fn suggest_bandwidth(&mut self) {
        let xs = self.training.xs();
        let ys = self.training.ys();
        let [lo, hi] = self.settings.bandwidth_range;
        let candidates: Vec<f64> = candidate_bandwidths(&xs, CANDIDATE_COUNT)
            .into_iter()
            .filter(|h| (lo..=hi).contains(h))
            .collect();

        if candidates.is_empty() {
            self.status_message = Some("Need at least two distinct x values".to_string());
            return;
        }

        match select_bandwidth(self.kernel, self.order, &xs, &ys, &candidates) {
            Ok(selection) => {
                log::info!(
                    "LOOCV selected bandwidth {:.4} from {} candidates",
                    selection.bandwidth,
                    candidates.len()
                );
                self.bandwidth = selection.bandwidth;
                self.selection = Some(selection);
                self.recompute();
            }
            Err(e) => {
                log::error!("Bandwidth selection failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    // -- Recomputation -----------------------------------------------------

    /// Rebuild every derived field. Errors are logged and reported in
    /// `status_message`; the previous results stay on screen.
    pub fn recompute(&mut self) {
        match self.try_recompute() {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Recomputation failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    fn try_recompute(&mut self) -> Result<(), FitError> {
        if self.training.is_empty() {
            self.curve.clear();
            self.uncovered = 0;
            self.comparison.clear();
            self.probe_fit = None;
            self.probe_weights.clear();
            return Ok(());
        }

        let xs = self.training.xs();
        let ys = self.training.ys();
        let (lo, hi) = self.x_range();
        let grid = linspace(lo, hi, self.grid_points);

        let reg = LocalRegression::new(self.kernel, self.bandwidth, self.order)?;
        let values = reg.predict_many(&xs, &ys, &grid)?;
        let uncovered = values.iter().filter(|v| v.is_none()).count();
        let curve = segments(&grid, &values);

        let comparison = if self.compare_orders {
            COMPARISON_ORDERS
                .iter()
                .map(|&order| {
                    let reg = LocalRegression::new(self.kernel, self.bandwidth, order)?;
                    Ok((order, segments(&grid, &reg.predict_many(&xs, &ys, &grid)?)))
                })
                .collect::<Result<Vec<_>, FitError>>()?
        } else {
            Vec::new()
        };

        // The probe may sit where the curve has a gap; that is not an error.
        let probe_fit = match reg.fit_at(&xs, &ys, self.probe_x) {
            Ok(fit) => Some(fit),
            Err(e) if e.is_local() => None,
            Err(e) => return Err(e),
        };
        let probe_weights = match self.kernel.weights(&xs, self.probe_x, self.bandwidth) {
            Ok(weights) => weights,
            Err(FitError::NoSupport { .. }) => vec![0.0; xs.len()],
            Err(e) => return Err(e),
        };

        if uncovered > 0 {
            log::debug!(
                "{uncovered} of {} grid points have no support (kernel {}, h = {:.4})",
                grid.len(),
                self.kernel,
                self.bandwidth
            );
        }
        log::debug!(
            "Recomputed {} grid points (kernel {}, h = {:.4}, order {})",
            grid.len(),
            self.kernel,
            self.bandwidth,
            self.order
        );

        self.curve = curve;
        self.uncovered = uncovered;
        self.comparison = comparison;
        self.probe_fit = probe_fit;
        self.probe_weights = probe_weights;
        Ok(())
    }

    /// The fitted curve as one list of `[x, y]`, gaps dropped.
    pub fn curve_points(&self) -> Vec<[f64; 2]> {
        self.curve.concat()
    }

    fn center_probe(&mut self) {
        let (lo, hi) = self.training.bounds().unwrap_or((0.0, TAU));
        self.probe_x = 0.5 * (lo + hi);
    }
}

/// Pair grid x with fitted values, starting a new segment after each gap.
fn segments(grid: &[f64], values: &[Option<f64>]) -> Vec<Vec<[f64; 2]>> {
    let mut out: Vec<Vec<[f64; 2]>> = Vec::new();
    let mut current = Vec::new();
    for (&x, value) in grid.iter().zip(values) {
        match value {
            Some(y) => current.push([x, *y]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::fit::nadaraya_watson;

    #[test]
    fn initial_state_has_a_full_curve() {
        let state = AppState::default();
        assert_eq!(state.curve.len(), 1);
        assert_eq!(state.curve_points().len(), state.settings.grid_points);
        assert_eq!(state.uncovered, 0);
        assert!(state.probe_fit.is_some());
        assert_eq!(state.probe_weights.len(), state.training.len());
        assert!(state.status_message.is_none());
    }

    #[test]
    fn order_zero_curve_is_nadaraya_watson() {
        let mut state = AppState::default();
        state.set_order(0);
        let xs = state.training.xs();
        let ys = state.training.ys();
        for &[x, y] in state.curve_points().iter().step_by(17) {
            let nw = nadaraya_watson(state.kernel, state.bandwidth, &xs, &ys, x).unwrap();
            assert!((y - nw).abs() < 1e-9);
        }
    }

    #[test]
    fn parameter_changes_recompute_the_curve() {
        let mut state = AppState::default();
        let before = state.curve.clone();
        state.set_bandwidth(state.bandwidth * 3.0);
        assert_ne!(state.curve, before);

        let before = state.curve.clone();
        state.set_order(3);
        assert_ne!(state.curve, before);
    }

    #[test]
    fn dragging_a_point_moves_the_fit_towards_it() {
        let mut state = AppState::default();
        state.set_bandwidth(0.3);
        let target = state.training.points()[10];
        state.set_probe(target.x);
        let before = state.probe_fit.as_ref().unwrap().value();

        state.move_point(10, Point::new(target.x, target.y + 5.0));
        let after = state.probe_fit.as_ref().unwrap().value();
        assert!(after > before + 0.5);
    }

    #[test]
    fn invalid_training_data_keeps_last_curve_and_reports() {
        let mut state = AppState::default();
        let good = state.curve.clone();
        let original = state.training.points()[0];

        state.move_point(0, Point::new(f64::NAN, 1.0));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error"));
        assert_eq!(state.curve, good);

        state.move_point(0, original);
        assert!(state.status_message.is_none());
        assert_eq!(state.curve, good);
    }

    #[test]
    fn compact_kernels_at_default_settings_stay_reactive() {
        for kernel in [Kernel::Epanechnikov, Kernel::Tricube, Kernel::Uniform] {
            let mut state = AppState::default();
            let gaussian = state.curve.clone();

            state.set_kernel(kernel);
            assert!(state.status_message.is_none(), "{kernel}: {:?}", state.status_message);
            assert!(!state.curve.is_empty());
            assert_ne!(state.curve, gaussian, "{kernel}");

            let before = state.curve.clone();
            let p = state.training.points()[10];
            state.move_point(10, Point::new(p.x, 5.0));
            assert!(state.status_message.is_none());
            assert_ne!(state.curve, before, "{kernel}");
        }
    }

    #[test]
    fn unsupported_grid_points_become_gaps() {
        let mut state = AppState::default();
        state.set_kernel(Kernel::Uniform);
        state.set_bandwidth(0.05);
        assert!(state.status_message.is_none());
        assert!(state.uncovered > 0);
        assert_eq!(
            state.curve_points().len() + state.uncovered,
            state.grid_points
        );

        // Every drawn value is a real fit at that x.
        let reg = LocalRegression::new(Kernel::Uniform, 0.05, state.order).unwrap();
        let xs = state.training.xs();
        let ys = state.training.ys();
        for &[x, y] in state.curve_points().iter().step_by(7) {
            assert!((reg.predict(&xs, &ys, x).unwrap() - y).abs() < 1e-12);
        }
    }

    #[test]
    fn probe_without_support_clears_the_local_fit_only() {
        let mut state = AppState::default();
        state.set_kernel(Kernel::Uniform);
        state.set_bandwidth(0.05);
        let (lo, _) = state.x_range();
        state.set_probe(lo);

        assert!(state.status_message.is_none());
        assert!(state.probe_fit.is_none());
        assert_eq!(state.probe_weights.len(), state.training.len());
        assert!(state.probe_weights.iter().all(|&w| w == 0.0));
        assert!(!state.curve.is_empty());
    }

    #[test]
    fn empty_training_set_clears_derived_data() {
        let mut state = AppState::default();
        state.clear_points();
        assert!(state.curve.is_empty());
        assert!(state.probe_fit.is_none());
        assert!(state.status_message.is_none());

        state.add_point(Point::new(1.0, 2.0));
        let curve = state.curve_points();
        assert_eq!(curve.len(), state.grid_points);
        assert!(curve.iter().all(|&[_, y]| (y - 2.0).abs() < 1e-12));
    }

    #[test]
    fn comparison_curves_follow_the_toggle() {
        let mut state = AppState::default();
        state.set_compare_orders(true);
        assert_eq!(state.comparison.len(), COMPARISON_ORDERS.len());
        state.set_compare_orders(false);
        assert!(state.comparison.is_empty());
    }

    #[test]
    fn suggested_bandwidth_is_a_scored_candidate() {
        let mut state = AppState::default();
        state.suggest_bandwidth();
        let selection = state.selection.clone().unwrap();
        assert_eq!(state.bandwidth, selection.bandwidth);
        assert!(selection.scores.iter().any(|&(h, _)| h == state.bandwidth));
    }

    #[test]
    fn resample_changes_points_but_keeps_size() {
        let mut state = AppState::default();
        let before = state.training.clone();
        state.resample();
        assert_eq!(state.training.len(), before.len());
        assert_ne!(state.training, before);
    }

    #[test]
    fn settings_are_clamped() {
        let mut state = AppState::default();
        state.set_order(1000);
        assert_eq!(state.order, state.settings.max_order);
        state.set_bandwidth(-1.0);
        assert_eq!(state.bandwidth, state.settings.bandwidth_range[0]);
    }
}
