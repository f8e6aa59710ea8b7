use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Point – one training observation
// ---------------------------------------------------------------------------

/// A single `(x, y)` training observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// TrainingSet – the editable scatter
// ---------------------------------------------------------------------------

/// The training points shown (and dragged) in the plot.
///
/// Order is insertion order; the regression does not need sorted x.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    points: Vec<Point>,
}

impl TrainingSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    /// `(min_x, max_x)`, or `None` when empty.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold((first.x, first.x), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        }))
    }

    pub fn add(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Remove the point at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Point> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    /// Replace the point at `index`. Returns `false` if out of range.
    pub fn set_point(&mut self, index: usize, point: Point) -> bool {
        match self.points.get_mut(index) {
            Some(p) => {
                *p = point;
                true
            }
            None => false,
        }
    }

    /// Index of the point closest to `target` under `distance`, provided it
    /// is strictly within `max_distance`.
    ///
    /// The metric is supplied by the caller so the UI can pick in screen
    /// space rather than data space.
    pub fn nearest<F>(&self, max_distance: f64, distance: F) -> Option<usize>
    where
        F: Fn(&Point) -> f64,
    {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance(p)))
            .filter(|&(_, d)| d < max_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

// ---------------------------------------------------------------------------
// Query grid
// ---------------------------------------------------------------------------

/// `n` evenly spaced values from `min` to `max` inclusive.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> TrainingSet {
        TrainingSet::new(vec![
            Point::new(1.0, 2.0),
            Point::new(-3.0, 0.5),
            Point::new(4.0, -1.0),
        ])
    }

    #[test]
    fn bounds_cover_all_x() {
        assert_eq!(set().bounds(), Some((-3.0, 4.0)));
        assert_eq!(TrainingSet::default().bounds(), None);
    }

    fn euclid(target: Point) -> impl Fn(&Point) -> f64 {
        move |p| (p.x - target.x).hypot(p.y - target.y)
    }

    #[test]
    fn nearest_respects_radius() {
        let s = set();
        assert_eq!(s.nearest(1.0, euclid(Point::new(1.2, 2.1))), Some(0));
        assert_eq!(s.nearest(1.0, euclid(Point::new(10.0, 10.0))), None);
    }

    #[test]
    fn edits_are_bounds_checked() {
        let mut s = set();
        assert!(s.set_point(2, Point::new(0.0, 0.0)));
        assert!(!s.set_point(9, Point::new(0.0, 0.0)));
        assert_eq!(s.remove(9), None);
        assert_eq!(s.remove(0), Some(Point::new(1.0, 2.0)));
        assert_eq!(s.len(), 2);
        assert_eq!(s.xs(), vec![-3.0, 0.0]);
    }

    #[test]
    fn linspace_hits_both_ends() {
        let g = linspace(-1.0, 2.0, 7);
        assert_eq!(g.len(), 7);
        assert_eq!(g[0], -1.0);
        assert_eq!(g[6], 2.0);
        assert!((g[1] - -0.5).abs() < 1e-15);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 5.0, 1), vec![3.0]);
    }
}
