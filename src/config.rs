use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::regression::Kernel;

/// Environment variable naming a JSON settings file.
pub const CONFIG_ENV: &str = "RUSTY_KERNEL_CONFIG";

// ---------------------------------------------------------------------------
// Startup settings
// ---------------------------------------------------------------------------

/// Initial values for the explorer. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub kernel: Kernel,
    pub bandwidth: f64,
    /// `[min, max]` of the bandwidth slider.
    pub bandwidth_range: [f64; 2],
    pub order: usize,
    pub max_order: usize,
    /// Number of query points along the x axis.
    pub grid_points: usize,
    pub sample_size: usize,
    pub noise: f64,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kernel: Kernel::Gaussian,
            bandwidth: 0.6,
            bandwidth_range: [0.01, 10.0],
            order: 1,
            max_order: 8,
            grid_points: 200,
            sample_size: 30,
            noise: 0.25,
            seed: 42,
        }
    }
}

impl Settings {
    /// Read settings from [`CONFIG_ENV`] if set, falling back to defaults.
    pub fn load() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_file(Path::new(&path)) {
            Ok(settings) => {
                log::info!("Loaded settings from {path}");
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings file {path}: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).context("reading settings file")?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).context("parsing settings")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        let [lo, hi] = self.bandwidth_range;
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && lo < hi) {
            bail!("bandwidth_range must satisfy 0 < min < max, got [{lo}, {hi}]");
        }
        if !(lo..=hi).contains(&self.bandwidth) {
            bail!("bandwidth {} is outside bandwidth_range [{lo}, {hi}]", self.bandwidth);
        }
        if self.order > self.max_order {
            bail!("order {} exceeds max_order {}", self.order, self.max_order);
        }
        if self.grid_points < 2 {
            bail!("grid_points must be at least 2, got {}", self.grid_points);
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            bail!("noise must be non-negative, got {}", self.noise);
        }
        Ok(())
    }
}
