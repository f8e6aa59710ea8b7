/// Data layer: training points, file loading/export, and sample generation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv        noisy_sine(seed)
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                  ┌──────────┐
///   │  loader   │  parse file     │  sample   │  deterministic RNG
///   └──────────┘                  └──────────┘
///        │                              │
///        └──────────────┬───────────────┘
///                       ▼
///               ┌──────────────┐
///               │ TrainingSet  │  Vec<Point>, edited by the plot
///               └──────────────┘
/// ```

pub mod loader;
pub mod model;
pub mod sample;
