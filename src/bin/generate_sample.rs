use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use rusty_kernel::data::sample::noisy_sine;

/// Usage: `generate_sample [n_points] [noise] [seed] [output.parquet]`
fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let n: usize = match args.next() {
        Some(s) => s.parse().context("n_points must be an integer")?,
        None => 60,
    };
    let noise: f64 = match args.next() {
        Some(s) => s.parse().context("noise must be a number")?,
        None => 0.25,
    };
    let seed: u64 = match args.next() {
        Some(s) => s.parse().context("seed must be an integer")?,
        None => 42,
    };
    let output_path = args.next().unwrap_or_else(|| "sample_points.parquet".to_string());

    let points = noisy_sine(n, noise, seed);

    let x_array = Float64Array::from(points.iter().map(|p| p.x).collect::<Vec<_>>());
    let y_array = Float64Array::from(points.iter().map(|p| p.y).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::Float64, false),
        Field::new("y", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(x_array), Arc::new(y_array)])
        .context("building record batch")?;

    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;

    log::info!("Wrote {n} points (noise {noise}, seed {seed}) to {output_path}");
    println!("Wrote {n} points to {output_path}");
    Ok(())
}
