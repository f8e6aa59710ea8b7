use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::Point;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load training points from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – numeric `x` and `y` columns (recommended)
/// * `.json`    – `[{ "x": 0.1, "y": 2.3 }, ...]`
/// * `.csv`     – header row with `x` and `y` columns; others are ignored
pub fn load_file(path: &Path) -> Result<Vec<Point>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let points = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text)?
        }
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)?
        }
        other => bail!("Unsupported file extension: .{other}"),
    };

    validate_points(&points)?;
    Ok(points)
}

/// Write the fitted curve as `x,y` CSV.
pub fn save_curve(path: &Path, curve: &[[f64; 2]]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_curve_csv(file, curve)
}

/// Write the training points as a JSON array of `{x, y}` records.
pub fn save_points(path: &Path, points: &[Point]) -> Result<()> {
    let text = serde_json::to_string_pretty(points).context("serializing points")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

// ---------------------------------------------------------------------------
// JSON / CSV
// ---------------------------------------------------------------------------

/// Parse a records-oriented JSON array (`df.to_json(orient='records')`).
pub fn parse_json(text: &str) -> Result<Vec<Point>> {
    serde_json::from_str(text).context("parsing JSON: expected an array of {x, y} objects")
}

/// Read `x` / `y` columns from CSV with a header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Point>> {
    let mut reader = csv::Reader::from_reader(reader);
    reader
        .deserialize::<Point>()
        .enumerate()
        .map(|(row_no, record)| record.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

pub fn write_curve_csv<W: Write>(writer: W, curve: &[[f64; 2]]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for &[x, y] in curve {
        writer
            .serialize(Point { x, y })
            .context("writing CSV record")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn validate_points(points: &[Point]) -> Result<()> {
    for (i, p) in points.iter().enumerate() {
        if !p.x.is_finite() || !p.y.is_finite() {
            bail!("Point {i}: ({}, {}) is not finite", p.x, p.y);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one training point per row.
///
/// Expected schema: numeric `x` and `y` columns (any integer or float type;
/// they are cast to Float64). Other columns are ignored. Works with files
/// written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<Vec<Point>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let (points, skipped) = collect_points(reader)?;
    if let Some(first) = skipped.first() {
        log::warn!(
            "Skipped {} parquet rows with a null coordinate (first at row {first})",
            skipped.len()
        );
    }
    Ok(points)
}

/// Gather points from record batches. Rows with a null `x` or `y` are left
/// out; their file-wide row numbers are returned alongside the points.
fn collect_points<I>(batches: I) -> Result<(Vec<Point>, Vec<usize>)>
where
    I: IntoIterator<Item = Result<RecordBatch, ArrowError>>,
{
    let mut points = Vec::new();
    let mut skipped = Vec::new();
    let mut offset = 0;

    for batch_result in batches {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;

        let x = column_as_f64(batch.column(x_idx)).context("reading 'x'")?;
        let y = column_as_f64(batch.column(y_idx)).context("reading 'y'")?;

        for row in 0..batch.num_rows() {
            if x.is_null(row) || y.is_null(row) {
                log::debug!("Skipping parquet row {} with a null coordinate", offset + row);
                skipped.push(offset + row);
                continue;
            }
            points.push(Point::new(x.value(row), y.value(row)));
        }
        offset += batch.num_rows();
    }

    Ok((points, skipped))
}

// -- Parquet / Arrow helpers --

/// Cast a numeric column to Float64.
fn column_as_f64(col: &Arc<dyn Array>) -> Result<Float64Array> {
    match col.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64 => {}
        other => bail!("Expected a numeric column, got {other:?}"),
    }

    let casted = cast(col, &DataType::Float64).context("casting to Float64")?;
    casted
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .context("expected Float64Array after cast")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use parquet::arrow::ArrowWriter;

    #[test]
    fn parses_json_records() {
        let points = parse_json(r#"[{"x": 1.0, "y": 2.5}, {"x": -3, "y": 0}]"#).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 2.5), Point::new(-3.0, 0.0)]);
    }

    #[test]
    fn rejects_json_that_is_not_point_records() {
        assert!(parse_json(r#"{"x": [1, 2]}"#).is_err());
        assert!(parse_json(r#"[{"x": 1.0}]"#).is_err());
    }

    #[test]
    fn reads_csv_ignoring_extra_columns() {
        let data = "label,x,y\na,0.5,1.5\nb,2,-1\n";
        let points = read_csv(data.as_bytes()).unwrap();
        assert_eq!(points, vec![Point::new(0.5, 1.5), Point::new(2.0, -1.0)]);
    }

    #[test]
    fn csv_row_errors_carry_the_row_number() {
        let data = "x,y\n1,2\noops,3\n";
        let err = read_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn non_finite_points_are_rejected() {
        let points = read_csv("x,y\n1,NaN\n".as_bytes()).unwrap();
        assert!(validate_points(&points).is_err());
    }

    #[test]
    fn curve_csv_has_header_and_rows() {
        let mut buf = Vec::new();
        write_curve_csv(&mut buf, &[[0.0, 1.0], [0.5, 2.25]]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["x,y", "0.0,1.0", "0.5,2.25"]);
    }

    fn write_parquet(path: &Path, batches: &[RecordBatch]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batches[0].schema(), None).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.close().unwrap();
    }

    fn batch(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
        RecordBatch::try_from_iter(columns).unwrap()
    }

    #[test]
    fn parquet_integer_columns_are_cast_and_null_rows_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("points.parquet");
        write_parquet(
            &path,
            &[batch(vec![
                ("label", Arc::new(StringArray::from(vec!["a", "b", "c"])) as ArrayRef),
                ("x", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
                (
                    "y",
                    Arc::new(Float64Array::from(vec![Some(0.5), None, Some(-1.5)])) as ArrayRef,
                ),
            ])],
        );

        let points = load_file(&path).unwrap();
        assert_eq!(points, vec![Point::new(1.0, 0.5), Point::new(3.0, -1.5)]);
    }

    #[test]
    fn parquet_without_y_column_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("no_y.pq");
        write_parquet(
            &path,
            &[batch(vec![(
                "x",
                Arc::new(Float64Array::from(vec![1.0, 2.0])) as ArrayRef,
            )])],
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'y' column"));
    }

    #[test]
    fn parquet_text_coordinates_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("text.parquet");
        write_parquet(
            &path,
            &[batch(vec![
                ("x", Arc::new(StringArray::from(vec!["1.0"])) as ArrayRef),
                ("y", Arc::new(Float64Array::from(vec![2.0])) as ArrayRef),
            ])],
        );

        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Expected a numeric column"));
    }

    #[test]
    fn skipped_rows_are_numbered_across_batches() {
        let first = batch(vec![
            ("x", Arc::new(Float64Array::from(vec![0.0, 1.0])) as ArrayRef),
            ("y", Arc::new(Float64Array::from(vec![Some(0.0), Some(1.0)])) as ArrayRef),
        ]);
        let second = batch(vec![
            ("x", Arc::new(Float64Array::from(vec![2.0, 3.0, 4.0])) as ArrayRef),
            (
                "y",
                Arc::new(Float64Array::from(vec![None, Some(3.0), None])) as ArrayRef,
            ),
        ]);

        let (points, skipped) = collect_points(vec![Ok(first), Ok(second)]).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], Point::new(3.0, 3.0));
        assert_eq!(skipped, vec![2, 4]);
    }

    #[test]
    fn saved_points_load_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("points.json");
        let points = vec![Point::new(0.25, -1.0), Point::new(3.5, 2.0e-3)];

        save_points(&path, &points).unwrap();
        assert_eq!(load_file(&path).unwrap(), points);
    }

    #[test]
    fn exported_curve_reads_back_as_points() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("curve.csv");
        save_curve(&path, &[[0.0, 1.0], [0.5, 0.75]]).unwrap();
        assert_eq!(
            load_file(&path).unwrap(),
            vec![Point::new(0.0, 1.0), Point::new(0.5, 0.75)]
        );
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let err = load_file(Path::new("points.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
