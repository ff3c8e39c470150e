//! CSV export of the per-length table.

use crate::{Lap, Result, Segment, Workout};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    ordinal: u32,
    #[serde(rename = "type")]
    kind: &'static str,
    stroke: Option<String>,
    elapsed: f64,
    timer: f64,
    strokes: u32,
    cadence: f64,
    speed: f64,
    calories: f64,
    lap: Option<u32>,
}

impl CsvRow {
    fn new(segment: &Segment, lap: Option<u32>) -> Self {
        CsvRow {
            ordinal: segment.ordinal,
            kind: if segment.is_active() { "active" } else { "idle" },
            stroke: segment.stroke.as_ref().map(|s| s.to_string()),
            elapsed: segment.elapsed_time,
            timer: segment.timer_time,
            strokes: segment.stroke_count,
            cadence: segment.cadence,
            speed: segment.avg_speed,
            calories: segment.calories,
            lap,
        }
    }
}

/// 1-based number of the lap whose span holds `ordinal`
fn lap_number(laps: &[Lap], ordinal: u32) -> Option<u32> {
    let count = laps.partition_point(|lap| lap.first_segment_ordinal <= ordinal);
    (count > 0).then_some(count as u32)
}

/// Write the length table as CSV with headers
pub fn write_lengths<W: Write>(workout: &Workout, writer: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for segment in &workout.segments {
        writer.serialize(CsvRow::new(segment, lap_number(&workout.laps, segment.ordinal)))?;
    }

    writer.flush()?;
    Ok(workout.segments.len())
}

/// Export the length table to a CSV file, replacing any existing file
pub fn export_lengths_csv(workout: &Workout, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let count = write_lengths(workout, &file)?;
    file.sync_all()?;

    tracing::info!("Exported {} lengths to {:?}", count, path);
    Ok(count)
}
