//! Analysis tables: per-stroke summary, intervals and best times.

use crate::laps::{dominant_stroke, lap_members};
use crate::{total_strokes, LapStroke, PoolUnit, Segment, Stroke, Workout};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default distances for the best times table, in pool units
pub const DEFAULT_BEST_TIME_DISTANCES: [u32; 9] = [50, 100, 200, 500, 1000, 1500, 3000, 5000, 10000];

/// Format seconds as `m:ss` (or `h:mm:ss`) with `precision` decimals
pub fn format_clock(seconds: f64, precision: usize) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let scale = 10u64.pow(precision as u32);
    let units = (seconds * scale as f64).round() as u64;

    let whole = units / scale;
    let fraction = units % scale;
    let (hours, minutes, secs) = (whole / 3600, (whole / 60) % 60, whole % 60);

    let mut out = if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    };
    if precision > 0 {
        out.push_str(&format!(".{:0width$}", fraction, width = precision));
    }
    out
}

fn pace(time: f64, distance: f64, unit: PoolUnit) -> Option<f64> {
    (distance > 0.0).then(|| time * unit.pace_distance() / distance)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// One line of the stroke table
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StrokeRow {
    /// `None` for lengths the device could not classify
    pub stroke: Option<Stroke>,
    pub lengths: u32,
    /// Metres
    pub distance: f64,
    pub time: f64,
    pub pace_per_100: Option<f64>,
    /// Mean of the per-length cadences
    pub avg_spm: f64,
    pub avg_spl: u32,
}

impl StrokeRow {
    fn from_segments(stroke: Option<Stroke>, segments: &[&Segment], pool_length: f64, unit: PoolUnit) -> Self {
        let lengths = segments.len() as u32;
        let distance = f64::from(lengths) * pool_length;
        let time: f64 = segments.iter().map(|s| s.elapsed_time).sum();
        let strokes = total_strokes(segments.iter().copied());

        StrokeRow {
            stroke,
            lengths,
            distance,
            time,
            pace_per_100: pace(time, distance, unit),
            avg_spm: mean(segments.iter().map(|s| s.cadence)),
            avg_spl: strokes.checked_div(lengths).unwrap_or(0),
        }
    }
}

/// Per-stroke breakdown of the active lengths
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StrokeSummary {
    pub rows: Vec<StrokeRow>,
    pub rest_time: f64,
    pub total: StrokeRow,
}

impl StrokeSummary {
    pub fn from_workout(workout: &Workout) -> Self {
        let pool_length = workout.pool_length();
        let unit = workout.session.pool_length_unit;

        let mut by_stroke: BTreeMap<Option<Stroke>, Vec<&Segment>> = BTreeMap::new();
        for segment in workout.active_segments() {
            by_stroke
                .entry(segment.stroke.clone())
                .or_default()
                .push(segment);
        }

        let rows = by_stroke
            .into_iter()
            .map(|(stroke, segments)| StrokeRow::from_segments(stroke, &segments, pool_length, unit))
            .collect();

        let active: Vec<&Segment> = workout.active_segments().collect();
        let rest_time = workout
            .segments
            .iter()
            .filter(|s| !s.is_active())
            .map(|s| s.elapsed_time)
            .sum();

        StrokeSummary {
            rows,
            rest_time,
            total: StrokeRow::from_segments(None, &active, pool_length, unit),
        }
    }
}

/// One lap of the interval table
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct IntervalRow {
    /// 1-based, counting only laps with active lengths
    pub number: u32,
    pub first_ordinal: u32,
    pub last_ordinal: u32,
    pub lengths: u32,
    /// Metres
    pub distance: f64,
    pub stroke: Option<LapStroke>,
    /// Swim time of the active lengths
    pub time: f64,
    /// Rest taken inside the interval
    pub rest_time: f64,
    pub pace_per_100: Option<f64>,
    pub avg_spm: f64,
    pub avg_spl: f64,
}

/// Lap-by-lap breakdown of the workout
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct IntervalSummary {
    pub intervals: Vec<IntervalRow>,
    pub total_time: f64,
    pub total_rest: f64,
}

impl IntervalSummary {
    pub fn from_workout(workout: &Workout) -> Self {
        let pool_length = workout.pool_length();
        let unit = workout.session.pool_length_unit;
        let mut intervals = Vec::new();

        for (_, members) in lap_members(workout) {
            let (active, rest): (Vec<&Segment>, Vec<&Segment>) =
                members.into_iter().partition(|s| s.is_active());
            let (Some(first), Some(last)) = (active.first(), active.last()) else {
                continue;
            };

            let lengths = active.len() as u32;
            let distance = f64::from(lengths) * pool_length;
            let time: f64 = active.iter().map(|s| s.elapsed_time).sum();

            intervals.push(IntervalRow {
                number: intervals.len() as u32 + 1,
                first_ordinal: first.ordinal,
                last_ordinal: last.ordinal,
                lengths,
                distance,
                stroke: dominant_stroke(active.iter().copied()),
                time,
                rest_time: rest.iter().map(|s| s.elapsed_time).sum(),
                pace_per_100: pace(time, distance, unit),
                avg_spm: mean(active.iter().map(|s| s.cadence)),
                avg_spl: f64::from(total_strokes(active.iter().copied())) / f64::from(lengths),
            });
        }

        IntervalSummary {
            total_time: intervals.iter().map(|i| i.time).sum(),
            total_rest: intervals.iter().map(|i| i.rest_time).sum(),
            intervals,
        }
    }
}

/// Fastest swim of one stroke over one distance
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BestTime {
    pub stroke: Stroke,
    /// Pool units
    pub distance: u32,
    pub time: f64,
    pub first_ordinal: u32,
    pub last_ordinal: u32,
    pub avg_spm: f64,
    pub avg_spl: u32,
}

/// Runs of active lengths swum with the same stroke
///
/// Rest intervals are skipped, so only a change of stroke ends a run.
/// Lengths without a stroke end the current run and start none.
fn streaks(workout: &Workout) -> Vec<(&Stroke, Vec<&Segment>)> {
    let mut out: Vec<(&Stroke, Vec<&Segment>)> = Vec::new();
    let mut open = false;

    for segment in workout.active_segments() {
        let Some(stroke) = segment.stroke.as_ref() else {
            open = false;
            continue;
        };

        match out.last_mut() {
            Some((current, run)) if open && *current == stroke => run.push(segment),
            _ => out.push((stroke, vec![segment])),
        }
        open = true;
    }

    out
}

/// Best times per stroke over the given distances (in pool units)
///
/// Candidates are the leading lengths of each same-stroke run of active
/// lengths whose distance rounds to one of `distances`.
pub fn best_times(workout: &Workout, distances: &[u32]) -> Vec<BestTime> {
    let length = workout
        .session
        .pool_length_unit
        .metres_to_unit(workout.pool_length());
    let mut best: BTreeMap<(Stroke, u32), BestTime> = BTreeMap::new();

    for (stroke, run) in streaks(workout) {
        let mut time = 0.0;
        let mut strokes = 0u32;

        for (i, segment) in run.iter().enumerate() {
            time += segment.elapsed_time;
            strokes = strokes.saturating_add(segment.stroke_count);

            let count = i as u32 + 1;
            let distance = (f64::from(count) * length).round() as u32;
            if !distances.contains(&distance) {
                continue;
            }

            let candidate = BestTime {
                stroke: stroke.clone(),
                distance,
                time,
                first_ordinal: run[0].ordinal,
                last_ordinal: segment.ordinal,
                avg_spm: mean(run[..=i].iter().map(|s| s.cadence)),
                avg_spl: strokes / count,
            };

            let key = (stroke.clone(), distance);
            let faster = best
                .get(&key)
                .map_or(true, |current| candidate.time < current.time);
            if faster {
                best.insert(key, candidate);
            }
        }
    }

    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{active, idle, lap_at, normalized, stroked};

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(62.0, 0), "1:02");
        assert_eq!(format_clock(5.0, 0), "0:05");
        assert_eq!(format_clock(89.56, 1), "1:29.6");
        assert_eq!(format_clock(3725.0, 0), "1:02:05");
        assert_eq!(format_clock(119.96, 1), "2:00.0");
        assert_eq!(format_clock(-3.0, 0), "0:00");
    }

    #[test]
    fn test_stroke_summary() {
        let workout = normalized(
            vec![
                active(0, 30.0),
                active(1, 30.0),
                idle(2, 20.0),
                stroked(3, 40.0, Stroke::Breaststroke),
            ],
            vec![lap_at(0)],
        );
        let summary = StrokeSummary::from_workout(&workout);

        assert_eq!(summary.rows.len(), 2);
        let free = &summary.rows[0];
        assert_eq!(free.stroke, Some(Stroke::Freestyle));
        assert_eq!(free.lengths, 2);
        assert_eq!(free.distance, 50.0);
        assert_eq!(free.pace_per_100, Some(120.0));
        assert_eq!(free.avg_spl, 20);
        assert!((free.avg_spm - 40.0).abs() < 1e-9);

        assert_eq!(summary.rest_time, 20.0);
        assert_eq!(summary.total.lengths, 3);
        assert_eq!(summary.total.time, 100.0);
    }

    #[test]
    fn test_interval_summary_with_rest() {
        let workout = normalized(
            vec![
                active(0, 30.0),
                active(1, 32.0),
                idle(2, 20.0),
                stroked(3, 40.0, Stroke::Breaststroke),
                idle(4, 15.0),
                stroked(5, 41.0, Stroke::Breaststroke),
                active(6, 29.0),
            ],
            vec![lap_at(0), lap_at(3)],
        );
        let summary = IntervalSummary::from_workout(&workout);

        assert_eq!(summary.intervals.len(), 2);
        let first = &summary.intervals[0];
        assert_eq!(first.number, 1);
        assert_eq!((first.first_ordinal, first.last_ordinal), (0, 1));
        assert_eq!(first.distance, 50.0);
        assert_eq!(first.stroke, Some(LapStroke::Single(Stroke::Freestyle)));
        assert_eq!(first.time, 62.0);
        assert_eq!(first.rest_time, 20.0);
        assert_eq!(first.pace_per_100, Some(124.0));
        assert!((first.avg_spm - 38.75).abs() < 1e-9);
        assert_eq!(first.avg_spl, 20.0);

        let second = &summary.intervals[1];
        assert_eq!((second.first_ordinal, second.last_ordinal), (3, 6));
        assert_eq!(second.lengths, 3);
        assert_eq!(second.stroke, Some(LapStroke::Mixed));
        assert_eq!(second.rest_time, 15.0);

        assert_eq!(summary.total_time, 172.0);
        assert_eq!(summary.total_rest, 35.0);
    }

    #[test]
    fn test_interval_summary_folds_rest_laps_into_previous_interval() {
        let mut workout = normalized(
            vec![active(0, 30.0), idle(1, 20.0), active(2, 31.0)],
            vec![lap_at(0)],
        );
        // A device lap holding only rest, as decoded before any edit
        let mut rest_lap = workout.laps[0].clone();
        rest_lap.first_segment_ordinal = 1;
        workout.laps.push(rest_lap);
        let mut swim_lap = workout.laps[0].clone();
        swim_lap.first_segment_ordinal = 2;
        workout.laps.push(swim_lap);

        let summary = IntervalSummary::from_workout(&workout);

        assert_eq!(summary.intervals.len(), 2);
        assert_eq!(summary.intervals[0].rest_time, 20.0);
        assert_eq!(summary.intervals[1].number, 2);
        assert_eq!(summary.intervals[1].first_ordinal, 2);
        assert_eq!(summary.total_rest, 20.0);
    }

    #[test]
    fn test_best_times_use_run_prefixes() {
        let workout = normalized(
            vec![
                active(0, 30.0),
                active(1, 31.0),
                active(2, 29.0),
                active(3, 28.0),
                stroked(4, 40.0, Stroke::Breaststroke),
                active(5, 27.0),
                active(6, 27.0),
            ],
            vec![lap_at(0)],
        );
        let best = best_times(&workout, &[50, 100]);

        assert_eq!(best.len(), 2);
        // The second freestyle run is faster over 50 m
        assert_eq!(best[0].stroke, Stroke::Freestyle);
        assert_eq!(best[0].distance, 50);
        assert_eq!(best[0].time, 54.0);
        assert_eq!(best[0].first_ordinal, 5);
        assert_eq!(best[0].last_ordinal, 6);
        assert_eq!(best[1].distance, 100);
        assert_eq!(best[1].time, 118.0);
        assert_eq!(best[1].avg_spl, 20);
    }

    #[test]
    fn test_best_times_run_continues_across_rest() {
        let workout = normalized(
            vec![
                active(0, 30.0),
                active(1, 31.0),
                idle(2, 20.0),
                active(3, 27.0),
                active(4, 27.0),
            ],
            vec![lap_at(0)],
        );
        let best = best_times(&workout, &[100]);

        assert_eq!(best.len(), 1);
        assert_eq!(best[0].time, 115.0);
        assert_eq!(best[0].first_ordinal, 0);
        assert_eq!(best[0].last_ordinal, 4);
    }

    #[test]
    fn test_best_times_split_by_stroke() {
        let workout = normalized(
            vec![
                stroked(0, 40.0, Stroke::Backstroke),
                stroked(1, 41.0, Stroke::Backstroke),
                active(2, 30.0),
                active(3, 30.0),
            ],
            vec![lap_at(0)],
        );
        let best = best_times(&workout, &DEFAULT_BEST_TIME_DISTANCES);

        assert_eq!(best.len(), 2);
        assert!(best.iter().any(|b| b.stroke == Stroke::Backstroke && b.time == 81.0));
        assert!(best.iter().any(|b| b.stroke == Stroke::Freestyle && b.time == 60.0));
    }

    #[test]
    fn test_best_times_in_yard_pool() {
        let mut workout = normalized(
            vec![active(0, 20.0), active(1, 20.0), active(2, 20.0), active(3, 20.0)],
            vec![lap_at(0)],
        );
        workout.session.pool_length = 22.86;
        workout.session.pool_length_unit = PoolUnit::Statute;

        let best = best_times(&workout, &[50, 100]);
        assert_eq!(best.len(), 2);
        assert_eq!(best[1].distance, 100);
        assert_eq!(best[1].last_ordinal, 3);
    }
}
