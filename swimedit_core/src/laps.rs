//! Lap aggregation.
//!
//! Lap boundaries come from the device; everything else on a lap is
//! re-derived here from the segments in its span:
//! - span of lap *i* is `[first_i, first_{i+1})`, the last lap runs to the end
//! - aggregates cover active segments only
//! - laps left without active segments are dropped

use crate::{total_strokes, Lap, LapStroke, Segment, Stroke, Workout};
use std::collections::BTreeSet;
use std::ops::Range;

/// Ordinal spans of each lap, in lap order
fn spans(laps: &[&Lap], segment_end: u32) -> Vec<Range<u32>> {
    laps.iter()
        .enumerate()
        .map(|(i, lap)| {
            let start = lap.first_segment_ordinal;
            let end = laps
                .get(i + 1)
                .map_or(segment_end, |next| next.first_segment_ordinal);
            start..end.max(start)
        })
        .collect()
}

/// One past the highest ordinal in the store
fn segment_end(segments: &[Segment]) -> u32 {
    segments
        .iter()
        .map(|s| s.ordinal + 1)
        .max()
        .unwrap_or(0)
}

fn members<'a>(segments: &'a [Segment], span: &Range<u32>) -> Vec<&'a Segment> {
    segments
        .iter()
        .filter(|s| span.contains(&s.ordinal))
        .collect()
}

/// Single stroke shared by all given segments, `Mixed` when they differ
pub fn dominant_stroke<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Option<LapStroke> {
    let strokes: BTreeSet<&Stroke> = segments
        .into_iter()
        .filter_map(|s| s.stroke.as_ref())
        .collect();

    match strokes.len() {
        0 => None,
        1 => strokes.into_iter().next().cloned().map(LapStroke::Single),
        _ => Some(LapStroke::Mixed),
    }
}

/// Re-derive one lap from the segments in its span
fn aggregate(lap: &Lap, members: &[&Segment], pool_length: f64) -> Lap {
    let active: Vec<&Segment> = members.iter().copied().filter(|s| s.is_active()).collect();

    let total_timer_time: f64 = active.iter().map(|s| s.timer_time).sum();
    let total_strokes = total_strokes(active.iter().copied());
    let total_distance = active.len() as f64 * pool_length;

    let (avg_speed, avg_cadence) = if total_timer_time > 0.0 {
        (
            total_distance / total_timer_time,
            f64::from(total_strokes) / total_timer_time * 60.0,
        )
    } else {
        (0.0, 0.0)
    };

    Lap {
        message_index: lap.message_index,
        first_segment_ordinal: lap.first_segment_ordinal,
        segment_count: members.len() as u32,
        active_segment_count: active.len() as u32,
        total_distance,
        total_elapsed_time: active.iter().map(|s| s.elapsed_time).sum(),
        total_timer_time,
        total_strokes,
        total_calories: active.iter().map(|s| s.calories).sum(),
        avg_cadence,
        avg_speed,
        stroke: dominant_stroke(active.iter().copied()),
        extra: lap.extra.clone(),
    }
}

/// Recompute every lap from the current segments
///
/// Laps whose own span holds no active segment are dropped first; the
/// remaining laps are then aggregated over their (possibly widened) spans.
/// A widened span only ever gains idle segments, so running this again on
/// its own output yields the same laps.
pub fn recompute(segments: &[Segment], laps: &[Lap], pool_length: f64) -> Vec<Lap> {
    let end = segment_end(segments);
    let all: Vec<&Lap> = laps.iter().collect();

    let survivors: Vec<&Lap> = all
        .iter()
        .zip(spans(&all, end))
        .filter_map(|(lap, span)| {
            let has_active = members(segments, &span).iter().any(|s| s.is_active());
            if !has_active {
                tracing::warn!(
                    "Dropping lap starting at length {}: no active lengths left",
                    lap.first_segment_ordinal
                );
            }
            has_active.then_some(*lap)
        })
        .collect();

    survivors
        .iter()
        .zip(spans(&survivors, end))
        .enumerate()
        .map(|(position, (lap, span))| {
            let mut out = aggregate(lap, &members(segments, &span), pool_length);
            if out.message_index.is_some() {
                out.message_index = Some(position as u32);
            }
            out
        })
        .collect()
}

/// Laps holding active lengths, each with the segments (active and idle) in
/// its span
///
/// Laps without active lengths are left out; their segments fall into the
/// preceding lap.
pub fn lap_members(workout: &Workout) -> Vec<(&Lap, Vec<&Segment>)> {
    let end = segment_end(&workout.segments);
    let all: Vec<&Lap> = workout.laps.iter().collect();

    let kept: Vec<&Lap> = all
        .iter()
        .zip(spans(&all, end))
        .filter(|(_, span)| members(&workout.segments, span).iter().any(|s| s.is_active()))
        .map(|(lap, _)| *lap)
        .collect();

    kept.iter()
        .zip(spans(&kept, end))
        .map(|(lap, span)| (*lap, members(&workout.segments, &span)))
        .collect()
}

/// Recompute the laps of a workout in place
pub fn recompute_workout(workout: &mut Workout) {
    let before = workout.laps.len();
    workout.laps = recompute(&workout.segments, &workout.laps, workout.pool_length());
    tracing::debug!("Recomputed laps: {} -> {}", before, workout.laps.len());
}
