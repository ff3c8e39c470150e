//! Consistency checks on a workout snapshot.

use crate::{laps, session, Workout};

const TOLERANCE: f64 = 1e-6;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Check that a snapshot is internally consistent
///
/// Returns a list of problems; empty means ordinals are contiguous and every
/// lap and the session equal their recomputation from the segments.
pub fn validate(workout: &Workout) -> Vec<String> {
    let mut errors = Vec::new();

    for (position, segment) in workout.segments.iter().enumerate() {
        if segment.ordinal as usize != position {
            errors.push(format!(
                "Length at position {} has ordinal {}",
                position, segment.ordinal
            ));
        }
    }

    let pool_length = workout.pool_length();
    if !(pool_length.is_finite() && pool_length > 0.0) {
        errors.push(format!("Pool length {} is not positive", pool_length));
    }

    let expected_laps = laps::recompute(&workout.segments, &workout.laps, pool_length);
    if expected_laps.len() != workout.laps.len() {
        errors.push(format!(
            "Workout has {} laps but {} survive recomputation",
            workout.laps.len(),
            expected_laps.len()
        ));
    } else {
        for (i, (lap, expected)) in workout.laps.iter().zip(&expected_laps).enumerate() {
            let counts_match = lap.first_segment_ordinal == expected.first_segment_ordinal
                && lap.segment_count == expected.segment_count
                && lap.active_segment_count == expected.active_segment_count
                && lap.total_strokes == expected.total_strokes
                && lap.stroke == expected.stroke;
            let sums_match = close(lap.total_distance, expected.total_distance)
                && close(lap.total_elapsed_time, expected.total_elapsed_time)
                && close(lap.total_timer_time, expected.total_timer_time)
                && close(lap.total_calories, expected.total_calories)
                && close(lap.avg_speed, expected.avg_speed)
                && close(lap.avg_cadence, expected.avg_cadence);
            if !(counts_match && sums_match) {
                errors.push(format!("Lap {} differs from its recomputation", i));
            }
        }
    }

    let expected = session::recompute(&workout.segments, &workout.laps, &workout.session);
    let s = &workout.session;
    if s.num_lengths != expected.num_lengths
        || s.num_active_lengths != expected.num_active_lengths
        || s.num_laps != expected.num_laps
        || s.total_strokes != expected.total_strokes
        || !close(s.total_distance, expected.total_distance)
        || !close(s.total_elapsed_time, expected.total_elapsed_time)
        || !close(s.total_timer_time, expected.total_timer_time)
        || !close(s.avg_speed, expected.avg_speed)
        || !close(s.avg_cadence, expected.avg_cadence)
    {
        errors.push("Session totals differ from their recomputation".into());
    }

    errors
}
