//! Session metadata recomputation.
//!
//! Workout-level totals are always re-derived from the full segment store;
//! nothing here is updated incrementally.

use crate::{Lap, PoolUnit, Segment, Session, Workout};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

struct Totals {
    active_count: u32,
    active_time: f64,
    active_timer_time: f64,
    rest_time: f64,
    timer_time: f64,
    strokes: u32,
}

fn totals(segments: &[Segment]) -> Totals {
    let mut totals = Totals {
        active_count: 0,
        active_time: 0.0,
        active_timer_time: 0.0,
        rest_time: 0.0,
        timer_time: 0.0,
        strokes: 0,
    };

    for segment in segments {
        totals.timer_time += segment.timer_time;
        if segment.is_active() {
            totals.active_count += 1;
            totals.active_time += segment.elapsed_time;
            totals.active_timer_time += segment.timer_time;
            totals.strokes = totals.strokes.saturating_add(segment.stroke_count);
        } else {
            totals.rest_time += segment.elapsed_time;
        }
    }

    totals
}

/// Recompute the session record from segments and laps
pub fn recompute(segments: &[Segment], laps: &[Lap], session: &Session) -> Session {
    let t = totals(segments);
    let total_distance = f64::from(t.active_count) * session.pool_length;

    let mut out = session.clone();
    out.total_distance = total_distance;
    out.total_elapsed_time = t.active_time + t.rest_time;
    out.total_timer_time = t.timer_time;
    out.total_strokes = t.strokes;
    out.num_lengths = segments.len() as u32;
    out.num_active_lengths = t.active_count;
    out.num_laps = laps.len() as u32;
    out.avg_speed = if t.active_time > 0.0 {
        total_distance / t.active_time
    } else {
        0.0
    };
    out.avg_cadence = if t.active_timer_time > 0.0 {
        f64::from(t.strokes) / t.active_timer_time * 60.0
    } else {
        0.0
    };
    out
}

/// Recompute the session of a workout in place
pub fn recompute_workout(workout: &mut Workout) {
    workout.session = recompute(&workout.segments, &workout.laps, &workout.session);
}

/// Display metadata for a workout
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionSummary {
    pub pool_length: f64,
    pub unit: PoolUnit,
    pub timestamp: Option<DateTime<Utc>>,
    pub active_lengths: u32,
    /// Metres
    pub total_distance: f64,
    pub active_time: f64,
    pub rest_time: f64,
    pub total_time: f64,
    /// Metres per second over active time
    pub avg_speed: f64,
    /// Seconds per 100 m (metric) or per 100 yd (statute)
    pub pace_per_100: Option<f64>,
    pub avg_strokes_per_length: u32,
    pub avg_cadence: f64,
    pub avg_heart_rate: Option<f64>,
    pub total_calories: Option<f64>,
}

impl SessionSummary {
    pub fn compute(segments: &[Segment], session: &Session) -> Self {
        let t = totals(segments);
        let total_distance = f64::from(t.active_count) * session.pool_length;
        let avg_speed = if t.active_time > 0.0 {
            total_distance / t.active_time
        } else {
            0.0
        };
        let pace_per_100 =
            (avg_speed > 0.0).then(|| session.pool_length_unit.pace_distance() / avg_speed);
        let avg_strokes_per_length = t.strokes.checked_div(t.active_count).unwrap_or(0);
        let avg_cadence = if t.active_timer_time > 0.0 {
            f64::from(t.strokes) / t.active_timer_time * 60.0
        } else {
            0.0
        };

        SessionSummary {
            pool_length: session.pool_length,
            unit: session.pool_length_unit,
            timestamp: session.timestamp,
            active_lengths: t.active_count,
            total_distance,
            active_time: t.active_time,
            rest_time: t.rest_time,
            total_time: t.active_time + t.rest_time,
            avg_speed,
            pace_per_100,
            avg_strokes_per_length,
            avg_cadence,
            avg_heart_rate: session.extra.get("avgHeartRate").and_then(Value::as_f64),
            total_calories: session.extra.get("totalCalories").and_then(Value::as_f64),
        }
    }

    pub fn from_workout(workout: &Workout) -> Self {
        Self::compute(&workout.segments, &workout.session)
    }

    /// Distance expressed in the pool's own unit (metres or yards)
    pub fn distance_in_pool_units(&self) -> f64 {
        self.unit.metres_to_unit(self.total_distance)
    }

    /// Pool length expressed in the pool's own unit
    pub fn pool_length_in_pool_units(&self) -> f64 {
        self.unit.metres_to_unit(self.pool_length)
    }
}
