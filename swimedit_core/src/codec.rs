//! Boundary with the external FIT codec.
//!
//! The decoder hands over a nested object of message arrays keyed by message
//! type. This module checks the parts the engine relies on and wraps them in
//! typed records; every other array is carried through opaquely.

use crate::{Error, Result, Session, Workout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Raw message layout as produced/consumed by the codec
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutMessages {
    #[serde(default)]
    pub length_mesgs: Vec<crate::Segment>,
    #[serde(default)]
    pub lap_mesgs: Vec<crate::Lap>,
    #[serde(default)]
    pub session_mesgs: Vec<Session>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TryFrom<WorkoutMessages> for Workout {
    type Error = Error;

    fn try_from(messages: WorkoutMessages) -> Result<Self> {
        let mut sessions = messages.session_mesgs.into_iter();
        let session = sessions
            .next()
            .ok_or_else(|| Error::Codec("workout has no session message".into()))?;

        if !(session.pool_length.is_finite() && session.pool_length > 0.0) {
            return Err(Error::Codec(format!(
                "session pool length must be positive, got {}",
                session.pool_length
            )));
        }

        let extra_sessions: Vec<Session> = sessions.collect();
        if !extra_sessions.is_empty() {
            tracing::warn!(
                "Workout has {} additional session messages; only the first is edited",
                extra_sessions.len()
            );
        }

        Ok(Workout {
            segments: messages.length_mesgs,
            laps: messages.lap_mesgs,
            session,
            extra_sessions,
            passthrough: messages.other,
        })
    }
}

impl From<Workout> for WorkoutMessages {
    fn from(workout: Workout) -> Self {
        let mut session_mesgs = Vec::with_capacity(1 + workout.extra_sessions.len());
        session_mesgs.push(workout.session);
        session_mesgs.extend(workout.extra_sessions);

        WorkoutMessages {
            length_mesgs: workout.segments,
            lap_mesgs: workout.laps,
            session_mesgs,
            other: workout.passthrough,
        }
    }
}

/// Decode a workout from the codec's JSON value
pub fn from_value(value: Value) -> Result<Workout> {
    Ok(serde_json::from_value(value)?)
}

/// Encode a workout back into the codec's JSON shape
pub fn to_value(workout: &Workout) -> Result<Value> {
    Ok(serde_json::to_value(workout)?)
}

/// Read a decoded workout from a JSON file
pub fn read_workout(path: &Path) -> Result<Workout> {
    let contents = std::fs::read_to_string(path)?;
    let workout: Workout = serde_json::from_str(&contents)?;
    tracing::info!(
        "Loaded workout from {:?}: {} lengths, {} laps",
        path,
        workout.segments.len(),
        workout.laps.len()
    );
    Ok(workout)
}

/// Write a workout in the codec's JSON shape
pub fn write_workout(workout: &Workout, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_json::to_string_pretty(workout)?;
    std::fs::write(path, contents)?;
    tracing::info!("Wrote workout to {:?}", path);
    Ok(())
}

/// Reject workouts that are not pool swims
///
/// Sport information is looked up on the session first, then in the
/// `sportMesgs` array. A sport of `swimming` also needs the `lap_swimming`
/// sub-sport. Workouts without any sport information are accepted, since
/// several watches omit it on pool swims.
pub fn ensure_pool_swim(workout: &Workout) -> Result<()> {
    let from_sport_message = workout
        .passthrough
        .get("sportMesgs")
        .and_then(Value::as_array)
        .and_then(|sports| sports.first())
        .and_then(Value::as_object);

    let source = if workout.session.extra.contains_key("sport") {
        Some(&workout.session.extra)
    } else {
        from_sport_message
    };

    let Some(fields) = source else {
        return Ok(());
    };

    let sport = fields.get("sport").and_then(Value::as_str);
    let sub_sport = fields.get("subSport").and_then(Value::as_str);

    match (sport, sub_sport) {
        (Some("swimming"), Some("lap_swimming")) | (None, _) => Ok(()),
        (sport, sub_sport) => Err(Error::Codec(format!(
            "not a pool swimming workout (sport {:?}, sub-sport {:?})",
            sport.unwrap_or("unknown"),
            sub_sport.unwrap_or("unknown")
        ))),
    }
}
