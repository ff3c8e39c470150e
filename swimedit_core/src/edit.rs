//! Edit operations on a workout.
//!
//! Every operation works copy-on-write: it validates the selection against
//! the input snapshot, edits a clone, then renumbers segments and recomputes
//! laps and session before handing the new snapshot back. On error the input
//! is untouched.
//!
//! Whenever a "first" segment must be picked (merge insertion point, stroke
//! inheritance) it is the one with the smallest pre-edit ordinal.

use crate::{laps, renumber, session, total_strokes, Error, Result, Segment, Selection, Stroke, Workout};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const MIN_SPLIT_PARTS: u32 = 2;
pub const MAX_SPLIT_PARTS: u32 = 10;

/// A single edit, as issued by the UI or recorded in the journal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    Merge { selection: Selection },
    Split { selection: Selection, parts: u32 },
    Delete { selection: Selection },
    Reclassify { selection: Selection, stroke: Stroke },
    ChangePoolSize { length: f64 },
}

impl Edit {
    /// Apply this edit to `workout`, returning the new snapshot
    pub fn apply(&self, workout: &Workout) -> Result<Workout> {
        match self {
            Edit::Merge { selection } => merge(workout, selection),
            Edit::Split { selection, parts } => split(workout, selection, *parts),
            Edit::Delete { selection } => delete(workout, selection),
            Edit::Reclassify { selection, stroke } => reclassify(workout, selection, stroke),
            Edit::ChangePoolSize { length } => change_pool_size(workout, *length),
        }
    }
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |s: &Selection| s.iter().map(|o| o.to_string()).collect::<Vec<_>>().join(", ");
        match self {
            Edit::Merge { selection } => write!(f, "merge lengths [{}]", list(selection)),
            Edit::Split { selection, parts } => {
                write!(f, "split length [{}] into {} parts", list(selection), parts)
            }
            Edit::Delete { selection } => write!(f, "delete lengths [{}]", list(selection)),
            Edit::Reclassify { selection, stroke } => {
                write!(f, "set stroke of lengths [{}] to {}", list(selection), stroke)
            }
            Edit::ChangePoolSize { length } => write!(f, "change pool length to {}", length),
        }
    }
}

/// Renumber, then recompute laps and session
fn finalize(mut workout: Workout) -> Workout {
    renumber::renumber(&mut workout);
    laps::recompute_workout(&mut workout);
    session::recompute_workout(&mut workout);
    workout
}

/// Store positions of the selected ordinals, in ascending ordinal order
fn positions(workout: &Workout, selection: &Selection) -> Result<Vec<usize>> {
    selection
        .iter()
        .map(|ordinal| {
            workout
                .position_of(ordinal)
                .ok_or(Error::ReferenceNotFound(ordinal))
        })
        .collect()
}

fn require_active(workout: &Workout, positions: &[usize], action: &str) -> Result<()> {
    match positions.iter().map(|&p| &workout.segments[p]).find(|s| !s.is_active()) {
        Some(rest) => Err(Error::InvalidSelection(format!(
            "length {} is a rest interval and cannot be {}",
            rest.ordinal, action
        ))),
        None => Ok(()),
    }
}

/// Merge two or more active segments into one
///
/// Additive fields are summed; speed and cadence are re-derived from the
/// summed timer time rather than averaged. Stroke and pass-through fields
/// come from the lowest-ordinal input, except the end `timestamp`, which is
/// taken from the last input.
pub fn merge(workout: &Workout, selection: &Selection) -> Result<Workout> {
    if selection.len() < 2 {
        return Err(Error::InsufficientSelection {
            required: 2,
            given: selection.len(),
        });
    }

    let positions = positions(workout, selection)?;
    require_active(workout, &positions, "merged")?;

    let inputs: Vec<&Segment> = positions.iter().map(|&p| &workout.segments[p]).collect();
    let anchor = positions[0];

    let mut merged = inputs[0].clone();
    merged.elapsed_time = inputs.iter().map(|s| s.elapsed_time).sum();
    merged.timer_time = inputs.iter().map(|s| s.timer_time).sum();
    merged.stroke_count = total_strokes(inputs.iter().copied());
    merged.calories = inputs.iter().map(|s| s.calories).sum();
    merged.rederive_rates(workout.pool_length());
    if let Some(end) = inputs.last().and_then(|s| s.extra.get("timestamp")) {
        merged.extra.insert("timestamp".into(), end.clone());
    }

    let removed: HashSet<usize> = positions[1..].iter().copied().collect();
    let mut next = workout.clone();
    next.segments = workout
        .segments
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(i, s)| if i == anchor { merged.clone() } else { s.clone() })
        .collect();

    tracing::info!("Merged {} lengths into length {}", selection.len(), inputs[0].ordinal);
    Ok(finalize(next))
}

/// Split one active segment into `parts` equal segments
///
/// Times and calories are divided evenly; stroke counts are floored, so up
/// to `parts - 1` strokes can be lost.
pub fn split(workout: &Workout, selection: &Selection, parts: u32) -> Result<Workout> {
    let ordinal = match (selection.len(), selection.lowest()) {
        (1, Some(ordinal)) => ordinal,
        (n, _) => {
            return Err(Error::InvalidSelection(format!(
                "select exactly one length to split (got {})",
                n
            )))
        }
    };

    if !(MIN_SPLIT_PARTS..=MAX_SPLIT_PARTS).contains(&parts) {
        return Err(Error::InvalidPartCount(parts));
    }

    let position = workout
        .position_of(ordinal)
        .ok_or(Error::ReferenceNotFound(ordinal))?;
    require_active(workout, &[position], "split")?;

    let original = &workout.segments[position];
    let divisor = f64::from(parts);

    let mut part = original.clone();
    part.elapsed_time = original.elapsed_time / divisor;
    part.timer_time = original.timer_time / divisor;
    part.calories = original.calories / divisor;
    part.stroke_count = original.stroke_count / parts;
    part.rederive_rates(workout.pool_length());

    let mut next = workout.clone();
    next.segments
        .splice(position..=position, std::iter::repeat(part).take(parts as usize));

    tracing::info!("Split length {} into {} parts", ordinal, parts);
    Ok(finalize(next))
}

/// Remove the selected segments, active or idle
pub fn delete(workout: &Workout, selection: &Selection) -> Result<Workout> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }

    let removed: HashSet<usize> = positions(workout, selection)?.into_iter().collect();

    let mut next = workout.clone();
    next.segments = workout
        .segments
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, s)| s.clone())
        .collect();

    tracing::info!("Deleted {} lengths", removed.len());
    Ok(finalize(next))
}

/// Change the stroke of the selected active segments
pub fn reclassify(workout: &Workout, selection: &Selection, stroke: &Stroke) -> Result<Workout> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }

    let positions = positions(workout, selection)?;
    require_active(workout, &positions, "reclassified")?;

    let mut next = workout.clone();
    for &p in &positions {
        next.segments[p].stroke = Some(stroke.clone());
    }

    tracing::info!("Set stroke of {} lengths to {}", positions.len(), stroke);
    Ok(finalize(next))
}

/// Change the pool length and re-derive every distance-dependent field
pub fn change_pool_size(workout: &Workout, length: f64) -> Result<Workout> {
    if !(length.is_finite() && length > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "pool length must be positive, got {}",
            length
        )));
    }

    let mut next = workout.clone();
    next.session.pool_length = length;
    for segment in next.segments.iter_mut().filter(|s| s.is_active()) {
        segment.avg_speed = if segment.timer_time > 0.0 {
            length / segment.timer_time
        } else {
            0.0
        };
    }

    tracing::info!(
        "Changed pool length from {} to {}",
        workout.pool_length(),
        length
    );
    Ok(finalize(next))
}
