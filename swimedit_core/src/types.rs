//! Core domain types for the swim workout editor.
//!
//! This module defines the fundamental types used throughout the system:
//! - Segments (pool lengths and rest intervals) and strokes
//! - Laps grouping consecutive segments
//! - The session summary record
//! - The workout snapshot and segment selections
//!
//! Field names on the wire follow the camelCase message fields produced by
//! the FIT decoder. Anything this engine does not interpret is carried in an
//! `extra` map and written back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Metres in 100 yards, used for pace in yard pools
pub const HUNDRED_YARDS_IN_METRES: f64 = 91.44;

pub const YARD_IN_METRES: f64 = 0.9144;

/// Decoders emit `null` for invalid FIT values; treat those as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Stroke Types
// ============================================================================

/// Swim stroke of an active length
///
/// Labels outside the four competitive strokes (drill, im, ...) are kept
/// verbatim so they survive an edit/export cycle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    Other(String),
}

impl Stroke {
    /// Parse one of the four known strokes (case-insensitive)
    pub fn parse_known(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "freestyle" | "free" => Some(Stroke::Freestyle),
            "backstroke" | "back" => Some(Stroke::Backstroke),
            "breaststroke" | "breast" => Some(Stroke::Breaststroke),
            "butterfly" | "fly" => Some(Stroke::Butterfly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Stroke::Freestyle => "freestyle",
            Stroke::Backstroke => "backstroke",
            Stroke::Breaststroke => "breaststroke",
            Stroke::Butterfly => "butterfly",
            Stroke::Other(label) => label,
        }
    }
}

impl From<String> for Stroke {
    fn from(s: String) -> Self {
        Stroke::parse_known(&s).unwrap_or(Stroke::Other(s))
    }
}

impl From<Stroke> for String {
    fn from(stroke: Stroke) -> Self {
        match stroke {
            Stroke::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dominant stroke of a lap
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LapStroke {
    Single(Stroke),
    Mixed,
}

impl From<String> for LapStroke {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("mixed") {
            LapStroke::Mixed
        } else {
            LapStroke::Single(Stroke::from(s))
        }
    }
}

impl From<LapStroke> for String {
    fn from(stroke: LapStroke) -> Self {
        match stroke {
            LapStroke::Single(s) => s.into(),
            LapStroke::Mixed => "mixed".to_string(),
        }
    }
}

impl fmt::Display for LapStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LapStroke::Single(s) => s.fmt(f),
            LapStroke::Mixed => f.write_str("mixed"),
        }
    }
}

// ============================================================================
// Segment Types
// ============================================================================

/// Whether a segment is a swum length or a rest interval
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Active,
    Idle,
}

/// One pool length or rest interval (a `length` message)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    #[serde(rename = "messageIndex", default, deserialize_with = "null_as_default")]
    pub ordinal: u32,
    #[serde(rename = "lengthType")]
    pub kind: SegmentKind,
    #[serde(rename = "swimStroke", default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(rename = "totalElapsedTime", default, deserialize_with = "null_as_default")]
    pub elapsed_time: f64,
    #[serde(rename = "totalTimerTime", default, deserialize_with = "null_as_default")]
    pub timer_time: f64,
    #[serde(rename = "totalStrokes", default, deserialize_with = "null_as_default")]
    pub stroke_count: u32,
    #[serde(rename = "avgSwimmingCadence", default, deserialize_with = "null_as_default")]
    pub cadence: f64,
    #[serde(rename = "totalCalories", default, deserialize_with = "null_as_default")]
    pub calories: f64,
    #[serde(rename = "avgSpeed", default, deserialize_with = "null_as_default")]
    pub avg_speed: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Segment {
    pub fn is_active(&self) -> bool {
        self.kind == SegmentKind::Active
    }

    /// Re-derive speed and cadence for a segment covering one pool length
    pub fn rederive_rates(&mut self, pool_length: f64) {
        if self.timer_time > 0.0 {
            self.avg_speed = pool_length / self.timer_time;
            self.cadence = f64::from(self.stroke_count) / self.timer_time * 60.0;
        } else {
            self.avg_speed = 0.0;
            self.cadence = 0.0;
        }
    }
}

/// Stroke total over `segments`, saturating at `u32::MAX`
pub fn total_strokes<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> u32 {
    segments
        .into_iter()
        .map(|s| s.stroke_count)
        .fold(0, u32::saturating_add)
}

// ============================================================================
// Lap Types
// ============================================================================

/// A device- or user-defined group of consecutive segments (a `lap` message)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lap {
    #[serde(rename = "messageIndex", default, skip_serializing_if = "Option::is_none")]
    pub message_index: Option<u32>,
    #[serde(rename = "firstLengthIndex", default, deserialize_with = "null_as_default")]
    pub first_segment_ordinal: u32,
    #[serde(rename = "numLengths", default, deserialize_with = "null_as_default")]
    pub segment_count: u32,
    #[serde(rename = "numActiveLengths", default, deserialize_with = "null_as_default")]
    pub active_segment_count: u32,
    #[serde(rename = "totalDistance", default, deserialize_with = "null_as_default")]
    pub total_distance: f64,
    #[serde(rename = "totalElapsedTime", default, deserialize_with = "null_as_default")]
    pub total_elapsed_time: f64,
    #[serde(rename = "totalTimerTime", default, deserialize_with = "null_as_default")]
    pub total_timer_time: f64,
    #[serde(rename = "totalStrokes", default, deserialize_with = "null_as_default")]
    pub total_strokes: u32,
    #[serde(rename = "totalCalories", default, deserialize_with = "null_as_default")]
    pub total_calories: f64,
    #[serde(rename = "avgCadence", default, deserialize_with = "null_as_default")]
    pub avg_cadence: f64,
    #[serde(rename = "avgSpeed", default, deserialize_with = "null_as_default")]
    pub avg_speed: f64,
    #[serde(rename = "swimStroke", default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<LapStroke>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Session Types
// ============================================================================

/// Unit the pool length was configured in on the device
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolUnit {
    #[default]
    Metric,
    Statute,
}

impl PoolUnit {
    /// Distance over which pace is expressed, in metres
    pub fn pace_distance(&self) -> f64 {
        match self {
            PoolUnit::Metric => 100.0,
            PoolUnit::Statute => HUNDRED_YARDS_IN_METRES,
        }
    }

    /// Convert a distance in metres into this unit
    pub fn metres_to_unit(&self, metres: f64) -> f64 {
        match self {
            PoolUnit::Metric => metres,
            PoolUnit::Statute => metres / YARD_IN_METRES,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            PoolUnit::Metric => "m",
            PoolUnit::Statute => "yd",
        }
    }
}

/// Workout-level summary record (the `session` message)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_length: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_length_unit: PoolUnit,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_distance: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_elapsed_time: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_timer_time: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_strokes: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_lengths: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_active_lengths: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub num_laps: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_speed: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avg_cadence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Workout Snapshot
// ============================================================================

/// One fully-loaded workout: segments, laps, session and every message array
/// the engine passes through untouched.
///
/// Serializes to and from the decoder's nested message shape via
/// [`crate::codec::WorkoutMessages`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "crate::codec::WorkoutMessages", into = "crate::codec::WorkoutMessages")]
pub struct Workout {
    pub segments: Vec<Segment>,
    pub laps: Vec<Lap>,
    pub session: Session,
    /// Further session messages (multi-session files); never edited
    pub extra_sessions: Vec<Session>,
    /// Message arrays the engine never inspects (records, events, ...)
    pub passthrough: Map<String, Value>,
}

impl Workout {
    pub fn pool_length(&self) -> f64 {
        self.session.pool_length
    }

    /// Position of the segment carrying `ordinal`
    pub fn position_of(&self, ordinal: u32) -> Option<usize> {
        self.segments.iter().position(|s| s.ordinal == ordinal)
    }

    pub fn segment(&self, ordinal: u32) -> Option<&Segment> {
        self.segments.iter().find(|s| s.ordinal == ordinal)
    }

    pub fn active_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_active())
    }

    /// True when every ordinal equals its position
    pub fn is_contiguous(&self) -> bool {
        self.segments
            .iter()
            .enumerate()
            .all(|(i, s)| s.ordinal as usize == i)
    }
}

// ============================================================================
// Selection
// ============================================================================

/// A set of segment ordinals chosen by the caller, iterated in ascending order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeSet<u32>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ordinal: u32) -> bool {
        self.0.contains(&ordinal)
    }

    /// Smallest selected ordinal
    pub fn lowest(&self) -> Option<u32> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u32> for Selection {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Selection(iter.into_iter().collect())
    }
}

impl From<Vec<u32>> for Selection {
    fn from(ordinals: Vec<u32>) -> Self {
        ordinals.into_iter().collect()
    }
}

impl<const N: usize> From<[u32; N]> for Selection {
    fn from(ordinals: [u32; N]) -> Self {
        ordinals.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stroke_roundtrip_keeps_unknown_labels() {
        let stroke: Stroke = serde_json::from_value(json!("drill")).unwrap();
        assert_eq!(stroke, Stroke::Other("drill".into()));
        assert_eq!(serde_json::to_value(&stroke).unwrap(), json!("drill"));

        let stroke: Stroke = serde_json::from_value(json!("Freestyle")).unwrap();
        assert_eq!(stroke, Stroke::Freestyle);
    }

    #[test]
    fn test_lap_stroke_mixed() {
        let stroke: LapStroke = serde_json::from_value(json!("mixed")).unwrap();
        assert_eq!(stroke, LapStroke::Mixed);
        let stroke: LapStroke = serde_json::from_value(json!("butterfly")).unwrap();
        assert_eq!(stroke, LapStroke::Single(Stroke::Butterfly));
    }

    #[test]
    fn test_segment_keeps_unknown_fields() {
        let value = json!({
            "messageIndex": 3,
            "lengthType": "active",
            "swimStroke": "breaststroke",
            "totalElapsedTime": 31.5,
            "totalTimerTime": 31.5,
            "totalStrokes": 14,
            "avgSwimmingCadence": 27,
            "totalCalories": 6,
            "avgSpeed": 0.79,
            "startTime": "2024-05-01T07:12:33.000Z",
            "event": "length"
        });

        let segment: Segment = serde_json::from_value(value).unwrap();
        assert_eq!(segment.ordinal, 3);
        assert_eq!(segment.stroke, Some(Stroke::Breaststroke));
        assert_eq!(segment.extra["event"], json!("length"));

        let back = serde_json::to_value(&segment).unwrap();
        assert_eq!(back["startTime"], json!("2024-05-01T07:12:33.000Z"));
        assert_eq!(back["lengthType"], json!("active"));
    }

    #[test]
    fn test_idle_segment_with_nulls() {
        let value = json!({
            "messageIndex": 4,
            "lengthType": "idle",
            "totalElapsedTime": 20.0,
            "totalTimerTime": 20.0,
            "totalStrokes": null,
            "avgSpeed": null
        });

        let segment: Segment = serde_json::from_value(value).unwrap();
        assert!(!segment.is_active());
        assert_eq!(segment.stroke_count, 0);
        assert_eq!(segment.avg_speed, 0.0);
        assert!(segment.stroke.is_none());
    }

    #[test]
    fn test_selection_is_sorted_and_deduplicated() {
        let selection = Selection::from(vec![5, 1, 3, 1]);
        assert_eq!(selection.len(), 3);
        assert_eq!(selection.lowest(), Some(1));
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_pool_unit_pace_distance() {
        assert_eq!(PoolUnit::Metric.pace_distance(), 100.0);
        assert_eq!(PoolUnit::Statute.pace_distance(), HUNDRED_YARDS_IN_METRES);
    }
}
