//! Index allocation for segments.
//!
//! Segment identity is position: after every structural edit each segment's
//! ordinal is rewritten to its zero-based index, and lap back-references are
//! rebound through the old → new mapping.

use crate::{Lap, Segment, Workout};
use std::collections::BTreeMap;

/// Old ordinal → new ordinals produced by one renumbering pass
///
/// An old ordinal maps to several new ordinals after a split, and is absent
/// when its segment was deleted or merged away.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenumberMap {
    mapping: BTreeMap<u32, Vec<u32>>,
    len: u32,
}

impl RenumberMap {
    /// New ordinals now carried by the segment(s) that had `old`
    pub fn get(&self, old: u32) -> Option<&[u32]> {
        self.mapping.get(&old).map(Vec::as_slice)
    }

    /// Resolve a back-reference to `old`
    ///
    /// Prefers the smallest new ordinal of `old` itself; if `old` no longer
    /// exists, falls back to the nearest surviving successor. `None` means
    /// nothing at or after `old` survived.
    pub fn resolve(&self, old: u32) -> Option<u32> {
        self.mapping
            .range(old..)
            .next()
            .and_then(|(_, news)| news.first().copied())
    }

    /// Number of segments after the pass
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when no ordinal changed
    pub fn is_identity(&self) -> bool {
        self.mapping
            .iter()
            .all(|(old, news)| news.len() == 1 && news[0] == *old)
    }
}

/// Rewrite every segment ordinal to its position
pub fn renumber_segments(segments: &mut [Segment]) -> RenumberMap {
    let mut mapping: BTreeMap<u32, Vec<u32>> = BTreeMap::new();

    for (position, segment) in segments.iter_mut().enumerate() {
        let new = position as u32;
        mapping.entry(segment.ordinal).or_default().push(new);
        segment.ordinal = new;
    }

    RenumberMap {
        mapping,
        len: segments.len() as u32,
    }
}

/// Rebind lap start references after a renumbering pass
///
/// A lap whose start (and everything after it) vanished is pointed one past
/// the end of the store, leaving it an empty span for the lap aggregator to
/// drop.
pub fn rebind_laps(laps: &mut [Lap], map: &RenumberMap) {
    for lap in laps.iter_mut() {
        let old = lap.first_segment_ordinal;
        match map.resolve(old) {
            Some(new) => lap.first_segment_ordinal = new,
            None => {
                tracing::debug!("Lap starting at length {} lost all its lengths", old);
                lap.first_segment_ordinal = map.len();
            }
        }
    }
}

/// Renumber a workout's segments in place and rebind its laps
pub fn renumber(workout: &mut Workout) -> RenumberMap {
    let map = renumber_segments(&mut workout.segments);
    rebind_laps(&mut workout.laps, &map);

    if !map.is_identity() {
        tracing::debug!("Renumbered {} lengths", map.len());
    }

    map
}
