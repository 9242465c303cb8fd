//! Per-zone activity: counts, distinct persons, activity window and timeline

use crate::domain::{EventTable, PersonId, Timestamp, ZoneId, ZoneLabel};
use crate::services::stats;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeMap;

/// Activity statistics for a single zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStats {
    /// Number of event rows recorded in the zone
    pub total_entries: usize,
    pub unique_persons: usize,
    pub first_detection: f64,
    pub last_detection: f64,
    pub activity_duration: f64,
    /// Frame with the most events in the zone (lowest frame on ties)
    pub peak_frame: i64,
    /// Event count per distinct timestamp
    pub entries_timeline: BTreeMap<Timestamp, usize>,
}

/// Running accumulator while scanning the table
struct ZoneAccumulator {
    total: usize,
    persons: FxHashSet<PersonId>,
    first: f64,
    last: f64,
    frames: FxHashMap<i64, usize>,
    timeline: BTreeMap<Timestamp, usize>,
}

impl ZoneAccumulator {
    fn new(ts: f64) -> Self {
        Self {
            total: 0,
            persons: FxHashSet::default(),
            first: ts,
            last: ts,
            frames: FxHashMap::default(),
            timeline: BTreeMap::new(),
        }
    }

    fn finish(self) -> ZoneStats {
        let peak_frame = self
            .frames
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(&frame, _)| frame)
            .unwrap_or(0);

        ZoneStats {
            total_entries: self.total,
            unique_persons: self.persons.len(),
            first_detection: self.first,
            last_detection: self.last,
            activity_duration: stats::finite(self.last - self.first),
            peak_frame,
            entries_timeline: self.timeline,
        }
    }
}

/// Aggregate activity for every zone observed in the table
pub fn analyze_zones(table: &EventTable) -> BTreeMap<ZoneLabel, ZoneStats> {
    let mut zones: BTreeMap<ZoneId, ZoneAccumulator> = BTreeMap::new();

    for event in table.events() {
        let ts = event.timestamp_seconds;
        let acc = zones.entry(event.zone_id).or_insert_with(|| ZoneAccumulator::new(ts));
        acc.total += 1;
        acc.persons.insert(event.person_id);
        acc.first = acc.first.min(ts);
        acc.last = acc.last.max(ts);
        *acc.frames.entry(event.frame).or_insert(0) += 1;
        *acc.timeline.entry(Timestamp(ts)).or_insert(0) += 1;
    }

    zones.into_iter().map(|(zone, acc)| (zone.label(), acc.finish())).collect()
}
