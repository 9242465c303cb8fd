//! Dwell-time engine
//!
//! Reconstructs per-person, per-zone visits and aggregates their durations.
//!
//! Two modes, chosen once per table:
//! - Entry/exit: if any row is an exit, each entry is paired with the
//!   earliest unused exit strictly after it (greedy, single pass). Entries
//!   with no later exit are dropped; surplus exits are ignored.
//! - Detection span: with no exits anywhere, each (person, zone) pair with
//!   at least two rows contributes `max(ts) - min(ts)` as one stay.

use crate::domain::{DwellMode, EventKind, EventTable, PersonId, Visit, ZoneId, ZoneLabel};
use crate::services::stats;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Note attached to results computed without exit events
pub const DETECTION_SPAN_NOTE: &str =
    "No exit events in dataset; dwell time approximated from first/last detection per person and zone (lower fidelity)";

/// Histogram bucket labels, in bucket order
pub const HISTOGRAM_LABELS: [&str; 4] = ["<10s", "10-30s", "30-60s", ">=60s"];

/// Lower bounds (seconds) of the histogram buckets after the first
const HISTOGRAM_BOUNDS: [f64; 3] = [10.0, 30.0, 60.0];

/// How stays were reconstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellMethod {
    EntryExit,
    DetectionSpan,
}

impl From<DwellMode> for DwellMethod {
    fn from(mode: DwellMode) -> Self {
        match mode {
            DwellMode::EntryExit => DwellMethod::EntryExit,
            DwellMode::Legacy => DwellMethod::DetectionSpan,
        }
    }
}

/// Output of visit reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct VisitReconstruction {
    pub method: DwellMethod,
    /// Visits in person first-appearance order, then zone id, then entry time.
    /// In detection-span mode each visit spans the first to last detection.
    pub visits: Vec<Visit>,
    pub unmatched_entries: usize,
    pub unmatched_exits: usize,
}

/// Result of greedy entry/exit pairing for one person-zone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing {
    pub pairs: Vec<(f64, f64)>,
    pub unmatched_entries: usize,
    pub unmatched_exits: usize,
}

/// Pair ascending `entries` with ascending `exits`.
///
/// Each entry takes the earliest exit strictly after it that no earlier entry
/// has consumed. Exits passed over are at or before the current entry and so
/// can never match a later (larger) entry either.
pub fn pair_entries_with_exits(entries: &[f64], exits: &[f64]) -> Pairing {
    let mut pairing = Pairing::default();
    let mut next_exit = 0;

    for &entry in entries {
        while next_exit < exits.len() && exits[next_exit] <= entry {
            pairing.unmatched_exits += 1;
            next_exit += 1;
        }
        match exits.get(next_exit) {
            Some(&exit) => {
                pairing.pairs.push((entry, exit));
                next_exit += 1;
            }
            None => pairing.unmatched_entries += 1,
        }
    }
    pairing.unmatched_exits += exits.len() - next_exit;
    pairing
}

type Stamps = SmallVec<[f64; 8]>;

/// Reconstruct visits for the whole table
pub fn reconstruct_visits(table: &EventTable) -> VisitReconstruction {
    let method = DwellMethod::from(table.dwell_mode());
    let mut reconstruction =
        VisitReconstruction { method, visits: Vec::new(), unmatched_entries: 0, unmatched_exits: 0 };

    for (person_id, events) in table.by_person() {
        // Events are already time-ordered, so every list below is ascending
        let mut per_zone: BTreeMap<ZoneId, (Stamps, Stamps)> = BTreeMap::new();
        for event in &events {
            let (entries, exits) = per_zone.entry(event.zone_id).or_default();
            match (method, event.event_kind) {
                (DwellMethod::EntryExit, Some(EventKind::Entry)) => entries.push(event.timestamp_seconds),
                (DwellMethod::EntryExit, Some(EventKind::Exit)) => exits.push(event.timestamp_seconds),
                (DwellMethod::EntryExit, None) => {}
                // Detection span keeps every row's timestamp
                (DwellMethod::DetectionSpan, _) => entries.push(event.timestamp_seconds),
            }
        }

        for (zone_id, (entries, exits)) in per_zone {
            match method {
                DwellMethod::EntryExit => {
                    let pairing = pair_entries_with_exits(&entries, &exits);
                    reconstruction.unmatched_entries += pairing.unmatched_entries;
                    reconstruction.unmatched_exits += pairing.unmatched_exits;
                    reconstruction.visits.extend(pairing.pairs.into_iter().map(
                        |(entry_time, exit_time)| Visit { person_id, zone_id, entry_time, exit_time },
                    ));
                }
                DwellMethod::DetectionSpan => {
                    if entries.len() < 2 {
                        continue;
                    }
                    reconstruction.visits.push(Visit {
                        person_id,
                        zone_id,
                        entry_time: stats::min(&entries),
                        exit_time: stats::max(&entries),
                    });
                }
            }
        }
    }

    debug!(
        method = ?reconstruction.method,
        visits = reconstruction.visits.len(),
        unmatched_entries = reconstruction.unmatched_entries,
        unmatched_exits = reconstruction.unmatched_exits,
        "visits_reconstructed"
    );

    reconstruction
}

/// Dwell statistics for one zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDwellStats {
    pub dwell_times: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    pub count: usize,
    pub max: f64,
    pub min: f64,
    /// Only reported in entry/exit mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

/// Dwell statistics for one person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonDwellStats {
    pub total_dwell_time: f64,
    pub mean_dwell_time: f64,
    pub visit_count: usize,
    pub max: f64,
    pub min: f64,
}

/// Fixed four-bucket histogram of dwell durations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DwellHistogram {
    #[serde(rename = "<10s")]
    pub under_10s: usize,
    #[serde(rename = "10-30s")]
    pub from_10_to_30s: usize,
    #[serde(rename = "30-60s")]
    pub from_30_to_60s: usize,
    #[serde(rename = ">=60s")]
    pub over_60s: usize,
}

impl DwellHistogram {
    /// Bucket index for a dwell value; buckets are `[0,10)`, `[10,30)`,
    /// `[30,60)` and `[60,inf)`
    #[inline]
    pub fn bucket_index(dwell: f64) -> usize {
        HISTOGRAM_BOUNDS.partition_point(|&bound| bound <= dwell)
    }

    pub fn record(&mut self, dwell: f64) {
        match Self::bucket_index(dwell) {
            0 => self.under_10s += 1,
            1 => self.from_10_to_30s += 1,
            2 => self.from_30_to_60s += 1,
            _ => self.over_60s += 1,
        }
    }

    /// Counts in bucket order, matching `HISTOGRAM_LABELS`
    pub fn counts(&self) -> [usize; 4] {
        [self.under_10s, self.from_10_to_30s, self.from_30_to_60s, self.over_60s]
    }

    pub fn total(&self) -> usize {
        self.counts().iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellSummary {
    pub mean: f64,
    pub median: f64,
    pub total_visits: usize,
    pub longest_stay: f64,
    pub shortest_stay: f64,
    pub histogram: DwellHistogram,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DwellTimeAnalysis {
    pub method: DwellMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub total_visits: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched_entries: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmatched_exits: Option<usize>,
    pub zone_dwell_times: BTreeMap<ZoneLabel, ZoneDwellStats>,
    pub person_dwell_times: BTreeMap<PersonId, PersonDwellStats>,
    pub summary: DwellSummary,
}

/// Aggregate reconstructed visits into zone, person and global statistics
pub fn summarize_visits(reconstruction: &VisitReconstruction) -> DwellTimeAnalysis {
    let entry_exit = reconstruction.method == DwellMethod::EntryExit;

    let mut by_zone: BTreeMap<ZoneId, Vec<f64>> = BTreeMap::new();
    let mut by_person: BTreeMap<PersonId, Vec<f64>> = BTreeMap::new();
    let mut all = Vec::with_capacity(reconstruction.visits.len());
    let mut histogram = DwellHistogram::default();

    for visit in &reconstruction.visits {
        let dwell = stats::finite(visit.dwell());
        by_zone.entry(visit.zone_id).or_default().push(dwell);
        by_person.entry(visit.person_id).or_default().push(dwell);
        histogram.record(dwell);
        all.push(dwell);
    }

    let zone_dwell_times = by_zone
        .into_iter()
        .map(|(zone, dwells)| {
            let zone_stats = ZoneDwellStats {
                mean: stats::mean(&dwells),
                median: stats::median(&dwells),
                count: dwells.len(),
                max: stats::max(&dwells),
                min: stats::min(&dwells),
                std: entry_exit.then(|| stats::std_dev(&dwells)),
                dwell_times: dwells,
            };
            (zone.label(), zone_stats)
        })
        .collect();

    let person_dwell_times = by_person
        .into_iter()
        .map(|(person, dwells)| {
            let person_stats = PersonDwellStats {
                total_dwell_time: stats::finite(dwells.iter().sum()),
                mean_dwell_time: stats::mean(&dwells),
                visit_count: dwells.len(),
                max: stats::max(&dwells),
                min: stats::min(&dwells),
            };
            (person, person_stats)
        })
        .collect();

    let summary = DwellSummary {
        mean: stats::mean(&all),
        median: stats::median(&all),
        total_visits: all.len(),
        longest_stay: stats::max(&all),
        shortest_stay: stats::min(&all),
        histogram,
    };

    DwellTimeAnalysis {
        method: reconstruction.method,
        note: (!entry_exit).then(|| DETECTION_SPAN_NOTE.to_string()),
        total_visits: all.len(),
        unmatched_entries: entry_exit.then_some(reconstruction.unmatched_entries),
        unmatched_exits: entry_exit.then_some(reconstruction.unmatched_exits),
        zone_dwell_times,
        person_dwell_times,
        summary,
    }
}

/// Reconstruct visits and aggregate dwell statistics
pub fn analyze_dwell_times(table: &EventTable) -> DwellTimeAnalysis {
    summarize_visits(&reconstruct_visits(table))
}
