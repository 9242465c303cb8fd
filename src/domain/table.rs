//! Validated, immutable detection event table
//!
//! Every aggregator reads the same `EventTable`. The table remembers which
//! optional columns the source carried, because an absent column means
//! something different from a column full of "unknown" values.

use crate::domain::error::AnalysisError;
use crate::domain::types::{DetectionEvent, PersonId, ZoneId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which optional columns were present in the source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionalColumns {
    pub event_kind: bool,
    pub gender: bool,
    pub gender_confidence: bool,
    pub age_group: bool,
    pub age_confidence: bool,
}

impl OptionalColumns {
    /// Infer presence from the values carried by the rows themselves
    fn infer(events: &[DetectionEvent]) -> Self {
        let mut columns = Self::default();
        for event in events {
            columns.event_kind |= event.event_kind.is_some();
            columns.gender |= event.gender.is_some();
            columns.gender_confidence |= event.gender_confidence.is_some();
            columns.age_group |= event.age_group.is_some();
            columns.age_confidence |= event.age_confidence.is_some();
        }
        columns
    }

    /// Both demographic attribute columns are available
    #[inline]
    pub fn has_demographics(&self) -> bool {
        self.gender && self.age_group
    }
}

/// Dwell-time reconstruction mode, decided once per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellMode {
    /// At least one exit row exists; pair entries with exits
    EntryExit,
    /// No exit rows; approximate with first/last detection span
    Legacy,
}

impl DwellMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DwellMode::EntryExit => "entry_exit",
            DwellMode::Legacy => "legacy",
        }
    }
}

/// Largest accepted timestamp magnitude, so any two timestamps subtract to a finite value
pub const MAX_TIMESTAMP_SECONDS: f64 = 1e12;

/// Reject values that would surface as non-finite numbers downstream
fn check_event(event: &DetectionEvent) -> Result<(), String> {
    let ts = event.timestamp_seconds;
    if !ts.is_finite() || ts.abs() > MAX_TIMESTAMP_SECONDS {
        return Err(format!("invalid timestamp_seconds value {ts}"));
    }
    for (column, value) in [
        ("gender_confidence", event.gender_confidence),
        ("age_confidence", event.age_confidence),
    ] {
        if let Some(v) = value.filter(|v| !v.is_finite()) {
            return Err(format!("invalid {column} value {v}"));
        }
    }
    Ok(())
}

/// Typed event table consumed by all aggregators
#[derive(Debug, Clone)]
pub struct EventTable {
    events: Vec<DetectionEvent>,
    columns: OptionalColumns,
}

impl EventTable {
    /// Build a table with explicitly declared optional columns.
    ///
    /// Fails with `EmptyDataset` when `events` is empty, and with `Failure`
    /// naming the 1-based row when a timestamp or confidence is not finite
    /// or a timestamp exceeds `MAX_TIMESTAMP_SECONDS`.
    pub fn new(mut events: Vec<DetectionEvent>, columns: OptionalColumns) -> Result<Self, AnalysisError> {
        if events.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }
        for (i, event) in events.iter_mut().enumerate() {
            check_event(event).map_err(|msg| AnalysisError::failure(format!("row {}: {msg}", i + 1)))?;
            // -0.0 shares the 0.0 timeline bucket
            if event.timestamp_seconds == 0.0 {
                event.timestamp_seconds = 0.0;
            }
        }
        Ok(Self { events, columns })
    }

    /// Build a table, inferring optional columns from the row values
    pub fn from_events(events: Vec<DetectionEvent>) -> Result<Self, AnalysisError> {
        let columns = OptionalColumns::infer(&events);
        Self::new(events, columns)
    }

    #[inline]
    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn columns(&self) -> OptionalColumns {
        self.columns
    }

    /// Entry/exit mode if any row anywhere is an exit
    pub fn dwell_mode(&self) -> DwellMode {
        if self.events.iter().any(DetectionEvent::is_exit) {
            DwellMode::EntryExit
        } else {
            DwellMode::Legacy
        }
    }

    pub fn unique_person_count(&self) -> usize {
        self.events.iter().map(|e| e.person_id).collect::<FxHashSet<_>>().len()
    }

    /// Distinct zone ids in natural order
    pub fn zone_ids(&self) -> BTreeSet<ZoneId> {
        self.events.iter().map(|e| e.zone_id).collect()
    }

    /// Events grouped by person, groups in order of first appearance.
    ///
    /// Within a group events are stably sorted by timestamp, so ties keep
    /// their original row order.
    pub fn by_person(&self) -> Vec<(PersonId, Vec<&DetectionEvent>)> {
        let mut slots: FxHashMap<PersonId, usize> = FxHashMap::default();
        let mut groups: Vec<(PersonId, Vec<&DetectionEvent>)> = Vec::new();

        for event in &self.events {
            let idx = *slots.entry(event.person_id).or_insert_with(|| {
                groups.push((event.person_id, Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(event);
        }

        for (_, events) in &mut groups {
            events.sort_by(|a, b| a.timestamp_seconds.total_cmp(&b.timestamp_seconds));
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EventKind;

    #[test]
    fn test_empty_table_rejected() {
        let result = EventTable::from_events(Vec::new());
        assert!(matches!(result, Err(AnalysisError::EmptyDataset)));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let result = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1),
            DetectionEvent::new(f64::NAN, 2, 0, 1),
        ]);
        match result {
            Err(AnalysisError::Failure(msg)) => assert!(msg.starts_with("row 2:"), "{msg}"),
            other => panic!("expected failure, got {other:?}"),
        }

        let result = EventTable::from_events(vec![DetectionEvent::new(f64::INFINITY, 1, 0, 1)]);
        assert!(matches!(result, Err(AnalysisError::Failure(_))));

        let result = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1).with_gender("F", Some(f64::NAN)),
        ]);
        assert!(matches!(result, Err(AnalysisError::Failure(msg)) if msg.contains("gender_confidence")));
    }

    #[test]
    fn test_out_of_range_timestamp_rejected() {
        let result = EventTable::from_events(vec![
            DetectionEvent::new(-1e308, 1, 0, 1),
            DetectionEvent::new(1e308, 2, 0, 1),
        ]);
        assert!(matches!(result, Err(AnalysisError::Failure(msg)) if msg.starts_with("row 1:")));

        let table = EventTable::from_events(vec![
            DetectionEvent::new(-MAX_TIMESTAMP_SECONDS, 1, 0, 1),
            DetectionEvent::new(MAX_TIMESTAMP_SECONDS, 2, 0, 1),
        ]);
        assert!(table.is_ok());
    }

    #[test]
    fn test_negative_zero_timestamp_normalized() {
        let table = EventTable::from_events(vec![
            DetectionEvent::new(-0.0, 1, 0, 1),
            DetectionEvent::new(0.0, 2, 0, 2),
        ])
        .unwrap();
        assert!(table.events().iter().all(|e| e.timestamp_seconds.is_sign_positive()));
    }

    #[test]
    fn test_infer_columns() {
        let events = vec![
            DetectionEvent::new(1.0, 1, 0, 1).with_kind(EventKind::Entry),
            DetectionEvent::new(2.0, 2, 0, 1).with_gender("F", Some(0.9)),
        ];
        let table = EventTable::from_events(events).unwrap();
        let columns = table.columns();
        assert!(columns.event_kind);
        assert!(columns.gender);
        assert!(columns.gender_confidence);
        assert!(!columns.age_group);
        assert!(!columns.has_demographics());
    }

    #[test]
    fn test_dwell_mode() {
        let entries_only = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1).with_kind(EventKind::Entry),
        ])
        .unwrap();
        assert_eq!(entries_only.dwell_mode(), DwellMode::Legacy);

        let with_exit = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1).with_kind(EventKind::Entry),
            DetectionEvent::new(3.0, 3, 0, 1).with_kind(EventKind::Exit),
        ])
        .unwrap();
        assert_eq!(with_exit.dwell_mode(), DwellMode::EntryExit);
    }

    #[test]
    fn test_by_person_stable_sort() {
        let table = EventTable::from_events(vec![
            DetectionEvent::new(5.0, 5, 1, 2),
            DetectionEvent::new(3.0, 3, 0, 1),
            DetectionEvent::new(3.0, 3, 7, 2),
            DetectionEvent::new(3.0, 3, 8, 2),
            DetectionEvent::new(1.0, 1, 0, 1),
        ])
        .unwrap();

        let groups = table.by_person();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, PersonId(2));
        let zones: Vec<i64> = groups[0].1.iter().map(|e| e.zone_id.0).collect();
        assert_eq!(zones, vec![7, 8, 1]);
        let times: Vec<f64> = groups[1].1.iter().map(|e| e.timestamp_seconds).collect();
        assert_eq!(times, vec![1.0, 3.0]);
    }
}
