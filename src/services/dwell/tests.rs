//! Tests for the dwell-time engine

use super::*;
use crate::domain::{DetectionEvent, EventKind};

/// Builder for person-zone event sequences
struct EventsBuilder {
    events: Vec<DetectionEvent>,
    frame: i64,
}

impl EventsBuilder {
    fn new() -> Self {
        Self { events: Vec::new(), frame: 0 }
    }

    fn push(mut self, ts: f64, zone: i64, person: i64, kind: Option<EventKind>) -> Self {
        self.frame += 1;
        let mut event = DetectionEvent::new(ts, self.frame, zone, person);
        event.event_kind = kind;
        self.events.push(event);
        self
    }

    fn entry(self, ts: f64, zone: i64, person: i64) -> Self {
        self.push(ts, zone, person, Some(EventKind::Entry))
    }

    fn exit(self, ts: f64, zone: i64, person: i64) -> Self {
        self.push(ts, zone, person, Some(EventKind::Exit))
    }

    fn detection(self, ts: f64, zone: i64, person: i64) -> Self {
        self.push(ts, zone, person, None)
    }

    fn build(self) -> EventTable {
        EventTable::from_events(self.events).unwrap()
    }
}

fn spans(reconstruction: &VisitReconstruction) -> Vec<(f64, f64)> {
    reconstruction.visits.iter().map(|v| (v.entry_time, v.exit_time)).collect()
}

#[test]
fn test_pairing_takes_earliest_later_exit() {
    let pairing = pair_entries_with_exits(&[5.0, 12.0], &[9.0, 20.0, 30.0]);
    assert_eq!(pairing.pairs, vec![(5.0, 9.0), (12.0, 20.0)]);
    assert_eq!(pairing.unmatched_entries, 0);
    assert_eq!(pairing.unmatched_exits, 1);
}

#[test]
fn test_pairing_exit_must_be_strictly_later() {
    let pairing = pair_entries_with_exits(&[5.0], &[5.0, 8.0]);
    assert_eq!(pairing.pairs, vec![(5.0, 8.0)]);
    assert_eq!(pairing.unmatched_exits, 1);
}

#[test]
fn test_pairing_drops_unterminated_entry() {
    let pairing = pair_entries_with_exits(&[1.0, 10.0], &[4.0]);
    assert_eq!(pairing.pairs, vec![(1.0, 4.0)]);
    assert_eq!(pairing.unmatched_entries, 1);
}

#[test]
fn test_pairing_exit_never_reused() {
    // Both entries precede the only exit; only the first gets it
    let pairing = pair_entries_with_exits(&[1.0, 2.0], &[3.0]);
    assert_eq!(pairing.pairs, vec![(1.0, 3.0)]);
    assert_eq!(pairing.unmatched_entries, 1);
}

#[test]
fn test_reconstruct_reference_sequence() {
    let table = EventsBuilder::new()
        .entry(5.0, 0, 1)
        .exit(9.0, 0, 1)
        .entry(12.0, 0, 1)
        .exit(20.0, 0, 1)
        .exit(30.0, 0, 1)
        .build();

    let reconstruction = reconstruct_visits(&table);
    assert_eq!(reconstruction.method, DwellMethod::EntryExit);
    assert_eq!(spans(&reconstruction), vec![(5.0, 9.0), (12.0, 20.0)]);
    assert_eq!(reconstruction.unmatched_exits, 1);

    // Deterministic across runs
    assert_eq!(reconstruct_visits(&table), reconstruction);
    assert_eq!(analyze_dwell_times(&table), analyze_dwell_times(&table));
}

#[test]
fn test_reconstruct_keeps_zones_and_persons_apart() {
    let table = EventsBuilder::new()
        .entry(1.0, 0, 1)
        .entry(2.0, 1, 1)
        .exit(3.0, 1, 1)
        .exit(4.0, 0, 2)
        .exit(6.0, 0, 1)
        .build();

    let reconstruction = reconstruct_visits(&table);
    let visits: Vec<(i64, i64, f64)> =
        reconstruction.visits.iter().map(|v| (v.person_id.0, v.zone_id.0, v.dwell())).collect();
    assert_eq!(visits, vec![(1, 0, 5.0), (1, 1, 1.0)]);
    assert_eq!(reconstruction.unmatched_exits, 1);
}

#[test]
fn test_entry_without_exit_is_dropped() {
    let table = EventsBuilder::new().entry(1.0, 0, 1).exit(2.0, 0, 1).entry(5.0, 3, 1).build();

    let analysis = analyze_dwell_times(&table);
    assert_eq!(analysis.total_visits, 1);
    assert_eq!(analysis.unmatched_entries, Some(1));
    assert!(!analysis.zone_dwell_times.contains_key(&ZoneId(3).label()));
}

#[test]
fn test_rows_without_kind_ignored_in_entry_exit_mode() {
    let table = EventsBuilder::new()
        .entry(1.0, 0, 1)
        .detection(2.0, 0, 1)
        .exit(4.0, 0, 1)
        .build();

    assert_eq!(spans(&reconstruct_visits(&table)), vec![(1.0, 4.0)]);
}

#[test]
fn test_detection_span_fallback() {
    let table = EventsBuilder::new()
        .detection(1.0, 2, 7)
        .detection(1.0, 2, 7)
        .detection(4.5, 2, 7)
        .detection(3.0, 1, 8)
        .build();

    let analysis = analyze_dwell_times(&table);
    assert_eq!(analysis.method, DwellMethod::DetectionSpan);
    assert_eq!(analysis.note.as_deref(), Some(DETECTION_SPAN_NOTE));
    assert_eq!(analysis.total_visits, 1);
    assert_eq!(analysis.person_dwell_times[&PersonId(7)].total_dwell_time, 3.5);
    assert!(!analysis.person_dwell_times.contains_key(&PersonId(8)));

    let zone = &analysis.zone_dwell_times[&ZoneId(2).label()];
    assert_eq!(zone.dwell_times, vec![3.5]);
    assert!(zone.std.is_none());
    assert!(analysis.unmatched_entries.is_none());
}

#[test]
fn test_entries_only_table_uses_detection_span() {
    let table = EventsBuilder::new().entry(1.0, 0, 1).entry(6.0, 0, 1).build();

    let analysis = analyze_dwell_times(&table);
    assert_eq!(analysis.method, DwellMethod::DetectionSpan);
    assert_eq!(analysis.summary.longest_stay, 5.0);
}

#[test]
fn test_zone_and_person_aggregates() {
    let table = EventsBuilder::new()
        .entry(0.0, 0, 1)
        .exit(4.0, 0, 1)
        .entry(10.0, 0, 1)
        .exit(18.0, 0, 1)
        .entry(0.0, 0, 2)
        .exit(6.0, 0, 2)
        .build();

    let analysis = analyze_dwell_times(&table);
    let zone = &analysis.zone_dwell_times[&ZoneId(0).label()];
    assert_eq!(zone.count, 3);
    assert_eq!(zone.mean, 6.0);
    assert_eq!(zone.median, 6.0);
    assert_eq!(zone.max, 8.0);
    assert_eq!(zone.min, 4.0);
    assert_eq!(zone.std, Some(2.0));

    let person = &analysis.person_dwell_times[&PersonId(1)];
    assert_eq!(person.total_dwell_time, 12.0);
    assert_eq!(person.mean_dwell_time, 6.0);
    assert_eq!(person.visit_count, 2);

    assert_eq!(analysis.summary.total_visits, 3);
    assert_eq!(analysis.summary.longest_stay, 8.0);
    assert_eq!(analysis.summary.shortest_stay, 4.0);
}

#[test]
fn test_histogram_buckets_partition_domain() {
    let samples = [0.0, 9.999, 10.0, 29.9, 30.0, 59.99, 60.0, 3600.0];
    let mut histogram = DwellHistogram::default();
    for &dwell in &samples {
        histogram.record(dwell);
    }
    assert_eq!(histogram.counts(), [2, 2, 2, 2]);
    assert_eq!(histogram.total(), samples.len());
}

#[test]
fn test_no_visits_yields_zeroed_summary() {
    let table = EventsBuilder::new().entry(1.0, 0, 1).exit(0.5, 0, 1).build();

    let analysis = analyze_dwell_times(&table);
    assert_eq!(analysis.total_visits, 0);
    assert!(analysis.zone_dwell_times.is_empty());
    assert!(analysis.person_dwell_times.is_empty());
    assert_eq!(analysis.summary.mean, 0.0);
    assert_eq!(analysis.summary.histogram.total(), 0);
}

#[test]
fn test_serialized_shape() {
    let table = EventsBuilder::new().entry(1.0, 4, 9).exit(12.0, 4, 9).build();

    let json = serde_json::to_value(analyze_dwell_times(&table)).unwrap();
    assert_eq!(json["method"], "entry_exit");
    assert!(json.get("note").is_none());
    assert_eq!(json["zone_dwell_times"]["zone_4"]["count"], 1);
    assert_eq!(json["person_dwell_times"]["9"]["visit_count"], 1);
    assert_eq!(json["summary"]["histogram"]["10-30s"], 1);
}
