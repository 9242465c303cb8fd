//! Result assembler - runs every aggregator over one table
//!
//! `analyze` is pure and stateless: it reads an immutable `EventTable` and
//! returns a fresh `AnalysisResult`. The aggregators share no data, so with
//! `parallel` enabled they are fanned out over the rayon pool; the output is
//! identical either way.

use crate::domain::{AnalysisError, DwellMode, EventTable, ZoneId, ZoneLabel};
use crate::services::demographics::{self, DemographicAnalysis, DEFAULT_UNKNOWN_LABEL};
use crate::services::dwell::{self, DwellTimeAnalysis};
use crate::services::flow::{self, FlowAnalysis};
use crate::services::temporal::{self, TemporalAnalysis};
use crate::services::zone_activity::{self, ZoneStats};
use crate::services::stats;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{error, info};

/// Engine options, passed explicitly on every call
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Reserved label for unclassified gender/age values
    pub unknown_label: String,
    /// Run the aggregators concurrently
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(), parallel: true }
    }
}

/// Dataset-wide counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_detections: usize,
    pub unique_persons: usize,
    pub zones_count: usize,
    pub duration_seconds: f64,
    /// Highest frame index seen
    pub total_frames: i64,
    /// Detections per frame
    pub detection_rate: f64,
    pub zones_detected: Vec<ZoneId>,
    pub analysis_mode: DwellMode,
}

pub fn summarize(table: &EventTable) -> AnalysisSummary {
    let timestamps: Vec<f64> = table.events().iter().map(|e| e.timestamp_seconds).collect();
    let total_frames = table.events().iter().map(|e| e.frame).max().unwrap_or(0);
    let zones_detected: Vec<ZoneId> = table.zone_ids().into_iter().collect();
    // A zero max frame counts as one frame
    let frame_divisor = if total_frames == 0 { 1 } else { total_frames };

    AnalysisSummary {
        total_detections: table.len(),
        unique_persons: table.unique_person_count(),
        zones_count: zones_detected.len(),
        duration_seconds: stats::finite(stats::max(&timestamps) - stats::min(&timestamps)),
        total_frames,
        detection_rate: stats::finite(table.len() as f64 / frame_divisor as f64),
        zones_detected,
        analysis_mode: table.dwell_mode(),
    }
}

/// Complete analysis of one event table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub zone_analysis: BTreeMap<ZoneLabel, ZoneStats>,
    pub temporal_analysis: TemporalAnalysis,
    pub flow_analysis: FlowAnalysis,
    pub dwell_time_analysis: DwellTimeAnalysis,
    pub demographic_analysis: DemographicAnalysis,
}

impl AnalysisResult {
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        serde_json::to_string(self).map_err(|e| AnalysisError::failure(format!("serialization: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String, AnalysisError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::failure(format!("serialization: {e}")))
    }
}

/// Analyze a table with default options
pub fn analyze(table: &EventTable) -> Result<AnalysisResult, AnalysisError> {
    analyze_with(table, &AnalysisOptions::default())
}

/// Analyze a table.
///
/// Either the full result is returned or an error; a panic inside any
/// aggregator is reported as `AnalysisError::Failure`.
pub fn analyze_with(
    table: &EventTable,
    options: &AnalysisOptions,
) -> Result<AnalysisResult, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let started = Instant::now();
    let result = guarded(|| run_aggregators(table, options))?;

    info!(
        rows = result.summary.total_detections,
        persons = result.summary.unique_persons,
        zones = result.summary.zones_count,
        mode = %result.summary.analysis_mode.as_str(),
        visits = result.dwell_time_analysis.total_visits,
        demographics = result.demographic_analysis.has_data(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "analysis_complete"
    );

    Ok(result)
}

/// Run `work`, turning a panic anywhere inside it into `Failure`
fn guarded<F: FnOnce() -> AnalysisResult>(work: F) -> Result<AnalysisResult, AnalysisError> {
    panic::catch_unwind(AssertUnwindSafe(work)).map_err(|payload| {
        let cause = panic_message(payload.as_ref());
        error!(cause = %cause, "analysis_panicked");
        AnalysisError::Failure(cause)
    })
}

fn run_aggregators(table: &EventTable, options: &AnalysisOptions) -> AnalysisResult {
    let unknown = options.unknown_label.as_str();

    if !options.parallel {
        return AnalysisResult {
            summary: summarize(table),
            zone_analysis: zone_activity::analyze_zones(table),
            temporal_analysis: temporal::analyze_temporal(table),
            flow_analysis: flow::analyze_flow(table),
            dwell_time_analysis: dwell::analyze_dwell_times(table),
            demographic_analysis: demographics::analyze_demographics(table, unknown),
        };
    }

    let ((summary, zone_analysis), ((temporal_analysis, flow_analysis), (dwell_time_analysis, demographic_analysis))) =
        rayon::join(
            || rayon::join(|| summarize(table), || zone_activity::analyze_zones(table)),
            || {
                rayon::join(
                    || rayon::join(|| temporal::analyze_temporal(table), || flow::analyze_flow(table)),
                    || {
                        rayon::join(
                            || dwell::analyze_dwell_times(table),
                            || demographics::analyze_demographics(table, unknown),
                        )
                    },
                )
            },
        );

    AnalysisResult {
        summary,
        zone_analysis,
        temporal_analysis,
        flow_analysis,
        dwell_time_analysis,
        demographic_analysis,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected panic during analysis".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionEvent, EventKind};

    fn sample_table() -> EventTable {
        EventTable::from_events(vec![
            DetectionEvent::new(1.0, 30, 0, 1).with_kind(EventKind::Entry),
            DetectionEvent::new(1.0, 30, 1, 2).with_kind(EventKind::Entry),
            DetectionEvent::new(4.0, 120, 0, 1).with_kind(EventKind::Exit),
            DetectionEvent::new(5.0, 150, 1, 1).with_kind(EventKind::Entry),
            DetectionEvent::new(9.0, 270, 1, 2).with_kind(EventKind::Exit),
        ])
        .unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let summary = summarize(&sample_table());
        assert_eq!(summary.total_detections, 5);
        assert_eq!(summary.unique_persons, 2);
        assert_eq!(summary.zones_count, 2);
        assert_eq!(summary.duration_seconds, 8.0);
        assert_eq!(summary.total_frames, 270);
        assert!((summary.detection_rate - 5.0 / 270.0).abs() < 1e-12);
        assert_eq!(summary.zones_detected, vec![ZoneId(0), ZoneId(1)]);
        assert_eq!(summary.analysis_mode, DwellMode::EntryExit);
    }

    #[test]
    fn test_zero_frame_rate_uses_single_frame() {
        let table = EventTable::from_events(vec![
            DetectionEvent::new(0.0, 0, 0, 1),
            DetectionEvent::new(0.0, 0, 0, 2),
        ])
        .unwrap();
        assert_eq!(summarize(&table).detection_rate, 2.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let table = sample_table();
        let parallel = analyze_with(&table, &AnalysisOptions { parallel: true, ..Default::default() }).unwrap();
        let sequential =
            analyze_with(&table, &AnalysisOptions { parallel: false, ..Default::default() }).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.to_json().unwrap(), sequential.to_json().unwrap());
    }

    #[test]
    fn test_result_top_level_keys() {
        let json = serde_json::to_value(analyze(&sample_table()).unwrap()).unwrap();
        for key in [
            "summary",
            "zone_analysis",
            "temporal_analysis",
            "flow_analysis",
            "dwell_time_analysis",
            "demographic_analysis",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["summary"]["analysis_mode"], "entry_exit");
        assert_eq!(json["summary"]["zones_detected"], serde_json::json!([0, 1]));
        assert_eq!(json["demographic_analysis"]["has_data"], false);
    }

    #[test]
    fn test_zone_persons_bounded_by_total() {
        let result = analyze(&sample_table()).unwrap();
        for zone in result.zone_analysis.values() {
            assert!(zone.unique_persons <= result.summary.unique_persons);
        }
    }

    #[test]
    fn test_panicking_aggregator_reported_as_failure() {
        let table = sample_table();
        let result = guarded(|| {
            let (summary, _zones): (AnalysisSummary, BTreeMap<ZoneLabel, ZoneStats>) =
                rayon::join(|| summarize(&table), || panic!("zone aggregator exploded"));
            AnalysisResult { summary, ..run_aggregators(&table, &AnalysisOptions::default()) }
        });
        match result {
            Err(AnalysisError::Failure(cause)) => assert_eq!(cause, "zone aggregator exploded"),
            other => panic!("expected failure, got {other:?}"),
        }

        let ok = guarded(|| run_aggregators(&table, &AnalysisOptions::default()));
        assert_eq!(ok.unwrap(), analyze(&table).unwrap());
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "unexpected panic during analysis");
    }
}
