//! Chart-ready projection of an assembled analysis
//!
//! Pure function of `AnalysisResult`; the dashboard renders these series
//! directly.

use crate::services::analyzer::AnalysisResult;
use crate::services::demographics::Distribution;
use crate::services::dwell::HISTOGRAM_LABELS;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Line,
    Bar,
}

/// Parallel label/value series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl LabeledSeries {
    fn push(&mut self, label: impl Into<String>, value: f64) {
        self.labels.push(label.into());
        self.values.push(value);
    }
}

/// Parallel x/y series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct XySeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart<D> {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: D,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    pub zone_distribution: Chart<LabeledSeries>,
    pub temporal_activity: Chart<XySeries>,
    pub zone_comparison: Chart<LabeledSeries>,
    pub dwell_time_distribution: Chart<LabeledSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender_distribution: Option<Chart<LabeledSeries>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_distribution: Option<Chart<LabeledSeries>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCards {
    pub total_detections: usize,
    pub unique_persons: usize,
    /// Formatted as `"12.3s"`
    pub duration: String,
    pub zones_active: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBundle {
    pub charts: Charts,
    pub summary_cards: SummaryCards,
}

fn pie_from(distribution: &Distribution) -> Chart<LabeledSeries> {
    let mut data = LabeledSeries::default();
    for (label, share) in distribution {
        data.push(label.as_str(), share.count as f64);
    }
    Chart { kind: ChartKind::Pie, data }
}

pub fn project_for_visualization(result: &AnalysisResult) -> ChartBundle {
    let mut zone_distribution = LabeledSeries::default();
    let mut zone_comparison = LabeledSeries::default();
    for (zone, stats) in &result.zone_analysis {
        zone_distribution.push(zone.to_string(), stats.total_entries as f64);
        zone_comparison.push(zone.to_string(), stats.unique_persons as f64);
    }

    let mut temporal_activity = XySeries::default();
    for (ts, bucket) in &result.temporal_analysis.timeline {
        temporal_activity.x.push(ts.0);
        temporal_activity.y.push(bucket.detections_per_second as f64);
    }

    let mut dwell_distribution = LabeledSeries::default();
    let counts = result.dwell_time_analysis.summary.histogram.counts();
    for (label, count) in HISTOGRAM_LABELS.iter().zip(counts) {
        dwell_distribution.push(*label, count as f64);
    }

    let report = result.demographic_analysis.report();

    let summary = &result.summary;
    ChartBundle {
        charts: Charts {
            zone_distribution: Chart { kind: ChartKind::Pie, data: zone_distribution },
            temporal_activity: Chart { kind: ChartKind::Line, data: temporal_activity },
            zone_comparison: Chart { kind: ChartKind::Bar, data: zone_comparison },
            dwell_time_distribution: Chart { kind: ChartKind::Bar, data: dwell_distribution },
            gender_distribution: report.map(|r| pie_from(&r.gender_distribution)),
            age_distribution: report.map(|r| pie_from(&r.age_distribution)),
        },
        summary_cards: SummaryCards {
            total_detections: summary.total_detections,
            unique_persons: summary.unique_persons,
            duration: format!("{:.1}s", summary.duration_seconds),
            zones_active: summary.zones_detected.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetectionEvent, EventTable};
    use crate::services::analyzer::analyze;

    #[test]
    fn test_projection_without_demographics() {
        let table = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1),
            DetectionEvent::new(2.0, 2, 0, 2),
            DetectionEvent::new(2.0, 2, 3, 1),
            DetectionEvent::new(14.5, 3, 3, 1),
        ])
        .unwrap();

        let bundle = project_for_visualization(&analyze(&table).unwrap());
        let zones = &bundle.charts.zone_distribution.data;
        assert_eq!(zones.labels, vec!["zone_0", "zone_3"]);
        assert_eq!(zones.values, vec![2.0, 2.0]);
        assert_eq!(bundle.charts.zone_comparison.data.values, vec![2.0, 1.0]);
        assert_eq!(bundle.charts.temporal_activity.data.x, vec![1.0, 2.0, 14.5]);
        assert_eq!(bundle.charts.temporal_activity.data.y, vec![1.0, 2.0, 1.0]);
        // Person 1 spans 2.0..14.5 in zone 3; other pairs have a single row
        assert_eq!(bundle.charts.dwell_time_distribution.data.values, vec![0.0, 1.0, 0.0, 0.0]);
        assert!(bundle.charts.gender_distribution.is_none());

        assert_eq!(bundle.summary_cards.duration, "13.5s");
        assert_eq!(bundle.summary_cards.zones_active, 2);
    }

    #[test]
    fn test_projection_with_demographics() {
        let table = EventTable::from_events(vec![
            DetectionEvent::new(1.0, 1, 0, 1).with_gender("F", None).with_age_group("adult", None),
            DetectionEvent::new(1.0, 1, 0, 2).with_gender("M", None).with_age_group("adult", None),
        ])
        .unwrap();

        let bundle = project_for_visualization(&analyze(&table).unwrap());
        let gender = bundle.charts.gender_distribution.unwrap();
        assert_eq!(gender.kind, ChartKind::Pie);
        assert_eq!(gender.data.labels, vec!["F", "M"]);
        assert_eq!(bundle.charts.age_distribution.unwrap().data.values, vec![2.0]);
    }

    #[test]
    fn test_chart_json_shape() {
        let table = EventTable::from_events(vec![DetectionEvent::new(1.0, 1, 0, 1)]).unwrap();
        let json = serde_json::to_value(project_for_visualization(&analyze(&table).unwrap())).unwrap();
        assert_eq!(json["charts"]["zone_distribution"]["type"], "pie");
        assert_eq!(json["charts"]["temporal_activity"]["type"], "line");
        assert!(json["charts"]["temporal_activity"]["data"]["x"].is_array());
        assert!(json["charts"].get("age_distribution").is_none());
        assert_eq!(json["summary_cards"]["duration"], "0.0s");
    }
}
