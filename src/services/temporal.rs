//! Temporal density per timestamp bucket
//!
//! Buckets are exact `timestamp_seconds` values, not intervals. Upstream
//! exports round timestamps to whole seconds, which is why the per-bucket
//! count is named `detections_per_second`.

use crate::domain::{EventTable, Timestamp, ZoneId};
use crate::services::stats::{self, Distribution};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalBucket {
    pub detections_per_second: usize,
    pub active_zones: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakActivity {
    pub timestamp: f64,
    pub detections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalAnalysis {
    pub timeline: BTreeMap<Timestamp, TemporalBucket>,
    pub peak_activity: PeakActivity,
    pub average_detections_per_second: f64,
    pub activity_distribution: Distribution,
}

pub fn analyze_temporal(table: &EventTable) -> TemporalAnalysis {
    let mut buckets: BTreeMap<Timestamp, (usize, FxHashSet<ZoneId>)> = BTreeMap::new();
    for event in table.events() {
        let (count, zones) = buckets.entry(Timestamp(event.timestamp_seconds)).or_default();
        *count += 1;
        zones.insert(event.zone_id);
    }

    let timeline: BTreeMap<Timestamp, TemporalBucket> = buckets
        .into_iter()
        .map(|(ts, (count, zones))| {
            (ts, TemporalBucket { detections_per_second: count, active_zones: zones.len() })
        })
        .collect();

    // Strictly-greater keeps the earliest timestamp on ties
    let mut peak = PeakActivity { timestamp: 0.0, detections: 0 };
    for (ts, bucket) in &timeline {
        if bucket.detections_per_second > peak.detections {
            peak = PeakActivity { timestamp: ts.0, detections: bucket.detections_per_second };
        }
    }

    let counts: Vec<f64> = timeline.values().map(|b| b.detections_per_second as f64).collect();

    TemporalAnalysis {
        timeline,
        peak_activity: peak,
        average_detections_per_second: stats::mean(&counts),
        activity_distribution: Distribution::describe(&counts),
    }
}
