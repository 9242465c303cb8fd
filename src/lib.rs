//! Zone occupancy and dwell-time analytics engine
//!
//! Turns a chronological table of per-frame person detections into per-zone
//! occupancy, temporal density, zone-to-zone flow, dwell-time and demographic
//! statistics.
//!
//! ```
//! use zone_analytics::domain::{DetectionEvent, EventKind, EventTable};
//!
//! let table = EventTable::from_events(vec![
//!     DetectionEvent::new(5.0, 150, 0, 1).with_kind(EventKind::Entry),
//!     DetectionEvent::new(9.0, 270, 0, 1).with_kind(EventKind::Exit),
//! ])
//! .unwrap();
//!
//! let result = zone_analytics::analyze(&table).unwrap();
//! assert_eq!(result.summary.total_detections, 2);
//! assert_eq!(result.dwell_time_analysis.summary.mean, 4.0);
//!
//! let charts = zone_analytics::project_for_visualization(&result);
//! assert_eq!(charts.summary_cards.duration, "4.0s");
//! ```

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;

pub use domain::{AnalysisError, EventTable};
pub use services::{analyze, analyze_with, project_for_visualization, AnalysisOptions, AnalysisResult, ChartBundle};
