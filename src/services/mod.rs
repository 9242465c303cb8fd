//! Services - the analytics aggregators and result assembly
//!
//! This module contains the engine's business logic:
//! - `zone_activity` - Per-zone counts, activity window and timeline
//! - `temporal` - Per-timestamp density, peak and distribution
//! - `flow` - Zone-to-zone transition counting
//! - `dwell` - Visit reconstruction and dwell-time statistics
//! - `demographics` - Gender/age distributions and confidence summary
//! - `analyzer` - Runs all aggregators and assembles `AnalysisResult`
//! - `visualization` - Chart-ready projection of a result
//! - `stats` - Descriptive statistics helpers

pub mod analyzer;
pub mod demographics;
pub mod dwell;
pub mod flow;
pub mod stats;
pub mod temporal;
pub mod visualization;
pub mod zone_activity;

// Re-export commonly used types
pub use analyzer::{analyze, analyze_with, AnalysisOptions, AnalysisResult, AnalysisSummary};
pub use demographics::DemographicAnalysis;
pub use dwell::{reconstruct_visits, DwellTimeAnalysis};
pub use visualization::{project_for_visualization, ChartBundle};
