//! IO modules - reading event tables and writing reports
//!
//! This module contains all external IO operations:
//! - `loader` - CSV event table loading and validation
//! - `output` - JSON report writing (file or stdout)

pub mod loader;
pub mod output;

// Re-export commonly used types
pub use loader::{load_csv_path, load_csv_reader, LoaderOptions};
pub use output::ReportWriter;
