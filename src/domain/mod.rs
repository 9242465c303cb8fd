//! Domain models - event rows, derived visits and the validated table
//!
//! This module contains the canonical data types used throughout the engine:
//! - `DetectionEvent` - one row of the detection stream
//! - `EventTable` - validated, immutable collection of events
//! - `Visit` - a reconstructed entry/exit interval
//! - `AnalysisError` - loader and analysis failures

pub mod error;
pub mod table;
pub mod types;

// Re-export commonly used types at module level
pub use error::AnalysisError;
pub use table::{DwellMode, EventTable, OptionalColumns, MAX_TIMESTAMP_SECONDS};
pub use types::{DetectionEvent, EventKind, PersonId, Timestamp, Visit, ZoneId, ZoneLabel};
