//! Event table loader for CSV exports
//!
//! Reads the per-frame detection export written by the tracking pipeline.
//! Checks run in this order:
//! 1. zero data rows -> `EmptyDataset`
//! 2. missing required columns -> `Schema` (all missing columns listed)
//! 3. unparseable cell -> `Failure` naming the row and column
//!
//! Column names are matched case-insensitively after trimming. Extra columns
//! are ignored.

use crate::domain::{AnalysisError, DetectionEvent, EventKind, EventTable, OptionalColumns, PersonId, ZoneId};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const TIMESTAMP: &str = "timestamp_seconds";
const FRAME: &str = "frame";
const ZONE: &str = "zone_id";
const PERSON: &str = "person_id";
/// Column name used by the tracker's own CSV export
const PERSON_TRACKER: &str = "person_tracker_id";
const EVENT_KIND: &str = "event_kind";
const EVENT: &str = "event";
const GENDER: &str = "gender";
const GENDER_CONFIDENCE: &str = "gender_confidence";
const AGE_GROUP: &str = "age_group";
const AGE_CONFIDENCE: &str = "age_confidence";

/// CSV parsing options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub delimiter: u8,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnLayout {
    timestamp: usize,
    frame: usize,
    zone: usize,
    person: usize,
    event_kind: Option<usize>,
    gender: Option<usize>,
    gender_confidence: Option<usize>,
    age_group: Option<usize>,
    age_confidence: Option<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &StringRecord) -> Result<Self, AnalysisError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        let find = |name: &str| names.iter().position(|n| n == name);

        let timestamp = find(TIMESTAMP);
        let frame = find(FRAME);
        let zone = find(ZONE);
        let person = find(PERSON).or_else(|| find(PERSON_TRACKER));

        let (Some(timestamp), Some(frame), Some(zone), Some(person)) = (timestamp, frame, zone, person)
        else {
            let missing = [(TIMESTAMP, timestamp), (FRAME, frame), (ZONE, zone), (PERSON, person)]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(AnalysisError::Schema { missing });
        };

        Ok(Self {
            timestamp,
            frame,
            zone,
            person,
            event_kind: find(EVENT_KIND).or_else(|| find(EVENT)),
            gender: find(GENDER),
            gender_confidence: find(GENDER_CONFIDENCE),
            age_group: find(AGE_GROUP),
            age_confidence: find(AGE_CONFIDENCE),
        })
    }

    fn optional_columns(&self) -> OptionalColumns {
        OptionalColumns {
            event_kind: self.event_kind.is_some(),
            gender: self.gender.is_some(),
            gender_confidence: self.gender_confidence.is_some(),
            age_group: self.age_group.is_some(),
            age_confidence: self.age_confidence.is_some(),
        }
    }
}

/// One data row with its 1-based row number for error messages
struct RowReader<'a> {
    record: &'a StringRecord,
    row: usize,
}

impl RowReader<'_> {
    fn cell(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("").trim()
    }

    fn optional_cell(&self, idx: Option<usize>) -> Option<&str> {
        idx.map(|i| self.cell(i)).filter(|v| !v.is_empty())
    }

    fn invalid(&self, column: &str, value: &str) -> AnalysisError {
        AnalysisError::failure(format!("row {}: invalid {} value {:?}", self.row, column, value))
    }

    fn float(&self, idx: usize, column: &str) -> Result<f64, AnalysisError> {
        let value = self.cell(idx);
        value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| self.invalid(column, value))
    }

    /// Integer cell; whole-number floats such as `3.0` are accepted
    fn integer(&self, idx: usize, column: &str) -> Result<i64, AnalysisError> {
        let value = self.cell(idx);
        if let Ok(v) = value.parse::<i64>() {
            return Ok(v);
        }
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
            .ok_or_else(|| self.invalid(column, value))
    }

    fn optional_float(&self, idx: Option<usize>, column: &str) -> Result<Option<f64>, AnalysisError> {
        self.optional_cell(idx)
            .map(|value| value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| self.invalid(column, value)))
            .transpose()
    }

    fn event(&self, layout: &ColumnLayout) -> Result<DetectionEvent, AnalysisError> {
        Ok(DetectionEvent {
            timestamp_seconds: self.float(layout.timestamp, TIMESTAMP)?,
            frame: self.integer(layout.frame, FRAME)?,
            zone_id: ZoneId(self.integer(layout.zone, ZONE)?),
            person_id: PersonId(self.integer(layout.person, PERSON)?),
            event_kind: self.optional_cell(layout.event_kind).and_then(|v| v.parse::<EventKind>().ok()),
            gender: self.optional_cell(layout.gender).map(str::to_string),
            gender_confidence: self.optional_float(layout.gender_confidence, GENDER_CONFIDENCE)?,
            age_group: self.optional_cell(layout.age_group).map(str::to_string),
            age_confidence: self.optional_float(layout.age_confidence, AGE_CONFIDENCE)?,
        })
    }
}

/// Load an event table from any CSV reader
pub fn load_csv_reader<R: Read>(reader: R, options: &LoaderOptions) -> Result<EventTable, AnalysisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let csv_err = |e: csv::Error| AnalysisError::failure(format!("csv: {e}"));

    let headers = csv_reader.headers().map_err(csv_err)?.clone();
    let records: Vec<StringRecord> =
        csv_reader.records().collect::<Result<_, _>>().map_err(csv_err)?;

    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let layout = ColumnLayout::resolve(&headers)?;
    debug!(layout = ?layout, "csv_columns_resolved");

    let events = records
        .iter()
        .enumerate()
        .map(|(i, record)| RowReader { record, row: i + 1 }.event(&layout))
        .collect::<Result<Vec<_>, _>>()?;

    let columns = layout.optional_columns();
    let table = EventTable::new(events, columns)?;

    info!(
        rows = table.len(),
        mode = %table.dwell_mode().as_str(),
        event_kind = columns.event_kind,
        demographics = columns.has_demographics(),
        "event_table_loaded"
    );

    Ok(table)
}

/// Load an event table from a CSV file
pub fn load_csv_path<P: AsRef<Path>>(path: P, options: &LoaderOptions) -> Result<EventTable, AnalysisError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AnalysisError::failure(format!("failed to open {}: {e}", path.display())))?;
    debug!(path = %path.display(), "csv_opened");
    load_csv_reader(file, options)
}
