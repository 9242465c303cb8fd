//! Shared types for the analytics engine

use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Newtype wrapper for tracker identities to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct PersonId(pub i64);

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for zone IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct ZoneId(pub i64);

impl ZoneId {
    /// Stable output label, e.g. `zone_3`
    #[inline]
    pub fn label(self) -> ZoneLabel {
        ZoneLabel(self)
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map key for zone-keyed output.
///
/// Orders by numeric zone id (so `zone_2` sorts before `zone_10`) and
/// serializes as the `zone_{id}` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneLabel(pub ZoneId);

impl std::fmt::Display for ZoneLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "zone_{}", self.0 .0)
    }
}

impl Serialize for ZoneLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Totally ordered timestamp key for timeline maps
///
/// Serializes as its decimal text so it can be used as a JSON object key.
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(pub f64);

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Entry/exit marker carried by detection rows in entry/exit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Entry,
    Exit,
}

impl std::str::FromStr for EventKind {
    type Err = ();

    /// Case-insensitive; anything other than `entry`/`exit` is rejected
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entry" => Ok(EventKind::Entry),
            "exit" => Ok(EventKind::Exit),
            _ => Err(()),
        }
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Entry => "entry",
            EventKind::Exit => "exit",
        }
    }
}

/// One row of the detection event table
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub timestamp_seconds: f64,
    pub frame: i64,
    pub zone_id: ZoneId,
    pub person_id: PersonId,
    pub event_kind: Option<EventKind>,
    pub gender: Option<String>,
    pub gender_confidence: Option<f64>,
    pub age_group: Option<String>,
    pub age_confidence: Option<f64>,
}

impl DetectionEvent {
    /// Create a bare detection with no entry/exit marker or demographics
    pub fn new(timestamp_seconds: f64, frame: i64, zone_id: i64, person_id: i64) -> Self {
        Self {
            timestamp_seconds,
            frame,
            zone_id: ZoneId(zone_id),
            person_id: PersonId(person_id),
            event_kind: None,
            gender: None,
            gender_confidence: None,
            age_group: None,
            age_confidence: None,
        }
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.event_kind = Some(kind);
        self
    }

    pub fn with_gender(mut self, gender: &str, confidence: Option<f64>) -> Self {
        self.gender = Some(gender.to_string());
        self.gender_confidence = confidence;
        self
    }

    pub fn with_age_group(mut self, age_group: &str, confidence: Option<f64>) -> Self {
        self.age_group = Some(age_group.to_string());
        self.age_confidence = confidence;
        self
    }

    #[inline]
    pub fn is_exit(&self) -> bool {
        self.event_kind == Some(EventKind::Exit)
    }
}

/// A reconstructed, paired (entry, exit) interval for a person within a zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Visit {
    pub person_id: PersonId,
    pub zone_id: ZoneId,
    pub entry_time: f64,
    pub exit_time: f64,
}

impl Visit {
    /// Dwell time in seconds
    #[inline]
    pub fn dwell(&self) -> f64 {
        self.exit_time - self.entry_time
    }
}
