//! Gender and age-group breakdowns
//!
//! Only rows whose gender *and* age group are both known (present and not
//! the unknown label) are used. The population is deduplicated to one row
//! per person, first valid occurrence wins, so repeated detections of the
//! same person are counted once.

use crate::domain::{DetectionEvent, EventTable, PersonId, ZoneId, ZoneLabel};
use crate::services::stats;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Default reserved label for unclassified attributes
pub const DEFAULT_UNKNOWN_LABEL: &str = "unknown";

/// Why demographic statistics could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Gender or age-group column absent from the source
    MissingColumns,
    /// Columns present but every row is unknown for at least one attribute
    NoClassifiedRows,
}

impl UnavailableReason {
    pub fn note(&self) -> &'static str {
        match self {
            UnavailableReason::MissingColumns => "Demographic columns not present in dataset",
            UnavailableReason::NoClassifiedRows => "No valid demographic data found",
        }
    }
}

/// Count and percentage for one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryShare {
    pub count: usize,
    pub percentage: f64,
}

/// Category label -> share, ordered by label
pub type Distribution = BTreeMap<String, CategoryShare>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDemographics {
    pub total_persons: usize,
    pub gender_distribution: Distribution,
    pub age_distribution: Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicSummary {
    pub total_persons_classified: usize,
    pub total_detections_with_demographics: usize,
    /// Classified persons over all distinct persons in the table
    pub classification_rate: f64,
    /// `None` when no confidence values were carried
    pub average_gender_confidence: Option<f64>,
    pub average_age_confidence: Option<f64>,
    pub most_common_gender: Option<String>,
    pub most_common_age_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicReport {
    /// Always `true`
    pub has_data: bool,
    pub gender_distribution: Distribution,
    pub age_distribution: Distribution,
    pub zone_demographics: BTreeMap<ZoneLabel, ZoneDemographics>,
    pub summary: DemographicSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicUnavailable {
    /// Always `false`
    pub has_data: bool,
    pub reason: UnavailableReason,
    pub note: String,
}

/// Demographic section of the result; missing data is a normal branch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DemographicAnalysis {
    Available(DemographicReport),
    Unavailable(DemographicUnavailable),
}

impl DemographicAnalysis {
    fn unavailable(reason: UnavailableReason) -> Self {
        DemographicAnalysis::Unavailable(DemographicUnavailable {
            has_data: false,
            reason,
            note: reason.note().to_string(),
        })
    }

    pub fn has_data(&self) -> bool {
        matches!(self, DemographicAnalysis::Available(_))
    }

    pub fn report(&self) -> Option<&DemographicReport> {
        match self {
            DemographicAnalysis::Available(report) => Some(report),
            DemographicAnalysis::Unavailable(_) => None,
        }
    }
}

/// A row with both attributes classified
struct Classified<'a> {
    event: &'a DetectionEvent,
    gender: &'a str,
    age_group: &'a str,
}

fn known<'a>(value: Option<&'a String>, unknown_label: &str) -> Option<&'a str> {
    value.map(String::as_str).map(str::trim).filter(|v| !v.is_empty() && *v != unknown_label)
}

fn distribution<'a>(labels: impl Iterator<Item = &'a str>) -> Distribution {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for label in labels {
        *counts.entry(label.to_string()).or_insert(0) += 1;
        total += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| {
            let percentage = stats::finite(count as f64 / total as f64 * 100.0);
            (label, CategoryShare { count, percentage })
        })
        .collect()
}

/// First label with the highest count, in map order
fn most_common(distribution: &Distribution) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (label, share) in distribution {
        if best.map_or(true, |(_, count)| share.count > count) {
            best = Some((label, share.count));
        }
    }
    best.map(|(label, _)| label.clone())
}

fn mean_present(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().filter(|v| v.is_finite()).collect();
    (!present.is_empty()).then(|| stats::mean(&present))
}

fn dedupe<'a, 'b>(rows: impl Iterator<Item = &'b Classified<'a>>) -> Vec<&'b Classified<'a>> {
    let mut seen: FxHashSet<PersonId> = FxHashSet::default();
    rows.filter(|row| seen.insert(row.event.person_id)).collect()
}

pub fn analyze_demographics(table: &EventTable, unknown_label: &str) -> DemographicAnalysis {
    if !table.columns().has_demographics() {
        debug!("demographics_columns_missing");
        return DemographicAnalysis::unavailable(UnavailableReason::MissingColumns);
    }

    let valid: Vec<Classified<'_>> = table
        .events()
        .iter()
        .filter_map(|event| {
            let gender = known(event.gender.as_ref(), unknown_label)?;
            let age_group = known(event.age_group.as_ref(), unknown_label)?;
            Some(Classified { event, gender, age_group })
        })
        .collect();

    if valid.is_empty() {
        debug!(rows = table.len(), "demographics_no_classified_rows");
        return DemographicAnalysis::unavailable(UnavailableReason::NoClassifiedRows);
    }

    let persons = dedupe(valid.iter());
    let gender_distribution = distribution(persons.iter().map(|row| row.gender));
    let age_distribution = distribution(persons.iter().map(|row| row.age_group));

    let mut zone_ids: Vec<ZoneId> = valid.iter().map(|row| row.event.zone_id).collect();
    zone_ids.sort();
    zone_ids.dedup();

    let zone_demographics = zone_ids
        .into_iter()
        .map(|zone_id| {
            let zone_persons = dedupe(valid.iter().filter(|row| row.event.zone_id == zone_id));
            let zone = ZoneDemographics {
                total_persons: zone_persons.len(),
                gender_distribution: distribution(zone_persons.iter().map(|row| row.gender)),
                age_distribution: distribution(zone_persons.iter().map(|row| row.age_group)),
            };
            (zone_id.label(), zone)
        })
        .collect();

    let all_persons = table.unique_person_count();
    let summary = DemographicSummary {
        total_persons_classified: persons.len(),
        total_detections_with_demographics: valid.len(),
        classification_rate: stats::finite(persons.len() as f64 / all_persons as f64),
        average_gender_confidence: mean_present(valid.iter().map(|row| row.event.gender_confidence)),
        average_age_confidence: mean_present(valid.iter().map(|row| row.event.age_confidence)),
        most_common_gender: most_common(&gender_distribution),
        most_common_age_group: most_common(&age_distribution),
    };

    debug!(
        classified = summary.total_persons_classified,
        persons = all_persons,
        "demographics_aggregated"
    );

    DemographicAnalysis::Available(DemographicReport {
        has_data: true,
        gender_distribution,
        age_distribution,
        zone_demographics,
        summary,
    })
}
