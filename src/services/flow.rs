//! Zone-to-zone transition counting
//!
//! Each person's events (entries and exits alike) are walked in time order;
//! every adjacent pair with differing zone ids counts as one transition.
//! In entry/exit mode an exit from A followed by an entry into B is counted
//! the same as a direct A -> B move.

use crate::domain::{EventTable, ZoneId};
use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A counted zone-to-zone transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from_zone: ZoneId,
    pub to_zone: ZoneId,
    pub count: usize,
}

impl Transition {
    /// Output key, e.g. `zone_0_to_zone_1`
    pub fn key(&self) -> String {
        format!("{}_to_{}", self.from_zone.label(), self.to_zone.label())
    }
}

/// Transition counts kept in first-encountered order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionCounts {
    order: Vec<Transition>,
    index: FxHashMap<(ZoneId, ZoneId), usize>,
}

impl TransitionCounts {
    fn record(&mut self, from_zone: ZoneId, to_zone: ZoneId) {
        match self.index.get(&(from_zone, to_zone)) {
            Some(&idx) => self.order[idx].count += 1,
            None => {
                self.index.insert((from_zone, to_zone), self.order.len());
                self.order.push(Transition { from_zone, to_zone, count: 1 });
            }
        }
    }

    pub fn get(&self, from_zone: ZoneId, to_zone: ZoneId) -> Option<usize> {
        self.index.get(&(from_zone, to_zone)).map(|&idx| self.order[idx].count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Serialize for TransitionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for transition in &self.order {
            map.serialize_entry(&transition.key(), &transition.count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowAnalysis {
    pub zone_transitions: TransitionCounts,
    pub most_common_transition: Option<Transition>,
    pub total_transitions: usize,
}

pub fn analyze_flow(table: &EventTable) -> FlowAnalysis {
    let mut counts = TransitionCounts::default();

    for (_, events) in table.by_person() {
        for pair in events.windows(2) {
            let (from, to) = (pair[0].zone_id, pair[1].zone_id);
            if from != to {
                counts.record(from, to);
            }
        }
    }

    // Strictly-greater keeps the first encountered transition on ties
    let mut most_common: Option<Transition> = None;
    for transition in counts.iter() {
        if most_common.map_or(true, |best| transition.count > best.count) {
            most_common = Some(*transition);
        }
    }

    let total_transitions = counts.iter().map(|t| t.count).sum();

    FlowAnalysis { zone_transitions: counts, most_common_transition: most_common, total_transitions }
}
