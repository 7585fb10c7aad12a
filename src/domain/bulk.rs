// src/domain/bulk.rs

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The mutation changed the lead.
    Applied,
    /// The lead already had the tag / was already deleted.
    Unchanged,
    /// Unknown id, or the lead is soft-deleted and out of the active view.
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub id: String,
    pub outcome: Outcome,
}

/// Per-id result of one bulk call. The whole batch was committed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub outcomes: Vec<BulkOutcome>,
}

impl BulkReport {
    pub fn push(&mut self, id: &str, outcome: Outcome) {
        self.outcomes.push(BulkOutcome {
            id: id.to_string(),
            outcome,
        });
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|o| o.outcome == outcome).count()
    }

    pub fn outcome_for(&self, id: &str) -> Option<Outcome> {
        self.outcomes.iter().find(|o| o.id == id).map(|o| o.outcome)
    }
}
