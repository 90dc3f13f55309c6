//! Competitors and their match history

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scoring::{Rating, ScoringSystem};

/// Outcome of a single match from one element's point of view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Win,
    Loss,
}

/// One entry in an element's history. Opponents are referenced by id, never by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub opponent_id: String,
    pub result: MatchOutcome,
}

/// A competitor being ranked.
///
/// The rating is owned by the element and only ever replaced with the value
/// returned by a [`ScoringSystem`]; the history only grows.
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    id: String,
    pub(crate) rating: Rating,
    history: Vec<MatchRecord>,
}

impl Element {
    /// Create an element with a freshly generated id and an empty history
    pub fn new(name: &str, rating: Rating) -> Self {
        Self::with_id(name, &Uuid::new_v4().to_string(), rating, Vec::new())
    }

    pub(crate) fn with_id(name: &str, id: &str, rating: Rating, history: Vec<MatchRecord>) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            rating,
            history,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rating(&self) -> &Rating {
        &self.rating
    }

    pub fn history(&self) -> &[MatchRecord] {
        &self.history
    }

    /// Append a match to the history
    pub(crate) fn record_match(&mut self, opponent_id: &str, result: MatchOutcome) {
        self.history.push(MatchRecord {
            opponent_id: opponent_id.to_string(),
            result,
        });
    }

    pub fn match_count(&self) -> usize {
        self.history.len()
    }

    pub fn wins(&self) -> usize {
        self.history
            .iter()
            .filter(|m| m.result == MatchOutcome::Win)
            .count()
    }

    /// Skill estimate penalized by three standard deviations.
    ///
    /// Backends without real uncertainty tracking fall back to the plain mean.
    /// Under Elo this is the rating itself, not `mu - 3 * 200` with the
    /// placeholder sigma.
    pub fn conservative_score(&self, scoring: &dyn ScoringSystem) -> f64 {
        let mu = scoring.extract_mu(&self.rating);
        if scoring.provides_uncertainty() {
            mu - 3.0 * scoring.extract_sigma(&self.rating)
        } else {
            mu
        }
    }
}

#[cfg(test)]
#[path = "element_tests.rs"]
mod element_tests;
