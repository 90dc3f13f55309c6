//! Testing engine: owns the elements and drives the match loop

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::convergence::{self, ConvergenceCriteria};
use crate::element::{Element, MatchOutcome};
use crate::error::{AbTestError, Result};
use crate::pairing;
use crate::scoring::ScoringSystem;

/// Default number of rounds between convergence checks
pub const CHECK_INTERVAL: usize = 10;

/// Summary of a [`TestingEngine::run_simulation`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Matches recorded during the run
    pub rounds_played: usize,
    /// 0-indexed round at which convergence was detected
    pub converged_at: Option<usize>,
}

impl SimulationOutcome {
    pub fn converged(&self) -> bool {
        self.converged_at.is_some()
    }
}

/// Elements sorted by descending mu.
///
/// The sort is stable, so elements with equal mu keep their relative order.
pub fn rank_elements<'a>(elements: &'a [Element], scoring: &dyn ScoringSystem) -> Vec<&'a Element> {
    let mut ranked: Vec<&Element> = elements.iter().collect();
    ranked.sort_by(|a, b| {
        let mu_a = scoring.extract_mu(a.rating());
        let mu_b = scoring.extract_mu(b.rating());
        mu_b.partial_cmp(&mu_a).unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Adaptive pairwise ranking over a set of elements.
///
/// The engine is bound to a single scoring backend for its whole lifetime.
/// Elements are kept in insertion order; nothing is ever removed.
pub struct TestingEngine {
    scoring: Box<dyn ScoringSystem>,
    elements: Vec<Element>,
    index: HashMap<String, usize>,
    criteria: ConvergenceCriteria,
    check_interval: usize,
}

impl TestingEngine {
    pub fn new(scoring: Box<dyn ScoringSystem>) -> Self {
        Self {
            scoring,
            elements: Vec::new(),
            index: HashMap::new(),
            criteria: ConvergenceCriteria::default(),
            check_interval: CHECK_INTERVAL,
        }
    }

    pub fn with_convergence(mut self, criteria: ConvergenceCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Check convergence every `interval` rounds (at least every round)
    pub fn with_check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    pub fn scoring(&self) -> &dyn ScoringSystem {
        self.scoring.as_ref()
    }

    pub fn criteria(&self) -> &ConvergenceCriteria {
        &self.criteria
    }

    /// Elements in insertion order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&i| &self.elements[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total number of recorded matches.
    ///
    /// Every match leaves exactly one `Win` entry, on the winner's side, so
    /// this counts wins. A loaded history that kept only one side of a match
    /// still counts it when that side is the winner.
    pub fn match_count(&self) -> usize {
        self.elements.iter().map(Element::wins).sum()
    }

    /// Register a new element with a fresh rating from the backend
    pub fn add_element(&mut self, name: &str) -> Result<&Element> {
        if self.contains(name) {
            return Err(AbTestError::DuplicateElement(name.to_string()));
        }
        let element = Element::new(name, self.scoring.create_rating());
        Ok(self.insert(element))
    }

    /// Caller guarantees the name is not registered yet
    pub(crate) fn insert(&mut self, element: Element) -> &Element {
        let slot = self.elements.len();
        self.index.insert(element.name().to_string(), slot);
        self.elements.push(element);
        &self.elements[slot]
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| AbTestError::UnknownElement(name.to_string()))
    }

    /// Record that `winner_name` beat `loser_name`.
    ///
    /// Both ratings are replaced with the backend's result and both histories
    /// get an entry pointing at the opponent's id. Nothing changes on error.
    pub fn record_match(&mut self, winner_name: &str, loser_name: &str) -> Result<()> {
        let w = self.position(winner_name)?;
        let l = self.position(loser_name)?;
        if w == l {
            return Err(AbTestError::InvalidMatch(winner_name.to_string()));
        }

        let (new_winner, new_loser) = self
            .scoring
            .update_ratings(self.elements[w].rating(), self.elements[l].rating());
        let winner_id = self.elements[w].id().to_string();
        let loser_id = self.elements[l].id().to_string();

        let winner = &mut self.elements[w];
        winner.rating = new_winner;
        winner.record_match(&loser_id, MatchOutcome::Win);

        let loser = &mut self.elements[l];
        loser.rating = new_loser;
        loser.record_match(&winner_id, MatchOutcome::Loss);

        tracing::debug!(
            winner = winner_name,
            loser = loser_name,
            winner_mu = new_winner.mu(),
            loser_mu = new_loser.mu(),
            "recorded match"
        );
        Ok(())
    }

    /// Elements by descending mu, ties in insertion order
    pub fn get_rankings(&self) -> Vec<&Element> {
        rank_elements(&self.elements, self.scoring())
    }

    /// Names of [`get_rankings`](Self::get_rankings) in order
    pub fn ranked_names(&self) -> Vec<String> {
        self.get_rankings()
            .into_iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Next pair to compare, `None` with fewer than two elements
    pub fn suggest_pair(&self) -> Option<(String, String)> {
        pairing::suggest_pair(&self.elements, self.scoring())
    }

    /// Convergence check against `prev_ranking` using the engine's criteria
    pub fn has_converged(&self, prev_ranking: Option<&[String]>) -> bool {
        convergence::has_converged(&self.elements, self.scoring(), prev_ranking, &self.criteria)
    }

    /// Run up to `rounds` select/resolve/record cycles.
    ///
    /// `resolver` receives the two names of a pair and returns the winner's
    /// name. Convergence is checked on every `check_interval`-th round
    /// (0-indexed) against the ranking captured at the previous check; the run
    /// stops as soon as it converges. A resolver failure aborts the run with
    /// the matches recorded so far kept.
    pub fn run_simulation<F, E>(&mut self, mut resolver: F, rounds: usize) -> Result<SimulationOutcome>
    where
        F: FnMut(&str, &str) -> std::result::Result<String, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut outcome = SimulationOutcome::default();
        let mut prev_ranking: Option<Vec<String>> = None;

        for round in 0..rounds {
            let Some((a, b)) = self.suggest_pair() else {
                tracing::debug!(elements = self.len(), "no pair available");
                break;
            };

            let winner = resolver(&a, &b).map_err(|e| AbTestError::Resolver(e.into()))?;
            let loser = if winner == a {
                &b
            } else if winner == b {
                &a
            } else {
                return Err(AbTestError::InvalidOutcome { winner, a, b });
            };

            self.record_match(&winner, loser)?;
            outcome.rounds_played += 1;

            if round % self.check_interval == 0 {
                if self.has_converged(prev_ranking.as_deref()) {
                    tracing::info!(round, "converged");
                    outcome.converged_at = Some(round);
                    break;
                }
                prev_ranking = Some(self.ranked_names());
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
