//! Convergence detection
//!
//! Two gates decide whether more rounds are worth running: an uncertainty gate
//! (only for backends that track uncertainty) and a rank-stability gate that
//! compares the current ranking with an earlier snapshot.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::engine::rank_elements;
use crate::scoring::ScoringSystem;

/// Thresholds for [`has_converged`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceCriteria {
    /// Largest sigma any element may still have
    pub threshold_sigma: f64,
    /// Minimum Kendall tau between the previous and current ranking
    pub tau_threshold: f64,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            threshold_sigma: 2.0,
            tau_threshold: 0.98,
        }
    }
}

/// Kendall's tau between two rankings given as ordered name sequences.
///
/// Only names present in both rankings take part. Returns `None` when fewer
/// than two names are shared.
pub fn kendall_tau<A: AsRef<str>, B: AsRef<str>>(previous: &[A], current: &[B]) -> Option<f64> {
    let positions: HashMap<&str, usize> = current
        .iter()
        .enumerate()
        .map(|(pos, name)| (name.as_ref(), pos))
        .collect();

    let mut seen = HashSet::with_capacity(previous.len());
    let ranks: Vec<usize> = previous
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let pos = *positions.get(name)?;
            seen.insert(name).then_some(pos)
        })
        .collect();

    let n = ranks.len();
    if n < 2 {
        return None;
    }

    let mut discordant = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            if ranks[i] > ranks[j] {
                discordant += 1;
            }
        }
    }

    let total = n * (n - 1) / 2;
    let concordant = total - discordant;
    Some((concordant as f64 - discordant as f64) / total as f64)
}

/// Whether further testing is unlikely to change the ranking.
///
/// Without a previous ranking there is nothing to compare against, so the
/// answer is always `false`. The result depends only on the arguments.
pub fn has_converged(
    elements: &[Element],
    scoring: &dyn ScoringSystem,
    prev_ranking: Option<&[String]>,
    criteria: &ConvergenceCriteria,
) -> bool {
    if scoring.provides_uncertainty() {
        let max_sigma = elements
            .iter()
            .map(|e| scoring.extract_sigma(e.rating()))
            .fold(f64::NEG_INFINITY, f64::max);
        if max_sigma > criteria.threshold_sigma {
            tracing::trace!(max_sigma, "uncertainty gate not passed");
            return false;
        }
    }

    let Some(prev) = prev_ranking else {
        return false;
    };

    let current: Vec<&str> = rank_elements(elements, scoring)
        .into_iter()
        .map(|e| e.name())
        .collect();

    match kendall_tau(prev, &current[..]) {
        Some(tau) => {
            tracing::trace!(tau, "rank stability");
            tau >= criteria.tau_threshold
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "convergence_tests.rs"]
mod convergence_tests;
