//! Greedy pair selection
//!
//! Every unordered pair of elements is scored and the best one is proposed.
//! This is O(n²) in the number of elements, which is fine for the hundreds of
//! elements this engine is meant for.

use std::cmp::Ordering;

use crate::element::Element;
use crate::scoring::ScoringSystem;

/// Keeps the score finite when two elements have identical means or zero uncertainty
pub const INFO_GAIN_EPSILON: f64 = 1e-5;

/// Heuristic score for comparing two elements.
///
/// High combined uncertainty and a small skill gap both score high. This is a
/// proxy for how much a match would move the estimates, not a calibrated
/// expected information gain.
pub fn info_gain(mu_a: f64, sigma_a: f64, mu_b: f64, sigma_b: f64) -> f64 {
    let mu_diff = (mu_a - mu_b).abs();
    let sigma_sum = sigma_a + sigma_b;
    (sigma_sum + INFO_GAIN_EPSILON) / (mu_diff + INFO_GAIN_EPSILON)
}

/// Propose the next pair to compare, or `None` with fewer than two elements.
///
/// The pair is returned with the lexicographically smaller name first. Equal
/// scores are resolved by preferring the greater pair of names, so the choice
/// does not depend on the order of `elements`.
pub fn suggest_pair(elements: &[Element], scoring: &dyn ScoringSystem) -> Option<(String, String)> {
    let mut best: Option<(f64, &str, &str)> = None;

    for (i, a) in elements.iter().enumerate() {
        for b in &elements[i + 1..] {
            let score = info_gain(
                scoring.extract_mu(a.rating()),
                scoring.extract_sigma(a.rating()),
                scoring.extract_mu(b.rating()),
                scoring.extract_sigma(b.rating()),
            );
            let (first, second) = if a.name() <= b.name() {
                (a.name(), b.name())
            } else {
                (b.name(), a.name())
            };

            let better = match best {
                None => true,
                Some((best_score, best_first, best_second)) => {
                    match score.total_cmp(&best_score) {
                        Ordering::Greater => true,
                        Ordering::Less => false,
                        Ordering::Equal => (first, second) > (best_first, best_second),
                    }
                }
            };
            if better {
                best = Some((score, first, second));
            }
        }
    }

    best.map(|(score, first, second)| {
        tracing::debug!(first, second, score, "suggested pair");
        (first.to_string(), second.to_string())
    })
}

#[cfg(test)]
#[path = "pairing_tests.rs"]
mod pairing_tests;
