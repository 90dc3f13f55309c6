//! Ranking reports

use serde::{Deserialize, Serialize};

use crate::convergence::kendall_tau;
use crate::engine::TestingEngine;

/// One line of a ranking report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub mu: f64,
    pub sigma: f64,
    pub conservative: f64,
    pub matches: usize,
}

/// Snapshot of an engine's ranking for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub title: String,
    pub backend: String,
    /// Rows in ranked order
    pub rows: Vec<ReportRow>,
    pub total_matches: usize,
    /// Kendall tau against the known true order, when one was supplied
    pub tau_vs_truth: Option<f64>,
}

impl RankingReport {
    pub fn from_engine(title: &str, engine: &TestingEngine) -> Self {
        let scoring = engine.scoring();
        let rows = engine
            .get_rankings()
            .into_iter()
            .map(|e| ReportRow {
                name: e.name().to_string(),
                mu: scoring.extract_mu(e.rating()),
                sigma: scoring.extract_sigma(e.rating()),
                conservative: e.conservative_score(scoring),
                matches: e.match_count(),
            })
            .collect();

        Self {
            title: title.to_string(),
            backend: scoring.name().to_string(),
            rows,
            total_matches: engine.match_count(),
            tau_vs_truth: None,
        }
    }

    /// Compare the ranking with the order implied by `true_skills`
    pub fn with_ground_truth(mut self, true_skills: &[(String, f64)]) -> Self {
        let mut truth: Vec<&(String, f64)> = true_skills.iter().collect();
        truth.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let truth: Vec<&str> = truth.iter().map(|(name, _)| name.as_str()).collect();
        let predicted: Vec<&str> = self.rows.iter().map(|r| r.name.as_str()).collect();

        self.tau_vs_truth = kendall_tau(&truth[..], &predicted[..]);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        if !self.title.is_empty() {
            report.push_str(&format!("=== {} ===\n", self.title));
        }
        report.push_str(&format!(
            "Backend: {}, Matches: {}",
            self.backend, self.total_matches
        ));
        if let Some(tau) = self.tau_vs_truth {
            report.push_str(&format!(", Kendall tau vs ground truth: {:.2}", tau));
        }
        report.push_str("\n\n");

        report.push_str(&format!(
            "{:<4} {:<20} {:>10} {:>8} {:>13} {:>8}\n",
            "#", "Element", "Mu", "Sigma", "Conservative", "Matches"
        ));
        report.push_str(&"-".repeat(68));
        report.push('\n');

        for (rank, row) in self.rows.iter().enumerate() {
            report.push_str(&format!(
                "{:<4} {:<20} {:>10.2} {:>8.2} {:>13.2} {:>8}\n",
                rank + 1,
                row.name,
                row.mu,
                row.sigma,
                row.conservative,
                row.matches
            ));
        }

        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}
