//! Run configuration loaded from TOML
//!
//! Every field has a default, so an empty file (or no file at all) is valid:
//!
//! ```toml
//! [backend]
//! kind = "gaussian"
//!
//! [simulation]
//! rounds = 300
//! seed = 7
//!
//! [convergence]
//! tau_threshold = 0.95
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::convergence::ConvergenceCriteria;
use crate::engine::{TestingEngine, CHECK_INTERVAL};
use crate::error::Result;
use crate::scoring::{EloSystem, GaussianSystem, ScoringSystem, K_FACTOR};

/// Which rating backend to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Elo,
    Gaussian,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elo" => Ok(BackendKind::Elo),
            "gaussian" | "trueskill" => Ok(BackendKind::Gaussian),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Only used by the Elo backend
    pub k_factor: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Elo,
            k_factor: K_FACTOR,
        }
    }
}

impl BackendConfig {
    pub fn build(&self) -> Box<dyn ScoringSystem> {
        match self.kind {
            BackendKind::Elo => Box::new(EloSystem::new(self.k_factor)),
            BackendKind::Gaussian => Box::new(GaussianSystem::default()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Round budget per run
    pub rounds: usize,
    /// Rounds between convergence checks
    pub check_interval: usize,
    /// Standard deviation of the judge's performance noise
    pub noise: f64,
    /// Seed for the judge (None = random)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rounds: 500,
            check_interval: CHECK_INTERVAL,
            noise: 5.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AbTestConfig {
    pub backend: BackendConfig,
    pub simulation: SimulationConfig,
    pub convergence: ConvergenceCriteria,
}

impl AbTestConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Empty engine wired with this configuration's backend and convergence settings
    pub fn build_engine(&self) -> TestingEngine {
        TestingEngine::new(self.backend.build())
            .with_convergence(self.convergence)
            .with_check_interval(self.simulation.check_interval)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
