//! Adaptive pairwise ranking
//!
//! This crate ranks a set of elements from pairwise win/loss outcomes:
//! - Picking the next most informative pair to compare
//! - Updating skill estimates through a pluggable rating backend (Elo or Gaussian)
//! - Detecting when the ranking has stopped changing
//! - Saving and restoring the full ranking state as JSON
//!
//! # Usage
//!
//! ```bash
//! # Rank the demo characters with Elo until convergence
//! cargo run -p abtest -- simulate --backend elo --rounds 500
//!
//! # Run, save, reload and check the ranking survives the round trip
//! cargo run -p abtest -- validate --seed 7
//! ```
//!
//! ```
//! use abtest::{EloSystem, TestingEngine};
//!
//! let mut engine = TestingEngine::new(Box::new(EloSystem::default()));
//! for name in ["goblin", "knight", "dragon"] {
//!     engine.add_element(name).unwrap();
//! }
//! let outcome = engine
//!     .run_simulation(|a: &str, b: &str| Ok::<_, String>(a.max(b).to_string()), 100)
//!     .unwrap();
//! assert!(outcome.rounds_played > 0);
//! assert_eq!(engine.get_rankings()[0].name(), "knight");
//! ```

pub mod config;
pub mod convergence;
pub mod element;
pub mod engine;
pub mod error;
pub mod judge;
pub mod pairing;
pub mod persistence;
pub mod results;
pub mod scoring;

pub use config::{AbTestConfig, BackendConfig, BackendKind, SimulationConfig};
pub use convergence::{has_converged, kendall_tau, ConvergenceCriteria};
pub use element::{Element, MatchOutcome, MatchRecord};
pub use engine::{rank_elements, SimulationOutcome, TestingEngine};
pub use error::{AbTestError, Result};
pub use judge::NoisyJudge;
pub use pairing::{info_gain, suggest_pair};
pub use persistence::{ElementRecord, LoadSummary, StateRecord};
pub use results::{RankingReport, ReportRow};
pub use scoring::{EloSystem, GaussianSystem, Rating, RestoredRating, ScoringSystem};
