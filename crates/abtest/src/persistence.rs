//! Persisted engine state
//!
//! The record stores everything needed to rebuild the elements (id, mu, sigma
//! and history) but not the scoring backend, which the caller supplies again
//! on load. Elements keep their insertion order in the JSON text.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::{Element, MatchRecord};
use crate::engine::TestingEngine;
use crate::error::{AbTestError, Result};
use crate::scoring::ScoringSystem;

/// Current state format version
pub const STATE_VERSION: u32 = 1;

fn default_version() -> u32 {
    STATE_VERSION
}

/// Saved state of one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: String,
    pub mu: f64,
    pub sigma: f64,
    pub history: Vec<MatchRecord>,
}

/// Saved state of a whole engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Name of the backend that produced the ratings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Element name to saved state, in engine insertion order
    #[serde(with = "ordered_elements")]
    pub elements: Vec<(String, ElementRecord)>,
}

impl StateRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AbTestError::IncompatibleState(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| AbTestError::IncompatibleState(e.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ElementRecord> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, record)| record)
    }
}

/// What a successful [`TestingEngine::load_state`] did
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Number of elements added to the engine
    pub restored: usize,
    /// Advisory [`AbTestError::BackendMismatch`] conditions that did not stop the load
    pub warnings: Vec<AbTestError>,
}

impl TestingEngine {
    /// Snapshot of every element's rating and history
    pub fn save_state(&self) -> StateRecord {
        let scoring = self.scoring();
        StateRecord {
            version: STATE_VERSION,
            backend: Some(scoring.name().to_string()),
            elements: self
                .elements()
                .iter()
                .map(|e| {
                    (
                        e.name().to_string(),
                        ElementRecord {
                            id: e.id().to_string(),
                            mu: scoring.extract_mu(e.rating()),
                            sigma: scoring.extract_sigma(e.rating()),
                            history: e.history().to_vec(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Add the elements of `record` to this engine.
    ///
    /// The whole record is validated first, so on error the engine is left
    /// untouched. Sigma values the backend cannot apply are reported in the
    /// summary instead of failing the load.
    pub fn load_state(&mut self, record: &StateRecord) -> Result<LoadSummary> {
        if record.version > STATE_VERSION {
            return Err(AbTestError::IncompatibleState(format!(
                "state version {} is newer than supported version {}",
                record.version, STATE_VERSION
            )));
        }

        let mut ids: HashSet<&str> = self.elements().iter().map(Element::id).collect();
        for (name, element) in &record.elements {
            if self.contains(name) {
                return Err(AbTestError::DuplicateElement(name.clone()));
            }
            if !ids.insert(element.id.as_str()) {
                return Err(AbTestError::IncompatibleState(format!(
                    "duplicate element id {} ({})",
                    element.id, name
                )));
            }
            if !element.mu.is_finite() || !element.sigma.is_finite() {
                return Err(AbTestError::IncompatibleState(format!(
                    "non-finite rating for {}",
                    name
                )));
            }
            if element.sigma < 0.0 {
                return Err(AbTestError::IncompatibleState(format!(
                    "negative sigma {} for {}",
                    element.sigma, name
                )));
            }
        }

        let mut summary = LoadSummary::default();
        let backend = self.scoring().name().to_string();

        if let Some(saved) = &record.backend {
            if *saved != backend {
                let warning = AbTestError::BackendMismatch(format!(
                    "state was produced by {saved}, loading into {backend}"
                ));
                tracing::warn!("{warning}");
                summary.warnings.push(warning);
            }
        }

        for (name, saved) in &record.elements {
            let restored = self.scoring().restore_rating(saved.mu, saved.sigma);
            if !restored.sigma_applied {
                let warning = AbTestError::BackendMismatch(format!(
                    "sigma of {name} is read-only under {backend}: saved {}, kept {}",
                    saved.sigma,
                    restored.rating.sigma()
                ));
                tracing::warn!("{warning}");
                summary.warnings.push(warning);
            }

            self.insert(Element::with_id(
                name,
                &saved.id,
                restored.rating,
                saved.history.clone(),
            ));
            summary.restored += 1;
        }

        tracing::info!(
            restored = summary.restored,
            warnings = summary.warnings.len(),
            "loaded state"
        );
        Ok(summary)
    }

    /// Fresh engine holding the elements of `record`
    pub fn from_state(record: &StateRecord, scoring: Box<dyn ScoringSystem>) -> Result<Self> {
        let mut engine = TestingEngine::new(scoring);
        engine.load_state(record)?;
        Ok(engine)
    }

    /// Save state to a JSON file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.save_state().to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an engine from a JSON file written by [`save_to_file`](Self::save_to_file)
    pub fn load_from_file(path: impl AsRef<Path>, scoring: Box<dyn ScoringSystem>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let record = StateRecord::from_json(&contents)?;
        Self::from_state(&record, scoring)
    }
}

/// Serializes `Vec<(name, record)>` as a JSON object without losing order
mod ordered_elements {
    use std::collections::HashSet;
    use std::fmt;

    use serde::de::{self, MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    use super::ElementRecord;

    pub fn serialize<S: Serializer>(
        elements: &[(String, ElementRecord)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(elements.iter().map(|(name, record)| (name, record)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, ElementRecord)>, D::Error> {
        struct ElementsVisitor;

        impl<'de> Visitor<'de> for ElementsVisitor {
            type Value = Vec<(String, ElementRecord)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from element name to element state")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
                let mut names = HashSet::new();
                let mut elements = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, record)) = map.next_entry::<String, ElementRecord>()? {
                    if !names.insert(name.clone()) {
                        return Err(de::Error::custom(format!("duplicate element name {name}")));
                    }
                    elements.push((name, record));
                }
                Ok(elements)
            }
        }

        deserializer.deserialize_map(ElementsVisitor)
    }
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod persistence_tests;
