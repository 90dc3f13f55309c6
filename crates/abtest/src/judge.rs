//! Simulated judge for demos and tests
//!
//! Each element has a hidden true skill; a match draws a noisy performance for
//! both sides and the higher performance wins.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Outcome resolver backed by known true skills plus Gaussian performance noise
#[derive(Debug, Clone)]
pub struct NoisyJudge {
    skills: HashMap<String, f64>,
    noise: Normal<f64>,
    rng: StdRng,
}

impl NoisyJudge {
    /// `noise` is the standard deviation of each side's performance.
    ///
    /// Returns `None` if `noise` is negative or not finite.
    pub fn new(skills: &[(String, f64)], noise: f64, seed: Option<u64>) -> Option<Self> {
        if !noise.is_finite() || noise < 0.0 {
            return None;
        }
        let noise = Normal::new(0.0, noise).ok()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Some(Self {
            skills: skills.iter().cloned().collect(),
            noise,
            rng,
        })
    }

    pub fn skill(&self, name: &str) -> Option<f64> {
        self.skills.get(name).copied()
    }

    /// Winner of one match between `a` and `b`
    pub fn resolve(&mut self, a: &str, b: &str) -> Result<String, String> {
        let skill_a = self.skill(a).ok_or_else(|| format!("no true skill for {}", a))?;
        let skill_b = self.skill(b).ok_or_else(|| format!("no true skill for {}", b))?;

        let perf_a = skill_a + self.noise.sample(&mut self.rng);
        let perf_b = skill_b + self.noise.sample(&mut self.rng);
        let winner = if perf_a > perf_b { a } else { b };
        Ok(winner.to_string())
    }
}
