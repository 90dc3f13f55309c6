//! Rating backends
//!
//! Every backend implements [`ScoringSystem`]. The engine is built with exactly
//! one backend and never inspects which one it is; behavior that depends on the
//! backend goes through the trait (for example [`ScoringSystem::provides_uncertainty`]).

/// Default starting Elo for new elements
pub const DEFAULT_ELO: f64 = 1500.0;

/// K-factor for Elo updates (higher = more volatile)
pub const K_FACTOR: f64 = 32.0;

/// Uncertainty reported for every Elo rating. Not decayed, not informative.
pub const ELO_SIGMA: f64 = 200.0;

/// Prior mean of the Gaussian backend
pub const DEFAULT_MU: f64 = 25.0;

/// Prior standard deviation of the Gaussian backend
pub const DEFAULT_SIGMA: f64 = DEFAULT_MU / 3.0;

/// Lower bound on the variance shrink factor of a single Gaussian update
const KAPPA: f64 = 1e-4;

/// A skill estimate. The variant is decided by the backend that created it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rating {
    /// Scalar rating with a fixed placeholder uncertainty
    Elo { mu: f64 },
    /// Gaussian belief over skill
    Gaussian { mu: f64, sigma: f64 },
}

impl Rating {
    pub fn mu(&self) -> f64 {
        match *self {
            Rating::Elo { mu } | Rating::Gaussian { mu, .. } => mu,
        }
    }

    pub fn sigma(&self) -> f64 {
        match *self {
            Rating::Elo { .. } => ELO_SIGMA,
            Rating::Gaussian { sigma, .. } => sigma,
        }
    }
}

/// A rating rebuilt from persisted values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestoredRating {
    pub rating: Rating,
    /// False when the rating does not carry the persisted sigma (read-only backends)
    pub sigma_applied: bool,
}

/// Contract every rating backend satisfies.
///
/// `update_ratings` must be a pure function of its two inputs: it may not read
/// or mutate anything else, and the engine replaces both stored ratings with
/// the returned pair.
pub trait ScoringSystem: Send {
    /// Short label used in logs, reports and persisted state
    fn name(&self) -> &str;

    /// Fresh prior estimate for a new element
    fn create_rating(&self) -> Rating;

    /// New ratings after `winner` beat `loser`, returned as `(winner, loser)`
    fn update_ratings(&self, winner: &Rating, loser: &Rating) -> (Rating, Rating);

    fn extract_mu(&self, rating: &Rating) -> f64 {
        rating.mu()
    }

    fn extract_sigma(&self, rating: &Rating) -> f64 {
        rating.sigma()
    }

    /// Whether `extract_sigma` carries real information about uncertainty.
    ///
    /// The convergence detector only applies its uncertainty gate when this is true.
    fn provides_uncertainty(&self) -> bool;

    /// Rebuild a rating from a persisted `mu` / `sigma` pair
    fn restore_rating(&self, mu: f64, sigma: f64) -> RestoredRating;
}

/// Classic Elo with a constant K-factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EloSystem {
    pub k: f64,
}

impl EloSystem {
    pub fn new(k: f64) -> Self {
        Self { k }
    }

    /// Probability that a player rated `rating` beats one rated `opponent`
    pub fn expected_score(rating: f64, opponent: f64) -> f64 {
        1.0 / (1.0 + 10.0_f64.powf((opponent - rating) / 400.0))
    }
}

impl Default for EloSystem {
    fn default() -> Self {
        Self::new(K_FACTOR)
    }
}

impl ScoringSystem for EloSystem {
    fn name(&self) -> &str {
        "elo"
    }

    fn create_rating(&self) -> Rating {
        Rating::Elo { mu: DEFAULT_ELO }
    }

    fn update_ratings(&self, winner: &Rating, loser: &Rating) -> (Rating, Rating) {
        let expected_winner = Self::expected_score(winner.mu(), loser.mu());
        // Same value added and subtracted, so the update is exactly zero-sum
        let change = self.k * (1.0 - expected_winner);

        (
            Rating::Elo {
                mu: winner.mu() + change,
            },
            Rating::Elo {
                mu: loser.mu() - change,
            },
        )
    }

    fn provides_uncertainty(&self) -> bool {
        false
    }

    fn restore_rating(&self, mu: f64, sigma: f64) -> RestoredRating {
        RestoredRating {
            rating: Rating::Elo { mu },
            sigma_applied: sigma == ELO_SIGMA,
        }
    }
}

/// Gaussian-belief backend using the Weng-Lin Bradley-Terry update for two players.
///
/// Defaults match TrueSkill (mu 25, sigma 25/3, beta sigma/2). Sigma never grows
/// from an update, so it shrinks as an element plays more matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSystem {
    pub mu: f64,
    pub sigma: f64,
    /// Performance noise around skill
    pub beta: f64,
}

impl GaussianSystem {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self {
            mu,
            sigma,
            beta: sigma / 2.0,
        }
    }
}

impl Default for GaussianSystem {
    fn default() -> Self {
        Self::new(DEFAULT_MU, DEFAULT_SIGMA)
    }
}

impl ScoringSystem for GaussianSystem {
    fn name(&self) -> &str {
        "gaussian"
    }

    fn create_rating(&self) -> Rating {
        Rating::Gaussian {
            mu: self.mu,
            sigma: self.sigma,
        }
    }

    fn update_ratings(&self, winner: &Rating, loser: &Rating) -> (Rating, Rating) {
        let (mu_w, sigma_w) = (winner.mu(), winner.sigma());
        let (mu_l, sigma_l) = (loser.mu(), loser.sigma());

        let c = (sigma_w.powi(2) + sigma_l.powi(2) + 2.0 * self.beta.powi(2)).sqrt();
        let p_win = 1.0 / (1.0 + ((mu_l - mu_w) / c).exp());
        let p_loss = 1.0 - p_win;

        let updated = |mu: f64, sigma: f64, score: f64, p: f64| {
            let variance = sigma.powi(2);
            let omega = variance / c * (score - p);
            let delta = (sigma / c) * variance / c.powi(2) * p_win * p_loss;
            Rating::Gaussian {
                mu: mu + omega,
                sigma: sigma * (1.0 - delta).max(KAPPA).sqrt(),
            }
        };

        (
            updated(mu_w, sigma_w, 1.0, p_win),
            updated(mu_l, sigma_l, 0.0, p_loss),
        )
    }

    fn provides_uncertainty(&self) -> bool {
        true
    }

    fn restore_rating(&self, mu: f64, sigma: f64) -> RestoredRating {
        RestoredRating {
            rating: Rating::Gaussian { mu, sigma },
            sigma_applied: true,
        }
    }
}

#[cfg(test)]
#[path = "scoring_tests.rs"]
mod scoring_tests;
