//! Exploration strategies of DQN.
use anyhow::Result;
use coinop_core::error::CoinopError;
use serde::{Deserialize, Serialize};

/// Explorers for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DqnExplorer {
    /// Linear-annealed epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),

    /// Boltzmann (softmax) action selection.
    Softmax(Softmax),
}

impl DqnExplorer {
    /// Selects an action for the given Q-values.
    ///
    /// `step` drives the annealing schedule; `train` switches the
    /// epsilon-greedy variant to its dedicated test epsilon when `false`.
    ///
    /// Fails with [`CoinopError::InvalidPolicyState`] if `q_values` is empty.
    pub fn select(
        &self,
        q_values: &[f32],
        step: usize,
        train: bool,
        rng: &mut fastrand::Rng,
    ) -> Result<usize> {
        if q_values.is_empty() {
            return Err(CoinopError::InvalidPolicyState.into());
        }
        match self {
            DqnExplorer::EpsilonGreedy(egreedy) => Ok(egreedy.select(q_values, step, train, rng)),
            DqnExplorer::Softmax(softmax) => Ok(softmax.select(q_values, rng)),
        }
    }
}

/// Returns the first index achieving the maximum.
///
/// The deterministic tie-break keeps runs reproducible under a fixed seed.
fn argmax(q_values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in q_values.iter().enumerate() {
        if *v > q_values[best] {
            best = i;
        }
    }
    best
}

/// Epsilon-greedy explorer with a linear annealing schedule.
///
/// During training, epsilon decreases linearly from `eps_max` to `eps_min`
/// over `anneal_steps` environment steps and stays at `eps_min` afterwards.
/// In evaluation mode a distinct fixed `eps_test` applies, so the agent
/// keeps a small amount of randomness and cannot get stuck in a
/// deterministic loop against a static obstacle pattern.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at step 0.
    pub eps_max: f64,

    /// Epsilon after annealing.
    pub eps_min: f64,

    /// Epsilon used in evaluation mode.
    pub eps_test: f64,

    /// Number of steps over which epsilon anneals.
    pub anneal_steps: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs an epsilon-greedy explorer with common defaults.
    pub fn new() -> Self {
        Self {
            eps_max: 1.0,
            eps_min: 0.1,
            eps_test: 0.05,
            anneal_steps: 1_000_000,
        }
    }

    /// Sets the initial epsilon.
    pub fn eps_max(mut self, v: f64) -> Self {
        self.eps_max = v;
        self
    }

    /// Sets the final epsilon.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Sets the evaluation-mode epsilon.
    pub fn eps_test(mut self, v: f64) -> Self {
        self.eps_test = v;
        self
    }

    /// Sets the annealing length in steps.
    pub fn anneal_steps(mut self, v: usize) -> Self {
        self.anneal_steps = v;
        self
    }

    /// Returns the training epsilon at the given step.
    pub fn eps(&self, step: usize) -> f64 {
        let d = (self.eps_max - self.eps_min) / self.anneal_steps as f64;
        (self.eps_max - d * step as f64).max(self.eps_min)
    }

    fn select(&self, q_values: &[f32], step: usize, train: bool, rng: &mut fastrand::Rng) -> usize {
        let eps = if train { self.eps(step) } else { self.eps_test };
        if rng.f64() < eps {
            rng.usize(..q_values.len())
        } else {
            argmax(q_values)
        }
    }
}

/// Boltzmann explorer sampling from `softmax(q / tau)`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {
    /// Temperature; lower values concentrate on the greedy action.
    pub tau: f64,
}

#[allow(clippy::new_without_default)]
impl Softmax {
    /// Constructs a Boltzmann explorer with temperature 1.
    pub fn new() -> Self {
        Self { tau: 1.0 }
    }

    /// Sets the temperature.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    fn select(&self, q_values: &[f32], rng: &mut fastrand::Rng) -> usize {
        // Shift by the maximum before exponentiating for numerical safety.
        let max = q_values.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
        let weights: Vec<f64> = q_values
            .iter()
            .map(|&q| ((q as f64 - max) / self.tau).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        let mut r = rng.f64() * total;
        for (i, w) in weights.iter().enumerate() {
            r -= w;
            if r <= 0. {
                return i;
            }
        }
        weights.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_is_monotone_then_constant() {
        let egreedy = EpsilonGreedy::new()
            .eps_max(1.0)
            .eps_min(0.1)
            .anneal_steps(1000);
        let mut prev = f64::INFINITY;
        for step in 0..=1000 {
            let eps = egreedy.eps(step);
            assert!(eps <= prev);
            prev = eps;
        }
        assert!((egreedy.eps(1000) - 0.1).abs() < 1e-9);
        assert_eq!(egreedy.eps(1001), 0.1);
        assert_eq!(egreedy.eps(1_000_000), 0.1);
    }

    #[test]
    fn greedy_argmax_breaks_ties_on_first_index() {
        assert_eq!(argmax(&[1., 3., 3., 2.]), 1);
        assert_eq!(argmax(&[5.]), 0);
        assert_eq!(argmax(&[2., 2., 2.]), 0);
    }

    #[test]
    fn empty_q_values_fail() {
        let mut rng = fastrand::Rng::with_seed(0);
        let explorer = DqnExplorer::EpsilonGreedy(EpsilonGreedy::new());
        assert!(explorer.select(&[], 0, true, &mut rng).is_err());
        let explorer = DqnExplorer::Softmax(Softmax::new());
        assert!(explorer.select(&[], 0, true, &mut rng).is_err());
    }

    #[test]
    fn annealed_out_egreedy_is_mostly_greedy() {
        let mut rng = fastrand::Rng::with_seed(42);
        let egreedy = EpsilonGreedy::new()
            .eps_min(0.0)
            .anneal_steps(100);
        // Past the annealing interval with eps_min = 0 the choice is greedy.
        for _ in 0..100 {
            assert_eq!(egreedy.select(&[0.1, 0.9, 0.5], 10_000, true, &mut rng), 1);
        }
    }

    #[test]
    fn eval_mode_uses_eps_test() {
        let mut rng = fastrand::Rng::with_seed(42);
        // eps_test = 1.0 forces random choice even though training epsilon
        // would be 0.
        let egreedy = EpsilonGreedy::new()
            .eps_max(0.0)
            .eps_min(0.0)
            .eps_test(1.0);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[egreedy.select(&[0., 0., 1.], 0, false, &mut rng)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn cold_softmax_concentrates_on_the_best_action() {
        let mut rng = fastrand::Rng::with_seed(7);
        let softmax = Softmax::new().tau(0.01);
        for _ in 0..100 {
            assert_eq!(softmax.select(&[0., 10., 1.], &mut rng), 1);
        }
    }
}
