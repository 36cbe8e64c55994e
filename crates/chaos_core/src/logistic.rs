//! The logistic map `x_{n+1} = r * x_n * (1 - x_n)`.

use crate::error::require;
use crate::solvers::DiscreteMap;
use crate::traits::{DynamicalSystem, Linearization, Scalar, Steppable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One application of the logistic update rule.
#[inline(always)]
pub fn logistic_step(r: f64, x: f64) -> f64 {
    r * x * (1.0 - x)
}

/// Growth-rate parameterized logistic map.
///
/// No bounds are enforced on `r`; behavior is only classified for `r ∈ [0, 4]`
/// with states in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticMap {
    pub r: f64,
}

/// Long-run behavior of the map for a given growth rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Stable,
    Periodic,
    Chaotic,
}

impl Regime {
    /// Period doubling starts at r = 3 and the cascade accumulates near r ≈ 3.56.
    pub fn classify(r: f64) -> Self {
        if r < 3.0 {
            Regime::Stable
        } else if r < 3.56 {
            Regime::Periodic
        } else {
            Regime::Chaotic
        }
    }
}

/// A base trajectory next to one started from a perturbed initial state.
#[derive(Debug, Clone, Serialize)]
pub struct SensitivityResult {
    pub base: Vec<f64>,
    pub perturbed: Vec<f64>,
    /// `|base[t] - perturbed[t]|` for every step.
    pub separation: Vec<f64>,
}

impl LogisticMap {
    pub fn new(r: f64) -> Self {
        Self { r }
    }

    pub fn regime(&self) -> Regime {
        Regime::classify(self.r)
    }

    /// Iterates the map from `x0`, returning `steps` states with `x0` first.
    ///
    /// States are not clamped: divergence for extreme `r` or `x0` is returned
    /// as-is.
    pub fn simulate(&self, x0: f64, steps: usize) -> Result<Vec<f64>> {
        require(steps >= 1, "steps", "must be at least 1")?;
        debug!(r = self.r, x0, steps, "simulating logistic map");

        let mut trajectory = Vec::with_capacity(steps);
        let mut stepper = DiscreteMap::new(1);
        let mut state = [x0];
        let mut t = 0.0;
        trajectory.push(x0);
        for _ in 1..steps {
            stepper.step(self, &mut t, &mut state, 1.0);
            trajectory.push(state[0]);
        }

        if trajectory.last().is_some_and(|x| !x.is_finite()) {
            warn!(r = self.r, x0, "logistic trajectory diverged");
        }
        Ok(trajectory)
    }

    /// Runs the map from `x0` and from `x0 + epsilon` side by side.
    pub fn sensitivity(&self, x0: f64, epsilon: f64, steps: usize) -> Result<SensitivityResult> {
        require(
            epsilon.is_finite() && epsilon != 0.0,
            "epsilon",
            "must be finite and non-zero",
        )?;
        let base = self.simulate(x0, steps)?;
        let perturbed = self.simulate(x0 + epsilon, steps)?;
        let separation = base
            .iter()
            .zip(&perturbed)
            .map(|(a, b)| (a - b).abs())
            .collect();
        Ok(SensitivityResult {
            base,
            perturbed,
            separation,
        })
    }
}

impl<T: Scalar> DynamicalSystem<T> for LogisticMap {
    fn dimension(&self) -> usize {
        1
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let r = T::from_f64(self.r).unwrap_or_else(T::nan);
        out[0] = r * x[0] * (T::one() - x[0]);
    }
}

impl Linearization for LogisticMap {
    fn jacobian(&self, _t: f64, x: &[f64], out: &mut [f64]) {
        out[0] = self.r * (1.0 - 2.0 * x[0]);
    }
}
