//! Steady-state sampling of the logistic map across a sweep of growth rates.

use crate::error::require;
use crate::logistic::logistic_step;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BifurcationSettings {
    pub min_r: f64,
    pub max_r: f64,
    /// Total iterations per growth rate, transient included.
    pub steps: usize,
    /// Final iterations recorded after the transient.
    pub last_n: usize,
    /// Number of growth rates sampled over `[min_r, max_r]`.
    pub resolution: usize,
}

impl Default for BifurcationSettings {
    fn default() -> Self {
        Self {
            min_r: 2.5,
            max_r: 4.0,
            steps: 1000,
            last_n: 100,
            resolution: 800,
        }
    }
}

/// Upper bound on `resolution * last_n`, the size of each output column.
pub const MAX_BIFURCATION_POINTS: usize = 1 << 24;

impl BifurcationSettings {
    pub fn validate(&self) -> Result<()> {
        require(
            self.min_r.is_finite() && self.max_r.is_finite(),
            "min_r/max_r",
            "must be finite",
        )?;
        require(
            self.min_r < self.max_r,
            "min_r",
            format!("must be below max_r ({} >= {})", self.min_r, self.max_r),
        )?;
        require(self.resolution >= 1, "resolution", "must be at least 1")?;
        require(self.last_n >= 1, "last_n", "must be at least 1")?;
        require(
            self.last_n <= self.steps,
            "last_n",
            format!("must not exceed steps ({} > {})", self.last_n, self.steps),
        )?;
        require(
            self.point_count().is_some_and(|n| n <= MAX_BIFURCATION_POINTS),
            "resolution",
            format!("resolution * last_n exceeds {MAX_BIFURCATION_POINTS} points"),
        )?;
        Ok(())
    }

    fn point_count(&self) -> Option<usize> {
        self.resolution.checked_mul(self.last_n)
    }

    /// Evenly spaced growth rates with both endpoints included.
    pub fn growth_rates(&self) -> Vec<f64> {
        if self.resolution == 1 {
            return vec![self.min_r];
        }
        let span = self.max_r - self.min_r;
        let last = (self.resolution - 1) as f64;
        (0..self.resolution)
            .map(|i| {
                if i == self.resolution - 1 {
                    self.max_r
                } else {
                    self.min_r + span * (i as f64 / last)
                }
            })
            .collect()
    }
}

/// Parallel `(r, x)` attractor samples, flattened row-major from a
/// `last_n x resolution` grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BifurcationDataset {
    pub r_values: Vec<f64>,
    pub x_values: Vec<f64>,
}

impl BifurcationDataset {
    pub fn len(&self) -> usize {
        self.r_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r_values.is_empty()
    }

    /// The recorded states for one iteration row (0-based, oldest first).
    pub fn row(&self, iteration: usize, resolution: usize) -> Option<&[f64]> {
        let start = iteration.checked_mul(resolution)?;
        self.x_values.get(start..start.checked_add(resolution)?)
    }
}

/// Advances every state one iteration of the logistic map in lockstep.
#[inline]
fn advance(states: &mut [f64], rates: &[f64]) {
    for (x, &r) in states.iter_mut().zip(rates) {
        *x = logistic_step(r, *x);
    }
}

/// Runs one logistic map per growth rate, discards the transient and records
/// the last `last_n` states of every map.
///
/// Initial states are drawn uniformly from `[0, 1)` using `rng`.
pub fn generate_bifurcation_data<R: Rng + ?Sized>(
    settings: &BifurcationSettings,
    rng: &mut R,
) -> Result<BifurcationDataset> {
    settings.validate()?;
    debug!(
        min_r = settings.min_r,
        max_r = settings.max_r,
        steps = settings.steps,
        last_n = settings.last_n,
        resolution = settings.resolution,
        "sampling bifurcation diagram"
    );

    let rates = settings.growth_rates();
    let mut states: Vec<f64> = (0..settings.resolution).map(|_| rng.gen::<f64>()).collect();

    for _ in 0..settings.steps - settings.last_n {
        advance(&mut states, &rates);
    }

    let total = settings.point_count().unwrap_or_default();
    let mut r_values = Vec::with_capacity(total);
    let mut x_values = Vec::with_capacity(total);
    for _ in 0..settings.last_n {
        advance(&mut states, &rates);
        r_values.extend_from_slice(&rates);
        x_values.extend_from_slice(&states);
    }

    Ok(BifurcationDataset { r_values, x_values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::test_support::assert_invalid_argument;
    use crate::logistic::LogisticMap;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(steps: usize, last_n: usize, resolution: usize) -> BifurcationSettings {
        BifurcationSettings {
            min_r: 2.5,
            max_r: 4.0,
            steps,
            last_n,
            resolution,
        }
    }

    #[test]
    fn default_sweep_has_expected_shape_and_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let data = generate_bifurcation_data(&BifurcationSettings::default(), &mut rng)
            .expect("bifurcation data");
        assert_eq!(data.r_values.len(), 80_000);
        assert_eq!(data.x_values.len(), 80_000);
        assert!(data.r_values.iter().all(|&r| (2.5..=4.0).contains(&r)));
        assert!(data.x_values.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn growth_rates_include_both_endpoints() {
        let rates = settings(10, 1, 4).growth_rates();
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[0], 2.5);
        assert_eq!(rates[3], 4.0);
        assert_abs_diff_eq!(rates[1], 3.0, epsilon = 1e-12);
        assert_eq!(settings(10, 1, 1).growth_rates(), vec![2.5]);
    }

    #[test]
    fn rows_repeat_growth_rates_in_order() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = settings(20, 3, 5);
        let data = generate_bifurcation_data(&s, &mut rng).expect("bifurcation data");
        let rates = s.growth_rates();
        for row in data.r_values.chunks(5) {
            assert_eq!(row, rates.as_slice());
        }
        assert_eq!(data.row(2, 5).map(<[f64]>::len), Some(5));
        assert!(data.row(3, 5).is_none());
    }

    #[test]
    fn batch_matches_scalar_simulation() {
        let s = settings(50, 4, 6);
        let mut rng = StdRng::seed_from_u64(99);
        let data = generate_bifurcation_data(&s, &mut rng).expect("bifurcation data");

        let mut replay = StdRng::seed_from_u64(99);
        let initial: Vec<f64> = (0..6).map(|_| replay.gen::<f64>()).collect();
        for (i, &r) in s.growth_rates().iter().enumerate() {
            let trajectory = LogisticMap::new(r)
                .simulate(initial[i], s.steps + 1)
                .expect("trajectory");
            for row in 0..s.last_n {
                let expected = trajectory[s.steps - s.last_n + row + 1];
                assert_eq!(data.x_values[row * 6 + i], expected);
            }
        }
    }

    #[test]
    fn stable_rates_collapse_to_single_point() {
        let s = BifurcationSettings {
            min_r: 2.0,
            max_r: 2.8,
            steps: 1000,
            last_n: 10,
            resolution: 9,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let data = generate_bifurcation_data(&s, &mut rng).expect("bifurcation data");
        for (r, x) in data.r_values.iter().zip(&data.x_values) {
            assert_abs_diff_eq!(*x, 1.0 - 1.0 / r, epsilon = 1e-9);
        }
    }

    #[test]
    fn same_seed_reproduces_dataset() {
        let s = settings(200, 20, 50);
        let a = generate_bifurcation_data(&s, &mut StdRng::seed_from_u64(5)).expect("data");
        let b = generate_bifurcation_data(&s, &mut StdRng::seed_from_u64(5)).expect("data");
        assert_eq!(a, b);
    }

    #[test]
    fn last_n_equal_to_steps_skips_transient() {
        let mut rng = StdRng::seed_from_u64(11);
        let data = generate_bifurcation_data(&settings(5, 5, 3), &mut rng).expect("data");
        assert_eq!(data.len(), 15);
    }

    #[test]
    fn invalid_settings_fail_fast() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_invalid_argument(
            generate_bifurcation_data(&settings(10, 11, 5), &mut rng),
            "last_n",
        );
        assert_invalid_argument(
            generate_bifurcation_data(&settings(10, 0, 5), &mut rng),
            "last_n",
        );
        assert_invalid_argument(
            generate_bifurcation_data(&settings(10, 5, 0), &mut rng),
            "resolution",
        );
        let reversed = BifurcationSettings {
            min_r: 4.0,
            max_r: 2.5,
            ..BifurcationSettings::default()
        };
        assert_invalid_argument(generate_bifurcation_data(&reversed, &mut rng), "min_r");
    }

    #[test]
    fn oversized_sweep_is_rejected_before_allocating() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_invalid_argument(
            generate_bifurcation_data(&settings(2, 2, usize::MAX), &mut rng),
            "resolution",
        );
        assert_invalid_argument(
            generate_bifurcation_data(&settings(1, 1, usize::MAX), &mut rng),
            "resolution",
        );
        assert!(settings(1, 1, MAX_BIFURCATION_POINTS).validate().is_ok());
        assert!(settings(2, 2, MAX_BIFURCATION_POINTS / 2 + 1).validate().is_err());
    }
}
