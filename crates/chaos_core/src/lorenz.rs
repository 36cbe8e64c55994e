//! The Lorenz convection model and its time integration.

use crate::error::require;
use crate::solvers::{Tsit5, RK4};
use crate::traits::{DynamicalSystem, Linearization, Scalar, Steppable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Parameters for the Lorenz system
///
/// - σ (sigma): Prandtl number
/// - ρ (rho): Rayleigh number; the butterfly attractor appears above ρ ≈ 24.74
///   with the default σ and β
/// - β (beta): geometric factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LorenzParameters {
    pub sigma: f64,
    pub rho: f64,
    pub beta: f64,
}

impl Default for LorenzParameters {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSolver {
    #[default]
    Rk4,
    Tsit5,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Total simulated time; samples cover `[0, duration)`.
    pub duration: f64,
    /// Spacing of the output time grid.
    pub dt: f64,
    /// Solver steps taken between consecutive output samples.
    pub substeps: usize,
    pub solver: FlowSolver,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            duration: 30.0,
            dt: 0.01,
            substeps: 1,
            solver: FlowSolver::Rk4,
        }
    }
}

/// Upper bound on the output grid, so the trajectory buffer stays allocatable.
pub const MAX_FLOW_SAMPLES: usize = 1 << 24;

impl FlowSettings {
    pub fn validate(&self) -> Result<()> {
        require(
            self.duration.is_finite() && self.duration > 0.0,
            "duration",
            "must be positive",
        )?;
        require(self.dt.is_finite() && self.dt > 0.0, "dt", "must be positive")?;
        require(self.substeps >= 1, "substeps", "must be at least 1")?;
        let samples = (self.duration / self.dt).ceil();
        require(
            samples.is_finite() && samples <= MAX_FLOW_SAMPLES as f64,
            "duration",
            format!("duration / dt = {samples} exceeds {MAX_FLOW_SAMPLES} samples"),
        )?;
        Ok(())
    }

    /// Number of samples on the grid `0, dt, 2dt, ...` below `duration`.
    /// Only meaningful once [`FlowSettings::validate`] has passed.
    pub fn sample_count(&self) -> usize {
        (self.duration / self.dt).ceil() as usize
    }

    pub fn sample_times(&self) -> Vec<f64> {
        (0..self.sample_count()).map(|i| i as f64 * self.dt).collect()
    }
}

pub type Point3 = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LorenzSystem {
    pub params: LorenzParameters,
}

impl LorenzSystem {
    pub fn new(params: LorenzParameters) -> Self {
        Self { params }
    }

    /// Integrates the flow from `initial`, one state per output sample.
    ///
    /// The first sample is `initial`. Blow-up for extreme parameters is
    /// reported as non-finite samples, never clamped.
    pub fn simulate(&self, initial: Point3, settings: &FlowSettings) -> Result<Vec<Point3>> {
        settings.validate()?;
        let samples = settings.sample_count();
        debug!(
            sigma = self.params.sigma,
            rho = self.params.rho,
            beta = self.params.beta,
            samples,
            dt = settings.dt,
            solver = ?settings.solver,
            "integrating Lorenz flow"
        );

        let trajectory = match settings.solver {
            FlowSolver::Rk4 => self.integrate(RK4::new(3), initial, settings, samples),
            FlowSolver::Tsit5 => self.integrate(Tsit5::new(3), initial, settings, samples),
        };

        if let Some(index) = trajectory
            .iter()
            .position(|p| p.iter().any(|v| !v.is_finite()))
        {
            warn!(index, "Lorenz trajectory left the finite range");
        }
        Ok(trajectory)
    }

    fn integrate(
        &self,
        mut stepper: impl Steppable<f64>,
        initial: Point3,
        settings: &FlowSettings,
        samples: usize,
    ) -> Vec<Point3> {
        let h = settings.dt / settings.substeps as f64;
        let mut trajectory = Vec::with_capacity(samples);
        let mut state = initial;
        trajectory.push(state);
        for i in 1..samples {
            let mut t = (i - 1) as f64 * settings.dt;
            for _ in 0..settings.substeps {
                stepper.step(self, &mut t, &mut state, h);
            }
            trajectory.push(state);
        }
        trajectory
    }

    /// Equilibria: the origin, plus C± when ρ > 1.
    pub fn fixed_points(&self) -> Vec<Point3> {
        let LorenzParameters { rho, beta, .. } = self.params;
        if rho <= 1.0 {
            return vec![[0.0, 0.0, 0.0]];
        }
        let c = (beta * (rho - 1.0)).sqrt();
        vec![[0.0, 0.0, 0.0], [c, c, rho - 1.0], [-c, -c, rho - 1.0]]
    }
}

impl<T: Scalar> DynamicalSystem<T> for LorenzSystem {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: T, s: &[T], out: &mut [T]) {
        let p = |v: f64| T::from_f64(v).unwrap_or_else(T::nan);
        let (sigma, rho, beta) = (p(self.params.sigma), p(self.params.rho), p(self.params.beta));
        let (x, y, z) = (s[0], s[1], s[2]);
        out[0] = sigma * (y - x);
        out[1] = x * (rho - z) - y;
        out[2] = x * y - beta * z;
    }
}

impl Linearization for LorenzSystem {
    fn jacobian(&self, _t: f64, s: &[f64], out: &mut [f64]) {
        let LorenzParameters { sigma, rho, beta } = self.params;
        let (x, y, z) = (s[0], s[1], s[2]);
        out.copy_from_slice(&[
            -sigma, sigma, 0.0, //
            rho - z, -1.0, -x, //
            y, x, -beta,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::test_support::assert_invalid_argument;
    use approx::assert_abs_diff_eq;

    fn settings(duration: f64, dt: f64) -> FlowSettings {
        FlowSettings {
            duration,
            dt,
            ..FlowSettings::default()
        }
    }

    #[test]
    fn classic_parameters_give_3000_finite_samples() {
        let system = LorenzSystem::default();
        let trajectory = system
            .simulate([1.0, 1.0, 1.0], &FlowSettings::default())
            .expect("trajectory");
        assert_eq!(trajectory.len(), 3000);
        assert_eq!(trajectory[0], [1.0, 1.0, 1.0]);
        assert!(trajectory.iter().flatten().all(|v| v.is_finite()));
        assert!(trajectory.iter().flatten().all(|v| v.abs() < 100.0));
    }

    #[test]
    fn sample_count_follows_ceil_of_duration_over_dt() {
        assert_eq!(settings(0.3, 0.1).sample_count(), 3);
        assert_eq!(settings(1.05, 0.1).sample_count(), 11);
        assert_eq!(settings(0.005, 0.01).sample_count(), 1);
        let times = settings(1.0, 0.25).sample_times();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn derivative_rule_matches_equations() {
        let system = LorenzSystem::new(LorenzParameters {
            sigma: 2.0,
            rho: 5.0,
            beta: 0.5,
        });
        let mut out = [0.0; 3];
        DynamicalSystem::<f64>::apply(&system, 0.0, &[1.0, 3.0, 2.0], &mut out);
        assert_eq!(out, [4.0, 0.0, 2.0]);
    }

    #[test]
    fn zero_rayleigh_number_decays_to_origin() {
        let params = LorenzParameters {
            rho: 0.0,
            ..LorenzParameters::default()
        };
        let trajectory = LorenzSystem::new(params)
            .simulate([1.0, 1.0, 1.0], &FlowSettings::default())
            .expect("trajectory");
        for pair in trajectory.windows(2) {
            assert!(pair[1][2] <= pair[0][2], "z increased: {:?}", pair);
        }
        let last = trajectory[trajectory.len() - 1];
        assert!(last[2].abs() < 1e-10);
    }

    #[test]
    fn subcritical_rayleigh_number_settles_on_fixed_point() {
        let system = LorenzSystem::new(LorenzParameters {
            rho: 14.0,
            ..LorenzParameters::default()
        });
        let trajectory = system
            .simulate([1.0, 1.0, 1.0], &settings(50.0, 0.01))
            .expect("trajectory");
        let last = trajectory[trajectory.len() - 1];
        let target = system.fixed_points()[1];
        for k in 0..3 {
            assert_abs_diff_eq!(last[k], target[k], epsilon = 1e-4);
        }
    }

    #[test]
    fn fixed_points_have_zero_velocity() {
        let system = LorenzSystem::default();
        let points = system.fixed_points();
        assert_eq!(points.len(), 3);
        for point in points {
            let mut out = [0.0; 3];
            DynamicalSystem::<f64>::apply(&system, 0.0, &point, &mut out);
            for v in out {
                assert!(v.abs() < 1e-10);
            }
        }
        let below = LorenzSystem::new(LorenzParameters {
            rho: 0.5,
            ..LorenzParameters::default()
        });
        assert_eq!(below.fixed_points(), vec![[0.0, 0.0, 0.0]]);
    }

    #[test]
    fn rk4_and_tsit5_agree_on_short_horizon() {
        let system = LorenzSystem::default();
        let rk4 = system
            .simulate([1.0, 1.0, 1.0], &settings(1.0, 0.001))
            .expect("rk4 trajectory");
        let tsit5 = system
            .simulate(
                [1.0, 1.0, 1.0],
                &FlowSettings {
                    solver: FlowSolver::Tsit5,
                    ..settings(1.0, 0.001)
                },
            )
            .expect("tsit5 trajectory");
        assert_eq!(rk4.len(), tsit5.len());
        for (a, b) in rk4.iter().zip(&tsit5) {
            for k in 0..3 {
                assert_abs_diff_eq!(a[k], b[k], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn substeps_refine_without_changing_the_grid() {
        let system = LorenzSystem::default();
        let coarse = system
            .simulate([1.0, 1.0, 1.0], &settings(2.0, 0.02))
            .expect("trajectory");
        let fine = system
            .simulate(
                [1.0, 1.0, 1.0],
                &FlowSettings {
                    substeps: 4,
                    ..settings(2.0, 0.02)
                },
            )
            .expect("trajectory");
        assert_eq!(coarse.len(), 100);
        assert_eq!(fine.len(), 100);
        for k in 0..3 {
            assert_abs_diff_eq!(coarse[99][k], fine[99][k], epsilon = 2e-2);
        }
    }

    #[test]
    fn simulate_is_bit_reproducible() {
        let system = LorenzSystem::default();
        let a = system.simulate([0.5, -1.0, 2.0], &settings(5.0, 0.01)).expect("a");
        let b = system.simulate([0.5, -1.0, 2.0], &settings(5.0, 0.01)).expect("b");
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_time_grid_is_rejected() {
        let system = LorenzSystem::default();
        assert_invalid_argument(system.simulate([1.0; 3], &settings(0.0, 0.01)), "duration");
        assert_invalid_argument(system.simulate([1.0; 3], &settings(10.0, -0.01)), "dt");
        assert_invalid_argument(
            system.simulate(
                [1.0; 3],
                &FlowSettings {
                    substeps: 0,
                    ..FlowSettings::default()
                },
            ),
            "substeps",
        );
    }

    #[test]
    fn oversized_time_grid_is_rejected_before_allocating() {
        let system = LorenzSystem::default();
        assert_invalid_argument(system.simulate([1.0; 3], &settings(1e30, 1e-3)), "duration");
        assert_invalid_argument(system.simulate([1.0; 3], &settings(1.0, 1e-320)), "duration");
        let limit = settings(MAX_FLOW_SAMPLES as f64, 1.0);
        assert!(limit.validate().is_ok());
        assert!(settings(MAX_FLOW_SAMPLES as f64 + 1.0, 1.0).validate().is_err());
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let value = serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(
            std::iter::once(("duration", 5.0_f64)),
        );
        let parsed = FlowSettings::deserialize(value).expect("settings");
        assert_eq!(parsed.duration, 5.0);
        assert_eq!(parsed.dt, 0.01);
        assert_eq!(parsed.solver, FlowSolver::Rk4);
    }
}
