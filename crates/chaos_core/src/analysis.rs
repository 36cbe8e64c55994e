//! Lyapunov spectra from the variational equations.

use crate::error::require;
use crate::solvers::{DiscreteMap, Tsit5, RK4};
use crate::traits::{DynamicalSystem, Linearization, Steppable};
use anyhow::{anyhow, Result};
use nalgebra::linalg::QR;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyapunovStepper {
    Rk4,
    Tsit5,
    Discrete,
}

impl LyapunovStepper {
    fn build(self, dim: usize) -> InternalStepper {
        match self {
            LyapunovStepper::Rk4 => InternalStepper::Rk4(RK4::new(dim)),
            LyapunovStepper::Tsit5 => InternalStepper::Tsit5(Tsit5::new(dim)),
            LyapunovStepper::Discrete => InternalStepper::Discrete(DiscreteMap::new(dim)),
        }
    }
}

enum InternalStepper {
    Rk4(RK4<f64>),
    Tsit5(Tsit5<f64>),
    Discrete(DiscreteMap<f64>),
}

impl InternalStepper {
    fn step(
        &mut self,
        system: &impl DynamicalSystem<f64>,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) {
        match self {
            InternalStepper::Rk4(s) => s.step(system, t, state, dt),
            InternalStepper::Tsit5(s) => s.step(system, t, state, dt),
            InternalStepper::Discrete(s) => s.step(system, t, state, dt),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyapunovSettings {
    /// Steps averaged into the exponents.
    pub steps: usize,
    /// Step size; use 1 for maps.
    pub dt: f64,
    /// Steps between re-orthonormalizations.
    pub qr_stride: usize,
    /// Steps run before averaging starts.
    pub transient: usize,
}

impl Default for LyapunovSettings {
    fn default() -> Self {
        Self {
            steps: 10_000,
            dt: 0.01,
            qr_stride: 1,
            transient: 0,
        }
    }
}

/// State plus row-major fundamental matrix, evolved under `Φ' = J(x) Φ`
/// (flows) or `Φ_{n+1} = J(x_n) Φ_n` (maps).
pub struct TangentSystem<S> {
    pub inner: S,
    pub dimension: usize,
    jacobian: RefCell<Vec<f64>>,
}

impl<S> TangentSystem<S> {
    pub fn new(inner: S, dim: usize) -> Self {
        Self {
            inner,
            dimension: dim,
            jacobian: RefCell::new(vec![0.0; dim * dim]),
        }
    }
}

impl<S> DynamicalSystem<f64> for TangentSystem<S>
where
    S: DynamicalSystem<f64> + Linearization,
{
    fn dimension(&self) -> usize {
        let n = self.dimension;
        n + n * n
    }

    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) {
        let n = self.dimension;
        self.inner.apply(t, &x[..n], &mut out[..n]);

        let mut jacobian = self.jacobian.borrow_mut();
        self.inner.jacobian(t, &x[..n], &mut jacobian);

        let phi = &x[n..];
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += jacobian[i * n + k] * phi[k * n + j];
                }
                out[n + i * n + j] = sum;
            }
        }
    }
}

/// Estimates the Lyapunov spectrum by integrating the tangent dynamics and
/// averaging `ln|R_ii|` from periodic QR factorizations.
///
/// Exponents are returned in the order the QR diagonal yields them, which is
/// descending for generic systems.
pub fn lyapunov_exponents<S>(
    system: S,
    solver: LyapunovStepper,
    initial_state: &[f64],
    settings: &LyapunovSettings,
) -> Result<Vec<f64>>
where
    S: DynamicalSystem<f64> + Linearization,
{
    require(!initial_state.is_empty(), "initial_state", "must have positive dimension")?;
    require(
        initial_state.len() == system.dimension(),
        "initial_state",
        format!(
            "expected {} components, got {}",
            system.dimension(),
            initial_state.len()
        ),
    )?;
    require(settings.steps >= 1, "steps", "at least one integration step is required")?;
    require(
        settings.dt.is_finite() && settings.dt > 0.0,
        "dt",
        "step size must be positive",
    )?;
    require(settings.qr_stride >= 1, "qr_stride", "must be at least 1")?;
    debug!(
        steps = settings.steps,
        transient = settings.transient,
        dt = settings.dt,
        solver = ?solver,
        "computing Lyapunov exponents"
    );

    let dim = initial_state.len();
    let aug_dim = dim + dim * dim;
    let mut augmented_state = vec![0.0; aug_dim];
    augmented_state[..dim].copy_from_slice(initial_state);
    reset_identity(&mut augmented_state[dim..], dim);

    let tangent_system = TangentSystem::new(system, dim);
    let mut stepper = solver.build(aug_dim);
    let mut t = 0.0;
    let mut discarded = vec![0.0; dim];

    for step in 1..=settings.transient {
        stepper.step(&tangent_system, &mut t, &mut augmented_state, settings.dt);
        if step % settings.qr_stride == 0 {
            apply_qr(&mut augmented_state[dim..], dim, &mut discarded)?;
        }
    }
    reset_identity(&mut augmented_state[dim..], dim);

    let mut accum = vec![0.0; dim];
    let mut since_last_qr = 0usize;
    for step in 1..=settings.steps {
        stepper.step(&tangent_system, &mut t, &mut augmented_state, settings.dt);
        since_last_qr += 1;
        if since_last_qr == settings.qr_stride || step == settings.steps {
            apply_qr(&mut augmented_state[dim..], dim, &mut accum)?;
            since_last_qr = 0;
        }
    }

    let total_time = settings.steps as f64 * settings.dt;
    for value in &mut accum {
        *value /= total_time;
    }

    Ok(accum)
}

fn reset_identity(phi: &mut [f64], dim: usize) {
    for i in 0..dim {
        for j in 0..dim {
            phi[i * dim + j] = if i == j { 1.0 } else { 0.0 };
        }
    }
}

fn apply_qr(phi_slice: &mut [f64], dim: usize, accum: &mut [f64]) -> Result<()> {
    if phi_slice.len() != dim * dim {
        return Err(anyhow!("Tangent matrix slice has incorrect size."));
    }
    let matrix = DMatrix::from_row_slice(dim, dim, phi_slice);
    let (q, r) = QR::new(matrix).unpack();
    for i in 0..dim {
        let diag = r[(i, i)].abs();
        if diag <= f64::EPSILON || !diag.is_finite() {
            return Err(anyhow!(
                "Encountered degenerate R matrix during orthonormalization (|R[{i},{i}]| = {diag})."
            ));
        }
        accum[i] += diag.ln();
    }
    // nalgebra is column-major; write Q back row by row.
    for i in 0..dim {
        for j in 0..dim {
            phi_slice[i * dim + j] = q[(i, j)];
        }
    }
    Ok(())
}

/// Lyapunov (Kaplan-Yorke) dimension of a spectrum.
pub fn kaplan_yorke(exponents: &[f64]) -> f64 {
    let mut sorted = exponents.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));

    let mut partial = 0.0;
    for (k, &lambda) in sorted.iter().enumerate() {
        if partial + lambda < 0.0 {
            if lambda.abs() <= f64::EPSILON {
                return k as f64;
            }
            return k as f64 + partial / lambda.abs();
        }
        partial += lambda;
    }
    sorted.len() as f64
}
