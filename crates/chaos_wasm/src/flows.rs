//! Lorenz flow runners.

use crate::shared::{flatten, init, settings_from_js, to_js_error};
use chaos_core::analysis::{kaplan_yorke, lyapunov_exponents, LyapunovSettings, LyapunovStepper};
use chaos_core::lorenz::{FlowSettings, LorenzParameters, LorenzSystem};
use wasm_bindgen::prelude::*;

fn initial_point(initial: &[f64]) -> Result<[f64; 3], JsValue> {
    <[f64; 3]>::try_from(initial)
        .map_err(|_| JsValue::from_str("Initial state must have exactly 3 components."))
}

/// Integrates the Lorenz equations with RK4 at step `dt`.
///
/// Returns `[x0, y0, z0, x1, y1, z1, ...]`, one triple per sample of the grid
/// `0, dt, 2dt, ...` below `duration`.
#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn simulate_lorenz(
    sigma: f64,
    rho: f64,
    beta: f64,
    x0: f64,
    y0: f64,
    z0: f64,
    duration: f64,
    dt: f64,
) -> Result<Vec<f64>, JsValue> {
    let settings = FlowSettings {
        duration,
        dt,
        ..FlowSettings::default()
    };
    run_lorenz(LorenzParameters { sigma, rho, beta }, [x0, y0, z0], &settings)
}

/// Like [`simulate_lorenz`], taking `LorenzParameters` and `FlowSettings`
/// objects; either may be omitted to use the defaults.
#[wasm_bindgen]
pub fn simulate_lorenz_with_settings(
    params: JsValue,
    initial: Vec<f64>,
    settings: JsValue,
) -> Result<Vec<f64>, JsValue> {
    let params: LorenzParameters = settings_from_js(params)?;
    let settings: FlowSettings = settings_from_js(settings)?;
    run_lorenz(params, initial_point(&initial)?, &settings)
}

fn run_lorenz(
    params: LorenzParameters,
    initial: [f64; 3],
    settings: &FlowSettings,
) -> Result<Vec<f64>, JsValue> {
    init();
    let trajectory = LorenzSystem::new(params)
        .simulate(initial, settings)
        .map_err(|e| to_js_error("Lorenz integration failed", e))?;
    Ok(flatten(trajectory))
}

/// Flattened equilibria of the Lorenz system.
#[wasm_bindgen]
pub fn lorenz_fixed_points(sigma: f64, rho: f64, beta: f64) -> Vec<f64> {
    flatten(LorenzSystem::new(LorenzParameters { sigma, rho, beta }).fixed_points())
}

/// The three Lyapunov exponents followed by the Kaplan-Yorke dimension.
#[allow(clippy::too_many_arguments)]
#[wasm_bindgen]
pub fn lorenz_lyapunov(
    sigma: f64,
    rho: f64,
    beta: f64,
    initial: Vec<f64>,
    steps: u32,
    dt: f64,
    qr_stride: u32,
    transient: u32,
) -> Result<Vec<f64>, JsValue> {
    init();
    let start = initial_point(&initial)?;
    let settings = LyapunovSettings {
        steps: steps as usize,
        dt,
        qr_stride: qr_stride.max(1) as usize,
        transient: transient as usize,
    };
    let mut exponents = lyapunov_exponents(
        LorenzSystem::new(LorenzParameters { sigma, rho, beta }),
        LyapunovStepper::Rk4,
        &start,
        &settings,
    )
    .map_err(|e| to_js_error("Lyapunov computation failed", e))?;
    let dimension = kaplan_yorke(&exponents);
    exponents.push(dimension);
    Ok(exponents)
}
