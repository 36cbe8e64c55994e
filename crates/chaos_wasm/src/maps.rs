//! Logistic map runners: trajectories, sensitivity, bifurcation sweeps.

use crate::shared::{init, rng_from_seed, settings_from_js, to_js_error};
use chaos_core::analysis::{lyapunov_exponents, LyapunovSettings, LyapunovStepper};
use chaos_core::bifurcation::{generate_bifurcation_data, BifurcationSettings};
use chaos_core::logistic::{LogisticMap, Regime};
use wasm_bindgen::prelude::*;

/// Iterates the logistic map from `x0`; `steps` values with `x0` first.
#[wasm_bindgen]
pub fn simulate_logistic(r: f64, x0: f64, steps: u32) -> Result<Vec<f64>, JsValue> {
    init();
    LogisticMap::new(r)
        .simulate(x0, steps as usize)
        .map_err(|e| to_js_error("Logistic simulation failed", e))
}

/// `"stable"`, `"periodic"` or `"chaotic"`.
#[wasm_bindgen]
pub fn logistic_regime(r: f64) -> String {
    match Regime::classify(r) {
        Regime::Stable => "stable",
        Regime::Periodic => "periodic",
        Regime::Chaotic => "chaotic",
    }
    .to_string()
}

#[wasm_bindgen]
pub struct SensitivityData {
    base: Vec<f64>,
    perturbed: Vec<f64>,
    separation: Vec<f64>,
}

#[wasm_bindgen]
impl SensitivityData {
    #[wasm_bindgen(getter)]
    pub fn base(&self) -> Vec<f64> {
        self.base.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn perturbed(&self) -> Vec<f64> {
        self.perturbed.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn separation(&self) -> Vec<f64> {
        self.separation.clone()
    }
}

#[wasm_bindgen]
pub fn logistic_sensitivity(
    r: f64,
    x0: f64,
    epsilon: f64,
    steps: u32,
) -> Result<SensitivityData, JsValue> {
    init();
    let result = LogisticMap::new(r)
        .sensitivity(x0, epsilon, steps as usize)
        .map_err(|e| to_js_error("Sensitivity experiment failed", e))?;
    Ok(SensitivityData {
        base: result.base,
        perturbed: result.perturbed,
        separation: result.separation,
    })
}

/// Flattened `(r, x)` attractor samples, one row of `resolution` values per
/// recorded iteration.
#[wasm_bindgen]
pub struct BifurcationData {
    r_values: Vec<f64>,
    x_values: Vec<f64>,
}

#[wasm_bindgen]
impl BifurcationData {
    #[wasm_bindgen(getter)]
    pub fn r_values(&self) -> Vec<f64> {
        self.r_values.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn x_values(&self) -> Vec<f64> {
        self.x_values.clone()
    }

    pub fn len(&self) -> usize {
        self.r_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r_values.is_empty()
    }
}

#[wasm_bindgen]
pub fn bifurcation_data(
    min_r: f64,
    max_r: f64,
    steps: u32,
    last_n: u32,
    resolution: u32,
    seed: Option<u32>,
) -> Result<BifurcationData, JsValue> {
    let settings = BifurcationSettings {
        min_r,
        max_r,
        steps: steps as usize,
        last_n: last_n as usize,
        resolution: resolution as usize,
    };
    run_bifurcation(&settings, seed)
}

/// Same as [`bifurcation_data`], configured from a `BifurcationSettings`
/// object (missing object means defaults).
#[wasm_bindgen]
pub fn bifurcation_data_with_settings(
    settings: JsValue,
    seed: Option<u32>,
) -> Result<BifurcationData, JsValue> {
    let settings: BifurcationSettings = settings_from_js(settings)?;
    run_bifurcation(&settings, seed)
}

fn run_bifurcation(
    settings: &BifurcationSettings,
    seed: Option<u32>,
) -> Result<BifurcationData, JsValue> {
    init();
    let mut rng = rng_from_seed(seed);
    let data = generate_bifurcation_data(settings, &mut rng)
        .map_err(|e| to_js_error("Bifurcation sampling failed", e))?;
    Ok(BifurcationData {
        r_values: data.r_values,
        x_values: data.x_values,
    })
}

/// Largest (only) Lyapunov exponent of the logistic map at `r`.
#[wasm_bindgen]
pub fn logistic_lyapunov(r: f64, x0: f64, steps: u32, transient: u32) -> Result<f64, JsValue> {
    init();
    let settings = LyapunovSettings {
        steps: steps as usize,
        dt: 1.0,
        qr_stride: 1,
        transient: transient as usize,
    };
    let exponents = lyapunov_exponents(
        LogisticMap::new(r),
        LyapunovStepper::Discrete,
        &[x0],
        &settings,
    )
    .map_err(|e| to_js_error("Lyapunov computation failed", e))?;
    Ok(exponents[0])
}
