//! Helpers shared by the exported runners.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// Installs the panic hook once per module instance.
pub(crate) fn init() {
    console_error_panic_hook::set_once();
}

/// A seeded generator when the caller supplies a seed, an entropy-seeded one
/// otherwise.
pub(crate) fn rng_from_seed(seed: Option<u32>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(u64::from(seed)),
        None => StdRng::from_entropy(),
    }
}

pub(crate) fn to_js_error(context: &str, err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{context}: {err:#}"))
}

/// Reads an optional settings object, falling back to `T::default()`.
pub(crate) fn settings_from_js<T>(value: JsValue) -> Result<T, JsValue>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| JsValue::from_str(&format!("Invalid settings: {err}")))
}

pub(crate) fn flatten<const N: usize>(points: impl IntoIterator<Item = [f64; N]>) -> Vec<f64> {
    points.into_iter().flatten().collect()
}
