//! Chaos game runners.

use crate::shared::{init, rng_from_seed, settings_from_js, to_js_error};
use chaos_core::chaos_game::{
    box_counting_dimension, ChaosGame, ChaosGameSettings, Point2, Polygon,
};
use wasm_bindgen::prelude::*;

/// Parses `[x0, y0, x1, y1, ...]` into points.
fn points_from_flat(coords: &[f64]) -> anyhow::Result<Vec<Point2>> {
    if coords.len() % 2 != 0 {
        anyhow::bail!("Coordinates must come in (x, y) pairs, got {} values.", coords.len());
    }
    Ok(coords
        .chunks_exact(2)
        .map(|xy| Point2::new(xy[0], xy[1]))
        .collect())
}

/// Builds a polygon from flat vertex pairs; an empty slice selects the unit
/// equilateral triangle.
fn polygon_from_flat(vertices: &[f64]) -> anyhow::Result<Polygon> {
    if vertices.is_empty() {
        return Ok(Polygon::equilateral_triangle());
    }
    Polygon::new(points_from_flat(vertices)?)
}

fn flatten_points(points: &[Point2]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Plays the chaos game and returns the retained points as
/// `[x0, y0, x1, y1, ...]`.
#[wasm_bindgen]
pub fn chaos_game_points(
    vertices: Vec<f64>,
    n_steps: u32,
    compression_factor: f64,
    seed: Option<u32>,
) -> Result<Vec<f64>, JsValue> {
    let settings = ChaosGameSettings {
        n_steps: n_steps as usize,
        compression_factor,
        ..ChaosGameSettings::default()
    };
    run_chaos_game(&vertices, &settings, seed)
}

/// Like [`chaos_game_points`], configured from a `ChaosGameSettings` object
/// (burn-in policy included).
#[wasm_bindgen]
pub fn chaos_game_points_with_settings(
    vertices: Vec<f64>,
    settings: JsValue,
    seed: Option<u32>,
) -> Result<Vec<f64>, JsValue> {
    let settings: ChaosGameSettings = settings_from_js(settings)?;
    run_chaos_game(&vertices, &settings, seed)
}

fn run_chaos_game(
    vertices: &[f64],
    settings: &ChaosGameSettings,
    seed: Option<u32>,
) -> Result<Vec<f64>, JsValue> {
    init();
    let polygon = polygon_from_flat(vertices).map_err(|e| to_js_error("Invalid polygon", e))?;
    let mut rng = rng_from_seed(seed);
    let points = ChaosGame::new(polygon)
        .generate_points(settings, &mut rng)
        .map_err(|e| to_js_error("Chaos game failed", e))?;
    Ok(flatten_points(&points))
}

/// Box-counting dimension of flattened points over the given box sizes.
#[wasm_bindgen]
pub fn fractal_dimension(points: Vec<f64>, box_sizes: Vec<f64>) -> Result<f64, JsValue> {
    init();
    let points = points_from_flat(&points).map_err(|e| to_js_error("Invalid points", e))?;
    box_counting_dimension(&points, &box_sizes)
        .map_err(|e| to_js_error("Dimension estimate failed", e))
}
