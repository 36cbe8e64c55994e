//! The chaos game: an iterated function system of contractions toward the
//! vertices of a polygon.

use crate::error::require;
use anyhow::Result;
use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

pub type Point2 = Vector2<f64>;

/// Reference points the game contracts toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2>) -> Result<Self> {
        require(!vertices.is_empty(), "vertices", "must not be empty")?;
        require(
            vertices.iter().all(|v| v.x.is_finite() && v.y.is_finite()),
            "vertices",
            "coordinates must be finite",
        )?;
        Ok(Self { vertices })
    }

    /// Unit-side equilateral triangle with its base on the x axis.
    pub fn equilateral_triangle() -> Self {
        Self {
            vertices: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.5, 3.0_f64.sqrt() / 2.0),
            ],
        }
    }

    /// Regular `sides`-gon inscribed in the unit circle, first vertex on top.
    pub fn regular(sides: usize) -> Result<Self> {
        require(sides >= 1, "sides", "must be at least 1")?;
        let step = std::f64::consts::TAU / sides as f64;
        let vertices = (0..sides)
            .map(|k| {
                let angle = std::f64::consts::FRAC_PI_2 + step * k as f64;
                Point2::new(angle.cos(), angle.sin())
            })
            .collect();
        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned `(min, max)` corners of the vertex set.
    pub fn bounds(&self) -> (Point2, Point2) {
        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for v in &self.vertices[1..] {
            min = min.inf(v);
            max = max.sup(v);
        }
        (min, max)
    }
}

impl Default for Polygon {
    fn default() -> Self {
        Self::equilateral_triangle()
    }
}

/// How many leading points are dropped as transient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum BurnIn {
    /// Drop `⌊n_steps * fraction⌋` points.
    Fraction(f64),
    /// Drop a fixed number of points.
    Points(usize),
}

impl BurnIn {
    fn discard(&self, n_steps: usize) -> usize {
        match *self {
            BurnIn::Fraction(fraction) => {
                ((n_steps as f64 * fraction).floor() as usize).min(n_steps)
            }
            BurnIn::Points(count) => count.min(n_steps),
        }
    }
}

impl Default for BurnIn {
    fn default() -> Self {
        BurnIn::Fraction(0.01)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosGameSettings {
    pub n_steps: usize,
    /// Fraction of the remaining distance covered toward the chosen vertex.
    pub compression_factor: f64,
    pub burn_in: BurnIn,
    /// Caps the burn-in so at least this many points survive.
    pub min_retained: usize,
}

impl Default for ChaosGameSettings {
    fn default() -> Self {
        Self {
            n_steps: 10_000,
            compression_factor: 0.5,
            burn_in: BurnIn::default(),
            min_retained: 0,
        }
    }
}

impl ChaosGameSettings {
    pub fn validate(&self) -> Result<()> {
        require(self.n_steps >= 1, "n_steps", "must be at least 1")?;
        require(
            self.compression_factor > 0.0 && self.compression_factor <= 1.0,
            "compression_factor",
            format!("must lie in (0, 1], got {}", self.compression_factor),
        )?;
        if let BurnIn::Fraction(fraction) = self.burn_in {
            require(
                (0.0..=1.0).contains(&fraction),
                "burn_in",
                format!("fraction must lie in [0, 1], got {fraction}"),
            )?;
        }
        Ok(())
    }

    /// Leading points discarded for a run of `n_steps`.
    pub fn discarded(&self) -> usize {
        let discard = self.burn_in.discard(self.n_steps);
        let ceiling = self.n_steps.saturating_sub(self.min_retained);
        discard.min(ceiling)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaosGame {
    pub polygon: Polygon,
}

impl ChaosGame {
    pub fn new(polygon: Polygon) -> Self {
        Self { polygon }
    }

    /// Plays `n_steps` rounds and returns the points left after burn-in, in
    /// generation order.
    ///
    /// The start point is uniform over the bounding box of the vertices and
    /// every vertex choice is drawn from `rng` up front.
    pub fn generate_points<R: Rng + ?Sized>(
        &self,
        settings: &ChaosGameSettings,
        rng: &mut R,
    ) -> Result<Vec<Point2>> {
        settings.validate()?;
        let vertices = self.polygon.vertices();
        require(!vertices.is_empty(), "vertices", "must not be empty")?;
        debug!(
            n_steps = settings.n_steps,
            vertices = vertices.len(),
            compression_factor = settings.compression_factor,
            "playing chaos game"
        );

        let (min, max) = self.polygon.bounds();
        let extent = max - min;
        let mut current = Point2::new(
            min.x + rng.gen::<f64>() * extent.x,
            min.y + rng.gen::<f64>() * extent.y,
        );
        let choices: Vec<usize> = (0..settings.n_steps)
            .map(|_| rng.gen_range(0..vertices.len()))
            .collect();

        let factor = settings.compression_factor;
        let mut points = Vec::with_capacity(settings.n_steps);
        for &index in &choices {
            current += (vertices[index] - current) * factor;
            points.push(current);
        }

        let discard = settings.discarded();
        if discard == points.len() {
            warn!(
                n_steps = settings.n_steps,
                "burn-in discarded every generated point"
            );
        }
        points.drain(..discard);
        Ok(points)
    }
}

/// Estimates the box-counting dimension of a planar point set.
///
/// Boxes are anchored at the lower-left corner of the set; the result is the
/// least-squares slope of `ln N(ε)` against `ln(1/ε)`.
pub fn box_counting_dimension(points: &[Point2], box_sizes: &[f64]) -> Result<f64> {
    require(!points.is_empty(), "points", "must not be empty")?;
    require(
        box_sizes.iter().all(|&s| s.is_finite() && s > 0.0),
        "box_sizes",
        "must be positive",
    )?;
    let mut distinct = box_sizes.to_vec();
    distinct.sort_by(|a, b| a.total_cmp(b));
    distinct.dedup();
    require(distinct.len() >= 2, "box_sizes", "need at least two distinct sizes")?;

    let origin = points.iter().fold(points[0], |acc, p| acc.inf(p));

    let samples: Vec<(f64, f64)> = distinct
        .iter()
        .map(|&size| {
            let occupied: HashSet<(i64, i64)> = points
                .iter()
                .map(|p| {
                    let offset = (p - origin) / size;
                    (offset.x.floor() as i64, offset.y.floor() as i64)
                })
                .collect();
            ((1.0 / size).ln(), (occupied.len() as f64).ln())
        })
        .collect();

    let n = samples.len() as f64;
    let mean_x = samples.iter().map(|s| s.0).sum::<f64>() / n;
    let mean_y = samples.iter().map(|s| s.1).sum::<f64>() / n;
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (x, y) in &samples {
        covariance += (x - mean_x) * (y - mean_y);
        variance += (x - mean_x) * (x - mean_x);
    }
    Ok(covariance / variance)
}
