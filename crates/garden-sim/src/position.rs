//! Choosing where a new plant goes.
//!
//! New plants should not overlap existing ones. The finder tries a preferred
//! spot first, then random spots, and finally settles for the most isolated
//! of a few random samples. It always returns a position.

use rand::Rng;
use serde::Deserialize;

/// A point on the garden canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate, growing downwards.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Height reserved for the status panel at the bottom of the canvas.
pub const UI_PANEL_HEIGHT: f64 = 70.0;
/// Extra gap kept above the status panel.
pub const PANEL_MARGIN: f64 = 20.0;

/// The rectangle plants may be placed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantingArea {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl PlantingArea {
    /// Soil band of a `width` x `height` canvas: the middle 80% horizontally,
    /// from 60% of the height down to just above the status panel.
    pub fn for_canvas(width: f64, height: f64) -> Self {
        PlantingArea {
            min_x: width * 0.1,
            max_x: width * 0.9,
            min_y: height * 0.6,
            max_y: height - UI_PANEL_HEIGHT - PANEL_MARGIN,
        }
    }

    /// Whether `p` lies strictly inside the area vertically and within it horizontally.
    pub fn contains(&self, p: &Position) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y > self.min_y && p.y < self.max_y
    }

    /// Centre of the area.
    pub fn centre(&self) -> Position {
        Position::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// A uniformly random point in the area.
    ///
    /// Degenerate (zero or negative size) axes collapse to their minimum.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position::new(
            sample_axis(rng, self.min_x, self.max_x),
            sample_axis(rng, self.min_y, self.max_y),
        )
    }
}

fn sample_axis<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Parameters for placing new plants.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PositionFinder {
    /// Minimum distance to any existing plant.
    pub min_distance: f64,
    /// Random candidates tried before falling back.
    pub max_attempts: usize,
    /// Random samples considered by the fallback.
    pub fallback_samples: usize,
}

impl Default for PositionFinder {
    fn default() -> Self {
        PositionFinder {
            min_distance: 80.0,
            max_attempts: 20,
            fallback_samples: 10,
        }
    }
}

impl PositionFinder {
    /// Whether `candidate` is closer than `min_distance` to any existing plant.
    pub fn is_too_close(&self, candidate: &Position, existing: &[Position]) -> bool {
        existing
            .iter()
            .any(|p| candidate.distance(p) < self.min_distance)
    }

    /// Find a spot for a new plant.
    pub fn find<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        area: &PlantingArea,
        existing: &[Position],
        preferred: Option<Position>,
    ) -> Position {
        if let Some(p) = preferred {
            if area.contains(&p) && !self.is_too_close(&p, existing) {
                return p;
            }
        }

        for _ in 0..self.max_attempts {
            let candidate = area.sample(rng);
            if !self.is_too_close(&candidate, existing) {
                return candidate;
            }
        }

        self.most_isolated(rng, area, existing)
    }

    /// Best of `fallback_samples` random points by distance to the nearest plant.
    fn most_isolated<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        area: &PlantingArea,
        existing: &[Position],
    ) -> Position {
        let mut best = area.centre();
        let mut best_clearance = 0.0;

        for _ in 0..self.fallback_samples {
            let candidate = area.sample(rng);
            let clearance = existing
                .iter()
                .map(|p| candidate.distance(p))
                .fold(f64::INFINITY, f64::min);

            if clearance > best_clearance {
                best_clearance = clearance;
                best = candidate;
            }
        }

        tracing::debug!(
            x = best.x,
            y = best.y,
            clearance = best_clearance,
            "no free spot found, using most isolated sample"
        );
        best
    }
}
