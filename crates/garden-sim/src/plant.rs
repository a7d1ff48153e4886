//! A single plant and its growth model.

use crate::category::Category;
use crate::position::Position;
use crate::time::SimTime;
use chrono::{DateTime, Utc};
use garden_protocol::{Reading, SENSOR_MAX};

/// Growth added per tick under perfect conditions is `GROWTH_RATE * 2`.
pub const GROWTH_RATE: f64 = 0.02;
/// Fully grown stage. Growth stops once reached.
pub const MAX_GROWTH_STAGE: f64 = 6.0;
/// Health of a freshly planted plant.
pub const MAX_HEALTH: f64 = 100.0;
/// Health never drops below this.
pub const MIN_HEALTH: f64 = 1.0;
/// Moisture every plant is healthiest at, regardless of category.
pub const HEALTHY_MOISTURE: i32 = 500;
/// Light every plant is healthiest at, regardless of category.
pub const HEALTHY_LIGHT: i32 = 700;
/// Health lost per tick per unit of normalised deviation.
pub const HEALTH_DECAY: f64 = 0.5;

/// A plant in the garden.
#[derive(Debug, Clone)]
pub struct Plant {
    position: Position,
    category: Category,
    growth_stage: f64,
    health: f64,
    created_at: DateTime<Utc>,
    /// When the plant last sang.
    pub(crate) last_played: SimTime,
}

impl Plant {
    /// Create a seedling at `position`.
    pub fn new(position: Position, category: Category) -> Self {
        Plant {
            position,
            category,
            growth_stage: 0.0,
            health: MAX_HEALTH,
            created_at: Utc::now(),
            last_played: SimTime::ZERO,
        }
    }

    /// Where the plant stands.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The plant's category, fixed at creation.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Growth stage in `0.0..=6.0`.
    pub fn growth_stage(&self) -> f64 {
        self.growth_stage
    }

    /// Health in `1.0..=100.0`.
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Wall clock time the plant was planted.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the plant reached its final stage.
    pub fn is_fully_grown(&self) -> bool {
        self.growth_stage >= MAX_GROWTH_STAGE
    }

    /// Whole growth stage, as used to pick a sprite frame.
    pub fn stage_index(&self) -> u8 {
        self.growth_stage.floor() as u8
    }

    /// Display scale driven by health, from 0.7 (sickly) to 1.0 (healthy).
    pub fn size_factor(&self) -> f64 {
        0.7 + 0.3 * (self.health / MAX_HEALTH)
    }

    /// Advance growth and health by one tick.
    ///
    /// Growth depends on how close conditions are to this category's ideal and
    /// stops at stage 6. Health is judged against one fixed target for every
    /// category and keeps decaying even after growth has stopped.
    pub fn grow(&mut self, reading: &Reading) {
        if self.growth_stage < MAX_GROWTH_STAGE {
            let (ideal_moisture, ideal_light) = self.category.ideal_conditions();
            let moisture_factor = 1.0 - deviation(reading.moisture, ideal_moisture);
            let light_factor = 1.0 - deviation(reading.light, ideal_light);

            let growth = GROWTH_RATE * moisture_factor * light_factor * 2.0;
            self.growth_stage = (self.growth_stage + growth).clamp(0.0, MAX_GROWTH_STAGE);
        }

        let moisture_diff = deviation(reading.moisture, HEALTHY_MOISTURE);
        let light_diff = deviation(reading.light, HEALTHY_LIGHT);
        self.health = (self.health - (moisture_diff + light_diff) * HEALTH_DECAY)
            .clamp(MIN_HEALTH, MAX_HEALTH);
    }
}

/// Distance from `target` as a fraction of full sensor scale.
///
/// Computed in floating point: raw readings are unclamped and may sit
/// anywhere in `i32`.
fn deviation(value: i32, target: i32) -> f64 {
    (f64::from(value) - f64::from(target)).abs() / f64::from(SENSOR_MAX)
}
