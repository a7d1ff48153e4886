//! The garden: every plant plus the per-tick update.

use crate::category::Category;
use crate::error::{SimError, SimResult};
use crate::plant::{Plant, MIN_HEALTH, MAX_HEALTH};
use crate::position::{PlantingArea, Position, PositionFinder};
use crate::time::SimTime;
use crate::trigger::EdgeDetector;
use crate::voice::{NoteEvent, VoiceScheduler};
use garden_protocol::Reading;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info};

/// Fraction of the canvas height starter plants are centred on.
const STARTER_ROW: f64 = 0.75;
/// Vertical jitter applied to starter plants.
const STARTER_JITTER: f64 = 30.0;
/// Horizontal placement of the starter plants, one per category.
const STARTER_COLUMNS: [f64; 3] = [0.25, 0.5, 0.75];

/// Garden setup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GardenConfig {
    /// RNG seed for placement. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Canvas width the planting area is derived from.
    pub canvas_width: f64,
    /// Canvas height the planting area is derived from.
    pub canvas_height: f64,
    /// Placement parameters.
    pub positions: PositionFinder,
    /// Fill missing categories before following the conditions.
    pub force_diversity: bool,
    /// Start with one plant of each category.
    pub seed_starter_plants: bool,
}

impl Default for GardenConfig {
    fn default() -> Self {
        GardenConfig {
            seed: None,
            canvas_width: 1280.0,
            canvas_height: 720.0,
            positions: PositionFinder::default(),
            force_diversity: true,
            seed_starter_plants: false,
        }
    }
}

impl GardenConfig {
    /// Reject sizes and parameters the garden cannot work with.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0)
            || !self.canvas_width.is_finite()
            || !self.canvas_height.is_finite()
        {
            return Err(SimError::InvalidCanvas {
                width: self.canvas_width,
                height: self.canvas_height,
            });
        }
        if !(self.positions.min_distance >= 0.0) {
            return Err(SimError::InvalidPlanting {
                name: "min_distance",
                reason: format!("must be non-negative, got {}", self.positions.min_distance),
            });
        }
        Ok(())
    }

    /// Area new plants are placed in.
    pub fn planting_area(&self) -> PlantingArea {
        PlantingArea::for_canvas(self.canvas_width, self.canvas_height)
    }
}

/// A plant was added to the garden.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantedEvent {
    /// Index of the new plant.
    pub index: usize,
    /// Its category.
    pub category: Category,
    /// Where it was placed.
    pub position: Position,
}

/// Everything a tick produced.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Set when the trigger's rising edge planted something.
    pub planted: Option<PlantedEvent>,
    /// Notes due this tick.
    pub notes: Vec<NoteEvent>,
}

/// All plants and the state needed to update them.
#[derive(Debug)]
pub struct Garden {
    plants: Vec<Plant>,
    rng: ChaCha8Rng,
    trigger: EdgeDetector,
    voices: VoiceScheduler,
    config: GardenConfig,
}

impl Garden {
    /// Create an empty garden, or one with starter plants if configured.
    pub fn new(config: GardenConfig) -> SimResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut garden = Garden {
            plants: Vec::new(),
            rng,
            trigger: EdgeDetector::new(),
            voices: VoiceScheduler::new(),
            config,
        };

        if garden.config.seed_starter_plants {
            let (width, height) = (garden.config.canvas_width, garden.config.canvas_height);
            garden.seed_starter_plants(width, height);
        }

        Ok(garden)
    }

    /// Configuration the garden was built with.
    pub fn config(&self) -> &GardenConfig {
        &self.config
    }

    /// Plants in planting order.
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Number of plants.
    pub fn len(&self) -> usize {
        self.plants.len()
    }

    /// Whether nothing has been planted yet.
    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    /// Advance the garden by one tick.
    ///
    /// Existing plants grow and sing first. A rising edge on the trigger then
    /// plants one more, which does not grow until the next tick.
    pub fn tick(&mut self, reading: &Reading, now: SimTime) -> TickOutcome {
        let mut notes = Vec::new();
        for (index, plant) in self.plants.iter_mut().enumerate() {
            plant.grow(reading);
            notes.extend(self.voices.schedule(index, plant, reading, now));
        }

        let planted = if self.trigger.rising(reading.triggered) {
            Some(self.plant(reading, self.config.force_diversity, None))
        } else {
            None
        };

        TickOutcome { planted, notes }
    }

    /// Add a plant now, whatever the trigger says.
    pub fn plant(
        &mut self,
        reading: &Reading,
        force_diversity: bool,
        preferred: Option<Position>,
    ) -> PlantedEvent {
        let existing: Vec<Position> = self.plants.iter().map(Plant::position).collect();
        let area = self.config.planting_area();
        let position = self
            .config
            .positions
            .find(&mut self.rng, &area, &existing, preferred);
        let category = self.choose_category(reading, force_diversity);

        self.plants.push(Plant::new(position, category));
        let index = self.plants.len() - 1;

        debug!(
            index,
            %category,
            x = position.x,
            y = position.y,
            moisture = reading.moisture,
            light = reading.light,
            "planted"
        );

        PlantedEvent {
            index,
            category,
            position,
        }
    }

    /// Category the next plant would get.
    ///
    /// With `force_diversity` the first category (in [`Category::ALL`] order)
    /// that has no plants yet wins; otherwise the conditions decide.
    pub fn choose_category(&self, reading: &Reading, force_diversity: bool) -> Category {
        if force_diversity {
            let counts = self.category_counts();
            if let Some(missing) = Category::ALL.into_iter().find(|c| counts[c.index()] == 0) {
                return missing;
            }
        }
        Category::from_conditions(reading)
    }

    /// Plants per category, indexed by [`Category::index`].
    pub fn category_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for plant in &self.plants {
            counts[plant.category().index()] += 1;
        }
        counts
    }

    /// Mean plant health, or full health for an empty garden.
    pub fn aggregate_health(&self) -> f64 {
        if self.plants.is_empty() {
            return MAX_HEALTH;
        }
        let total: f64 = self.plants.iter().map(Plant::health).sum();
        (total / self.plants.len() as f64).max(MIN_HEALTH)
    }

    /// Plant one of each category across a `width` x `height` canvas.
    pub fn seed_starter_plants(&mut self, width: f64, height: f64) {
        for (category, column) in Category::ALL.into_iter().zip(STARTER_COLUMNS) {
            let jitter = self.rng.gen_range(-STARTER_JITTER..STARTER_JITTER);
            let position = Position::new(width * column, height * STARTER_ROW + jitter);
            self.plants.push(Plant::new(position, category));
        }
        info!(plants = self.plants.len(), "seeded starter plants");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn garden() -> Garden {
        Garden::new(GardenConfig {
            seed: Some(42),
            ..Default::default()
        })
        .unwrap()
    }

    fn reading(moisture: i32, light: i32, triggered: bool) -> Reading {
        Reading::new(moisture, light, triggered)
    }

    #[test]
    fn test_empty_garden() {
        let g = garden();
        assert!(g.is_empty());
        assert_eq!(g.aggregate_health(), 100.0);
        assert_eq!(g.category_counts(), [0, 0, 0]);
    }

    #[test]
    fn test_rising_edge_plants() {
        let mut g = garden();
        let out = g.tick(&reading(500, 500, true), SimTime::ZERO);
        let planted = out.planted.unwrap();
        assert_eq!(planted.index, 0);
        assert_eq!(g.len(), 1);
        // No growth on the tick it was planted
        assert_eq!(g.plants()[0].growth_stage(), 0.0);

        let out = g.tick(&reading(500, 500, true), SimTime::from_millis(16));
        assert!(out.planted.is_none());
        assert_eq!(g.len(), 1);
        assert!(g.plants()[0].growth_stage() > 0.0);
    }

    #[test]
    fn test_force_diversity_fills_in_order() {
        let mut g = garden();
        let bright_dry = reading(300, 800, false);
        assert_eq!(g.plant(&bright_dry, true, None).category, Category::Bass);
        assert_eq!(g.plant(&bright_dry, true, None).category, Category::Melody);
        assert_eq!(g.plant(&bright_dry, true, None).category, Category::Harmony);
        assert_eq!(g.plant(&bright_dry, true, None).category, Category::Melody);
        assert_eq!(g.category_counts(), [1, 2, 1]);
    }

    #[test]
    fn test_conditions_rule_without_diversity() {
        let mut g = garden();
        assert_eq!(g.plant(&reading(800, 300, false), false, None).category, Category::Bass);
        assert_eq!(g.plant(&reading(800, 300, false), false, None).category, Category::Bass);
        assert_eq!(g.category_counts(), [2, 0, 0]);
    }

    #[test]
    fn test_preferred_position() {
        let mut g = garden();
        let area = g.config().planting_area();
        let spot = area.centre();
        let event = g.plant(&Reading::default(), true, Some(spot));
        assert_eq!(event.position, spot);
        assert_eq!(g.plants()[0].position(), spot);
    }

    #[test]
    fn test_starter_plants() {
        let g = Garden::new(GardenConfig {
            seed: Some(1),
            canvas_width: 1000.0,
            canvas_height: 800.0,
            seed_starter_plants: true,
            ..Default::default()
        })
        .unwrap();

        assert_eq!(g.category_counts(), [1, 1, 1]);
        let xs: Vec<f64> = g.plants().iter().map(|p| p.position().x).collect();
        assert_eq!(xs, vec![250.0, 500.0, 750.0]);
        for p in g.plants() {
            assert!((p.position().y - 600.0).abs() <= 30.0);
        }
    }

    #[test]
    fn test_aggregate_health_is_mean() {
        let mut g = garden();
        g.plant(&Reading::default(), true, None);
        g.plant(&Reading::default(), true, None);
        // 500/1023 light deviation per tick for both plants
        g.tick(&reading(500, 200, false), SimTime::ZERO);
        let expected = 100.0 - 0.5 * 500.0 / 1023.0;
        assert!((g.aggregate_health() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Garden::new(GardenConfig {
            canvas_width: 0.0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidCanvas { .. }));

        let err = GardenConfig {
            positions: PositionFinder {
                min_distance: f64::NAN,
                ..Default::default()
            },
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, SimError::InvalidPlanting { name: "min_distance", .. }));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let layout = |seed| {
            let mut g = Garden::new(GardenConfig {
                seed: Some(seed),
                ..Default::default()
            })
            .unwrap();
            for _ in 0..5 {
                g.plant(&Reading::default(), true, None);
            }
            g.plants().iter().map(|p| p.position()).collect::<Vec<_>>()
        };
        assert_eq!(layout(9), layout(9));
    }
}
