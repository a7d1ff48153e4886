//! Plant categories.
//!
//! A plant's category is fixed when it is planted. It decides which growing
//! conditions the plant prefers and which voice it sings with.

use garden_protocol::Reading;
use std::fmt;

/// Light above this counts as bright when picking a category.
pub const BRIGHT_LIGHT: i32 = 700;
/// Light below this counts as dim when picking a category.
pub const DIM_LIGHT: i32 = 400;
/// Moisture above this counts as wet when picking a category.
pub const WET_SOIL: i32 = 700;
/// Moisture below this counts as dry when picking a category.
pub const DRY_SOIL: i32 = 400;

/// Behavioural class of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Trees: wet soil, low light, low single notes.
    Bass,
    /// Flowers: dry soil, bright light, short phrases.
    Melody,
    /// Small plants: balanced conditions, chords.
    Harmony,
}

impl Category {
    /// All categories, in diversity fill order.
    pub const ALL: [Category; 3] = [Category::Bass, Category::Melody, Category::Harmony];

    /// Position in [`ALL`](Self::ALL).
    pub fn index(&self) -> usize {
        match self {
            Category::Bass => 0,
            Category::Melody => 1,
            Category::Harmony => 2,
        }
    }

    /// Preferred `(moisture, light)` for growth.
    pub fn ideal_conditions(&self) -> (i32, i32) {
        match self {
            Category::Bass => (700, 400),
            Category::Melody => (300, 800),
            Category::Harmony => (500, 500),
        }
    }

    /// Pick a category from current conditions.
    ///
    /// Bright and dry grows melody, wet and dim grows bass, anything else harmony.
    pub fn from_conditions(reading: &Reading) -> Category {
        if reading.light > BRIGHT_LIGHT && reading.moisture < DRY_SOIL {
            Category::Melody
        } else if reading.moisture > WET_SOIL && reading.light < DIM_LIGHT {
            Category::Bass
        } else {
            Category::Harmony
        }
    }

    /// Single letter shown next to the plant.
    pub fn label(&self) -> char {
        match self {
            Category::Bass => 'B',
            Category::Melody => 'M',
            Category::Harmony => 'H',
        }
    }

    /// Minimum time between two notes from a plant of this category (ms).
    pub fn play_interval_ms(&self) -> u64 {
        2000 + self.index() as u64 * 1000
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Bass => write!(f, "bass"),
            Category::Melody => write!(f, "melody"),
            Category::Harmony => write!(f, "harmony"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conditions() {
        assert_eq!(Category::from_conditions(&Reading::new(300, 800, false)), Category::Melody);
        assert_eq!(Category::from_conditions(&Reading::new(800, 300, false)), Category::Bass);
        assert_eq!(Category::from_conditions(&Reading::new(500, 500, false)), Category::Harmony);
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Exactly on the thresholds is not enough
        assert_eq!(Category::from_conditions(&Reading::new(399, 700, false)), Category::Harmony);
        assert_eq!(Category::from_conditions(&Reading::new(700, 399, false)), Category::Harmony);
    }

    #[test]
    fn test_play_intervals() {
        assert_eq!(Category::Bass.play_interval_ms(), 2000);
        assert_eq!(Category::Melody.play_interval_ms(), 3000);
        assert_eq!(Category::Harmony.play_interval_ms(), 4000);
    }

    #[test]
    fn test_index_matches_all() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
