//! Note scheduling.
//!
//! Plants sing once they pass stage 1. Each category has its own pitch table,
//! phrasing and minimum interval between notes. This module only decides
//! *what* to play and *when*; turning a [`NoteEvent`] into sound is left to
//! whatever audio backend consumes the events.

use crate::category::Category;
use crate::plant::{Plant, MAX_HEALTH};
use crate::time::SimTime;
use garden_protocol::{Reading, SENSOR_MAX};

/// Stage a plant must exceed before it makes any sound.
pub const SINGING_STAGE: f64 = 1.0;
/// Melody plants above this stage answer their first note with a second one.
pub const PHRASE_STAGE: f64 = 2.0;
/// Upper end of the stage range mapped onto a pitch table.
pub const PITCH_MAP_TOP_STAGE: f64 = 7.0;
/// Delay before the answering note of a melody phrase.
pub const PHRASE_GAP_MS: u64 = 200;

/// Quietest and loudest volume, mapped from health.
pub const VOLUME_RANGE_DB: (f64, f64) = (-30.0, -15.0);
/// Bass filter cutoff range, mapped from light.
pub const BASS_CUTOFF_RANGE_HZ: (f64, f64) = (200.0, 2000.0);

const BASS_NOTES: &[&[&str]] = &[&["C2"], &["E2"], &["G2"], &["A2"], &["C3"]];
const MELODY_NOTES: &[&[&str]] = &[&["C4"], &["D4"], &["E4"], &["G4"], &["A4"], &["C5"]];
const HARMONY_CHORDS: &[&[&str]] = &[
    &["C3", "E3", "G3"],
    &["A2", "C3", "E3"],
    &["F3", "A3", "C4"],
    &["G3", "B3", "D4"],
];

/// Musical length of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteValue {
    /// Half note (`2n`).
    Half,
    /// Eighth note (`8n`).
    Eighth,
    /// Sixteenth note (`16n`).
    Sixteenth,
}

impl NoteValue {
    /// Transport notation.
    pub fn notation(&self) -> &'static str {
        match self {
            NoteValue::Half => "2n",
            NoteValue::Eighth => "8n",
            NoteValue::Sixteenth => "16n",
        }
    }
}

/// One note or chord to be played.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEvent {
    /// Index of the singing plant in the garden.
    pub plant_index: usize,
    /// Category of the singing plant.
    pub category: Category,
    /// Pitches to sound together.
    pub pitches: &'static [&'static str],
    /// Note length.
    pub value: NoteValue,
    /// Delay from the tick that produced the event.
    pub offset_ms: u64,
    /// Output volume.
    pub volume_db: f64,
    /// Low-pass cutoff for bass voices.
    pub filter_cutoff_hz: Option<f64>,
}

/// Linear map of `value` from one range onto another, without clamping.
pub fn map_range(value: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    to.0 + (value - from.0) * (to.1 - to.0) / (from.1 - from.0)
}

/// Pitch table for a category.
pub fn pitch_table(category: Category) -> &'static [&'static [&'static str]] {
    match category {
        Category::Bass => BASS_NOTES,
        Category::Melody => MELODY_NOTES,
        Category::Harmony => HARMONY_CHORDS,
    }
}

/// Index into `table_len` pitches for a growth stage.
pub fn pitch_index(growth_stage: f64, table_len: usize) -> usize {
    let top = table_len.saturating_sub(1);
    let mapped = map_range(
        growth_stage,
        (SINGING_STAGE, PITCH_MAP_TOP_STAGE),
        (0.0, top as f64),
    );
    (mapped.floor().max(0.0) as usize).min(top)
}

/// Decides when each plant sings.
#[derive(Debug, Clone, Default)]
pub struct VoiceScheduler;

impl VoiceScheduler {
    /// Create a scheduler.
    pub fn new() -> Self {
        VoiceScheduler
    }

    /// Notes `plant` should play at `now`, updating its last-played time.
    ///
    /// A plant's interval timer restarts whenever it is due, even if it is still
    /// too young to make a sound.
    pub fn schedule(
        &self,
        plant_index: usize,
        plant: &mut Plant,
        reading: &Reading,
        now: SimTime,
    ) -> Vec<NoteEvent> {
        let category = plant.category();
        if now.saturating_sub(plant.last_played) <= category.play_interval_ms() {
            return Vec::new();
        }
        plant.last_played = now;

        let stage = plant.growth_stage();
        if stage <= SINGING_STAGE {
            return Vec::new();
        }

        let table = pitch_table(category);
        let index = pitch_index(stage, table.len());
        let volume_db = map_range(plant.health(), (0.0, MAX_HEALTH), VOLUME_RANGE_DB);
        let note = |pitches, value, offset_ms, filter_cutoff_hz| NoteEvent {
            plant_index,
            category,
            pitches,
            value,
            offset_ms,
            volume_db,
            filter_cutoff_hz,
        };

        match category {
            Category::Bass => {
                let cutoff = map_range(
                    reading.light as f64,
                    (0.0, SENSOR_MAX as f64),
                    BASS_CUTOFF_RANGE_HZ,
                );
                vec![note(table[index], NoteValue::Eighth, 0, Some(cutoff))]
            }
            Category::Melody if stage > PHRASE_STAGE => {
                let answer = (index + 2) % table.len();
                vec![
                    note(table[index], NoteValue::Sixteenth, 0, None),
                    note(table[answer], NoteValue::Eighth, PHRASE_GAP_MS, None),
                ]
            }
            Category::Melody => vec![note(table[index], NoteValue::Eighth, 0, None)],
            Category::Harmony => vec![note(table[index], NoteValue::Half, 0, None)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use approx::assert_relative_eq;

    fn grown(category: Category, reading: Reading, ticks: usize) -> Plant {
        let mut plant = Plant::new(Position::new(0.0, 0.0), category);
        for _ in 0..ticks {
            plant.grow(&reading);
        }
        plant
    }

    #[test]
    fn test_map_range() {
        assert_eq!(map_range(50.0, (0.0, 100.0), (-30.0, -15.0)), -22.5);
        assert_eq!(map_range(1023.0, (0.0, 1023.0), (200.0, 2000.0)), 2000.0);
    }

    #[test]
    fn test_pitch_index() {
        assert_eq!(pitch_index(1.0, 5), 0);
        assert_eq!(pitch_index(4.0, 5), 2);
        assert_eq!(pitch_index(6.0, 5), 3);
        assert_eq!(pitch_index(6.0, 6), 4);
        assert_eq!(pitch_index(100.0, 4), 3);
        assert_eq!(pitch_index(0.0, 4), 0);
    }

    #[test]
    fn test_seedling_is_silent() {
        let scheduler = VoiceScheduler::new();
        let mut plant = Plant::new(Position::new(0.0, 0.0), Category::Bass);
        let notes = scheduler.schedule(0, &mut plant, &Reading::default(), SimTime::from_millis(10_000));
        assert!(notes.is_empty());
        assert_eq!(plant.last_played, SimTime::from_millis(10_000));
    }

    #[test]
    fn test_bass_note_with_cutoff() {
        let scheduler = VoiceScheduler::new();
        let reading = Reading::new(700, 400, false);
        // 50 ticks at ideal conditions: stage 2.0
        let mut plant = grown(Category::Bass, reading, 50);
        let notes = scheduler.schedule(3, &mut plant, &reading, SimTime::from_millis(2001));

        assert_eq!(notes.len(), 1);
        let note = &notes[0];
        assert_eq!(note.plant_index, 3);
        assert_eq!(note.value, NoteValue::Eighth);
        assert_eq!(note.pitches, &["C2"]);
        let cutoff = note.filter_cutoff_hz.unwrap();
        assert_relative_eq!(cutoff, 200.0 + 400.0 * 1800.0 / 1023.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interval_respected() {
        let scheduler = VoiceScheduler::new();
        let reading = Reading::new(500, 500, false);
        let mut plant = grown(Category::Harmony, reading, 200);

        assert!(scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(4000)).is_empty());
        assert_eq!(scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(4001)).len(), 1);
        assert!(scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(8001)).is_empty());
        let chord = scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(8002));
        assert_eq!(chord[0].value, NoteValue::Half);
        assert_eq!(chord[0].pitches.len(), 3);
    }

    #[test]
    fn test_mature_melody_plays_phrase() {
        let scheduler = VoiceScheduler::new();
        let reading = Reading::new(300, 800, false);
        // 100 ticks at ideal conditions: stage 4.0
        let mut plant = grown(Category::Melody, reading, 100);
        let notes = scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(3001));

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].value, NoteValue::Sixteenth);
        assert_eq!(notes[1].value, NoteValue::Eighth);
        assert_eq!(notes[1].offset_ms, PHRASE_GAP_MS);
        // Stage 4 of 6 pitches maps to index 2 (E4); the answer is two steps up
        assert_eq!(notes[0].pitches, &["E4"]);
        assert_eq!(notes[1].pitches, &["A4"]);
    }

    #[test]
    fn test_volume_follows_health() {
        let scheduler = VoiceScheduler::new();
        let reading = Reading::new(500, 700, false);
        let mut plant = grown(Category::Harmony, reading, 100);
        assert_eq!(plant.health(), 100.0);
        let notes = scheduler.schedule(0, &mut plant, &reading, SimTime::from_millis(5000));
        assert_eq!(notes[0].volume_db, -15.0);
    }
}
