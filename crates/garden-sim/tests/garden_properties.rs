//! End-to-end behaviour of the garden over sequences of readings.

use garden_protocol::Reading;
use garden_sim::{Category, Garden, GardenConfig, Plant, Position, SimTime, MAX_GROWTH_STAGE};

const TICK_MS: u64 = 16;

fn seeded_garden(seed: u64) -> Garden {
    Garden::new(GardenConfig {
        seed: Some(seed),
        ..Default::default()
    })
    .unwrap()
}

fn ticks_to_full_growth(reading: Reading) -> usize {
    let mut plant = Plant::new(Position::new(0.0, 0.0), Category::Bass);
    let mut ticks = 0;
    while plant.growth_stage() < MAX_GROWTH_STAGE {
        plant.grow(&reading);
        ticks += 1;
        assert!(ticks < 100_000, "plant never finished growing");
    }
    ticks
}

#[test]
fn test_bass_grows_faster_at_its_ideal() {
    let ideal = ticks_to_full_growth(Reading::new(700, 400, false));
    let neutral = ticks_to_full_growth(Reading::new(500, 500, false));
    assert!(ideal < neutral, "ideal {ideal} ticks vs neutral {neutral} ticks");
}

#[test]
fn test_worst_case_never_drops_health_below_floor() {
    let mut garden = seeded_garden(3);
    for _ in 0..3 {
        garden.plant(&Reading::default(), true, None);
    }

    let worst = Reading::new(0, 0, false);
    for tick in 0..20_000u64 {
        garden.tick(&worst, SimTime::from_millis(tick * TICK_MS));
        for plant in garden.plants() {
            assert!(plant.health() >= 1.0);
        }
    }
    assert_eq!(garden.aggregate_health(), 1.0);
}

#[test]
fn test_trigger_sequence_plants_on_rising_edges_only() {
    let mut garden = seeded_garden(5);
    let levels = [false, true, true, false, true];

    let planted_on: Vec<usize> = levels
        .iter()
        .enumerate()
        .filter_map(|(i, &triggered)| {
            let now = SimTime::from_millis(i as u64 * TICK_MS);
            garden
                .tick(&Reading::new(500, 500, triggered), now)
                .planted
                .map(|_| i + 1)
        })
        .collect();

    assert_eq!(planted_on, vec![2, 5]);
    assert_eq!(garden.len(), 2);
}

#[test]
fn test_forced_diversity_gives_one_of_each() {
    let mut garden = seeded_garden(11);
    // Bright and dry would always pick melody without forcing
    let reading = Reading::new(300, 800, false);
    for _ in 0..3 {
        garden.plant(&reading, true, None);
    }
    assert_eq!(garden.category_counts(), [1, 1, 1]);
}

#[test]
fn test_plants_keep_their_distance() {
    let mut garden = seeded_garden(21);
    let mut now = 0;
    for _ in 0..6 {
        garden.tick(&Reading::new(500, 500, true), SimTime::from_millis(now));
        now += TICK_MS;
        garden.tick(&Reading::new(500, 500, false), SimTime::from_millis(now));
        now += TICK_MS;
    }
    assert_eq!(garden.len(), 6);

    let min_distance = garden.config().positions.min_distance;
    let positions: Vec<Position> = garden.plants().iter().map(|p| p.position()).collect();
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert!(a.distance(b) >= min_distance);
        }
    }
}

#[test]
fn test_grown_garden_starts_singing() {
    let mut garden = seeded_garden(8);
    let reading = Reading::new(500, 500, false);
    for _ in 0..3 {
        garden.plant(&reading, true, None);
    }

    let mut heard = [false; 3];
    for tick in 0..2000u64 {
        let outcome = garden.tick(&reading, SimTime::from_millis(tick * TICK_MS));
        for note in outcome.notes {
            heard[note.category.index()] = true;
            assert!(note.volume_db >= -30.0 && note.volume_db <= -15.0);
        }
    }
    assert_eq!(heard, [true, true, true]);
}

#[test]
fn test_out_of_range_sensor_line_is_survivable() {
    let mut garden = seeded_garden(13);
    for _ in 0..3 {
        garden.plant(&Reading::default(), true, None);
    }

    let extreme = Reading::parse("-2147483648,2147483647,0").unwrap();
    for tick in 0..300u64 {
        garden.tick(&extreme, SimTime::from_millis(tick * TICK_MS));
    }
    for plant in garden.plants() {
        assert!(plant.growth_stage() <= MAX_GROWTH_STAGE);
        assert_eq!(plant.health(), 1.0);
    }
    assert_eq!(garden.aggregate_health(), 1.0);
}
