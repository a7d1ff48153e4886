//! Pointer-driven stand-in for the sensor board.

use crate::voice::map_range;
use garden_protocol::{Reading, SENSOR_MAX};

/// Default distance from the joystick centre that maps to a full-scale reading.
pub const DEFAULT_RADIUS: f64 = 300.0;

/// Turn a pointer offset from the joystick centre into a reading.
///
/// Horizontal offset drives light and vertical offset drives moisture, each
/// mapped from `-radius..=radius` onto `0..=1023` and clamped. The trigger is
/// always released; planting from the joystick goes through the console.
pub fn reading_from_offset(dx: f64, dy: f64, radius: f64) -> Reading {
    let radius = if radius > 0.0 { radius } else { DEFAULT_RADIUS };
    let max = SENSOR_MAX as f64;
    let axis = |offset: f64| {
        map_range(offset.clamp(-radius, radius), (-radius, radius), (0.0, max)).round() as i32
    };
    Reading::new(axis(dy), axis(dx), false)
}
