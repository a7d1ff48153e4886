//! Sensor readings sent by the garden board.
//!
//! Each reading line carries three integers:
//!
//! ```text
//! <moisture 0-1023>,<light 0-1023>,<trigger 0|1>
//! ```

use crate::error::{ProtocolError, ProtocolResult};

/// Largest value an analog channel can report.
pub const SENSOR_MAX: i32 = 1023;

/// Number of fields in a reading line.
pub const READING_FIELDS: usize = 3;

/// One decoded sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Soil moisture, nominally `0..=1023`.
    pub moisture: i32,
    /// Ambient light, nominally `0..=1023`.
    pub light: i32,
    /// Whether the planting button is held.
    pub triggered: bool,
}

impl Default for Reading {
    /// The midpoint reading used before the first line arrives.
    fn default() -> Self {
        Reading {
            moisture: 500,
            light: 500,
            triggered: false,
        }
    }
}

impl Reading {
    /// Create a reading.
    pub fn new(moisture: i32, light: i32, triggered: bool) -> Self {
        Reading {
            moisture,
            light,
            triggered,
        }
    }

    /// Parse a reading line.
    ///
    /// The line must have exactly three comma separated integer fields. The
    /// trigger is set only when the third field equals `1`. Values are not
    /// clamped; use [`clamped`](Self::clamped) when a bounded value is needed.
    pub fn parse(line: &str) -> ProtocolResult<Reading> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != READING_FIELDS {
            return Err(ProtocolError::FieldCount {
                expected: READING_FIELDS,
                actual: fields.len(),
            });
        }

        let moisture = parse_field(fields[0], 0)?;
        let light = parse_field(fields[1], 1)?;
        let trigger = parse_field(fields[2], 2)?;

        Ok(Reading {
            moisture,
            light,
            triggered: trigger == 1,
        })
    }

    /// Encode the reading the way the board prints it, newline included.
    pub fn encode(&self) -> String {
        format!(
            "{},{},{}\n",
            self.moisture,
            self.light,
            if self.triggered { 1 } else { 0 }
        )
    }

    /// Copy of this reading with both channels clamped to `0..=1023`.
    pub fn clamped(&self) -> Reading {
        Reading {
            moisture: self.moisture.clamp(0, SENSOR_MAX),
            light: self.light.clamp(0, SENSOR_MAX),
            triggered: self.triggered,
        }
    }
}

/// Parse one integer field.
pub(crate) fn parse_field(raw: &str, index: usize) -> ProtocolResult<i32> {
    raw.trim().parse::<i32>().map_err(|_| ProtocolError::InvalidField {
        index,
        value: raw.to_string(),
    })
}
