//! Messages from the bench probe sketch.
//!
//! The probe board reports a single analog value and echoes its LED state:
//!
//! ```text
//! SENSOR:<value>
//! LED:ON
//! LED:OFF
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use crate::reading::parse_field;

/// Prefix of a sensor value line.
pub const SENSOR_PREFIX: &str = "SENSOR:";

/// A decoded probe message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMessage {
    /// A new analog sensor value.
    Sensor(i32),
    /// The board reports its LED is on.
    LedOn,
    /// The board reports its LED is off.
    LedOff,
}

impl ProbeMessage {
    /// Parse a probe line.
    pub fn parse(line: &str) -> ProtocolResult<ProbeMessage> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }

        if let Some(value) = line.strip_prefix(SENSOR_PREFIX) {
            return parse_field(value, 0).map(ProbeMessage::Sensor);
        }

        match line {
            "LED:ON" => Ok(ProbeMessage::LedOn),
            "LED:OFF" => Ok(ProbeMessage::LedOff),
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }
}

/// Latest state reported by the probe board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeState {
    /// Last analog value, `0..=1023`.
    pub sensor_value: i32,
    /// LED state as last reported by the board.
    pub led_on: bool,
}

impl ProbeState {
    /// Fold a message into the state.
    pub fn apply(&mut self, message: ProbeMessage) {
        match message {
            ProbeMessage::Sensor(value) => self.sensor_value = value,
            ProbeMessage::LedOn => self.led_on = true,
            ProbeMessage::LedOff => self.led_on = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sensor() {
        assert_eq!(ProbeMessage::parse("SENSOR:731"), Ok(ProbeMessage::Sensor(731)));
    }

    #[test]
    fn test_parse_led() {
        assert_eq!(ProbeMessage::parse("LED:ON"), Ok(ProbeMessage::LedOn));
        assert_eq!(ProbeMessage::parse("LED:OFF\r"), Ok(ProbeMessage::LedOff));
    }

    #[test]
    fn test_bad_sensor_value_rejected() {
        assert!(matches!(
            ProbeMessage::parse("SENSOR:abc"),
            Err(ProtocolError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_unknown_message() {
        let err = ProbeMessage::parse("HELLO").unwrap_err();
        assert_eq!(err, ProtocolError::UnknownMessage("HELLO".to_string()));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_state_apply() {
        let mut state = ProbeState::default();
        state.apply(ProbeMessage::Sensor(12));
        state.apply(ProbeMessage::LedOn);
        assert_eq!(state, ProbeState { sensor_value: 12, led_on: true });
        state.apply(ProbeMessage::LedOff);
        assert!(!state.led_on);
    }
}
