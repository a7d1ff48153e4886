//! Sketch dialects.
//!
//! A [`LineProtocol`] ties a line format to the state it updates and to the
//! command encoding the board expects. The device session is generic over it,
//! so the framing and connection logic is shared by both sketches.

use crate::commands::LedCommand;
use crate::error::ProtocolResult;
use crate::probe::{ProbeMessage, ProbeState};
use crate::reading::Reading;

/// A line-oriented sketch dialect.
pub trait LineProtocol: Send + Sync + 'static {
    /// Latest decoded state exposed to consumers.
    type State: Clone + Default + Send + 'static;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Decode `line` and fold it into `state`.
    ///
    /// On error `state` must be left exactly as it was.
    fn apply(line: &str, state: &mut Self::State) -> ProtocolResult<()>;

    /// Bytes to write for an LED command.
    fn encode(command: LedCommand) -> &'static [u8];
}

/// The garden sketch: moisture, light and trigger readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct GardenProtocol;

impl LineProtocol for GardenProtocol {
    type State = Reading;

    const NAME: &'static str = "garden";

    fn apply(line: &str, state: &mut Reading) -> ProtocolResult<()> {
        *state = Reading::parse(line)?;
        Ok(())
    }

    fn encode(command: LedCommand) -> &'static [u8] {
        command.garden_bytes()
    }
}

/// The bench probe sketch: one analog value plus an LED echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeProtocol;

impl LineProtocol for ProbeProtocol {
    type State = ProbeState;

    const NAME: &'static str = "probe";

    fn apply(line: &str, state: &mut ProbeState) -> ProtocolResult<()> {
        let message = ProbeMessage::parse(line)?;
        state.apply(message);
        Ok(())
    }

    fn encode(command: LedCommand) -> &'static [u8] {
        command.probe_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garden_apply_keeps_stale_value_on_error() {
        let mut state = Reading::new(100, 200, false);
        assert!(GardenProtocol::apply("1,2", &mut state).is_err());
        assert!(GardenProtocol::apply("1,2,x", &mut state).is_err());
        assert_eq!(state, Reading::new(100, 200, false));

        GardenProtocol::apply("512,300,1", &mut state).unwrap();
        assert_eq!(state, Reading::new(512, 300, true));
    }

    #[test]
    fn test_probe_apply() {
        let mut state = ProbeState::default();
        ProbeProtocol::apply("SENSOR:44", &mut state).unwrap();
        assert!(ProbeProtocol::apply("SENSOR:", &mut state).is_err());
        assert_eq!(state.sensor_value, 44);
    }

    #[test]
    fn test_dialect_encoding() {
        assert_eq!(GardenProtocol::encode(LedCommand::On), b"L1");
        assert_eq!(ProbeProtocol::encode(LedCommand::Off), b"0");
    }
}
