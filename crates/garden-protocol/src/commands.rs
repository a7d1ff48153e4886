//! Commands sent from the host to the board.
//!
//! Commands are short ASCII tokens with no terminator. The garden sketch uses
//! two-byte `L1` / `L0` tokens; the bench probe sketch uses a single `1` / `0`.

/// Switch the board's feedback LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedCommand {
    /// Turn the LED on.
    On,
    /// Turn the LED off.
    Off,
}

impl LedCommand {
    /// Build the command for a desired LED state.
    pub fn from_state(on: bool) -> Self {
        if on {
            LedCommand::On
        } else {
            LedCommand::Off
        }
    }

    /// Whether this command turns the LED on.
    pub fn is_on(&self) -> bool {
        matches!(self, LedCommand::On)
    }

    /// Encoding understood by the garden sketch.
    pub fn garden_bytes(&self) -> &'static [u8] {
        match self {
            LedCommand::On => b"L1",
            LedCommand::Off => b"L0",
        }
    }

    /// Encoding understood by the probe sketch.
    pub fn probe_bytes(&self) -> &'static [u8] {
        match self {
            LedCommand::On => b"1",
            LedCommand::Off => b"0",
        }
    }
}

impl std::fmt::Display for LedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedCommand::On => write!(f, "LED on"),
            LedCommand::Off => write!(f, "LED off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garden_encoding() {
        assert_eq!(LedCommand::On.garden_bytes(), b"L1");
        assert_eq!(LedCommand::Off.garden_bytes(), b"L0");
    }

    #[test]
    fn test_probe_encoding() {
        assert_eq!(LedCommand::On.probe_bytes(), &[49u8]);
        assert_eq!(LedCommand::Off.probe_bytes(), &[48u8]);
    }

    #[test]
    fn test_from_state() {
        assert_eq!(LedCommand::from_state(true), LedCommand::On);
        assert!(!LedCommand::from_state(false).is_on());
    }
}
