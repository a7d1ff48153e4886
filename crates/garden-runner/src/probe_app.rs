//! Host for the bench probe sketch: one sensor value and a remote LED.

use crate::error::SessionError;
use crate::session::DeviceSession;
use crate::transport::PortOpener;
use garden_protocol::{LedCommand, ProbeProtocol};

/// Probe host state.
pub struct ProbeApp {
    session: DeviceSession<ProbeProtocol>,
    opener: Box<dyn PortOpener>,
    led_on: bool,
    reported_led: bool,
}

impl ProbeApp {
    pub fn new(opener: Box<dyn PortOpener>) -> Self {
        ProbeApp {
            session: DeviceSession::new(),
            opener,
            led_on: false,
            reported_led: false,
        }
    }

    pub fn session(&self) -> &DeviceSession<ProbeProtocol> {
        &self.session
    }

    pub fn connect(&mut self) -> Result<(), SessionError> {
        self.session.connect(&*self.opener)
    }

    pub fn disconnect(&mut self) {
        self.session.disconnect();
    }

    /// LED state as the host sees it.
    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// Adopt the LED state when the board reports a change.
    pub fn refresh(&mut self) {
        let reported = self.session.current_reading().led_on;
        if reported != self.reported_led {
            self.reported_led = reported;
            self.led_on = reported;
        }
    }

    /// Flip the LED. Does nothing unless connected.
    pub fn toggle_led(&mut self) -> Result<bool, SessionError> {
        if !self.session.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.led_on = !self.led_on;
        self.session.send(LedCommand::from_state(self.led_on))?;
        Ok(self.led_on)
    }

    /// Sensor value, LED state and connection status.
    pub fn status_line(&self) -> String {
        let state = self.session.current_reading();
        format!(
            "Sensor value: {} | LED {} | {}",
            state.sensor_value,
            if self.led_on { "ON" } else { "OFF" },
            self.session.current_status().message
        )
    }
}
