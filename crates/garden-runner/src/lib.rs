//! Host side of the rhythm garden.
//!
//! Connects to the sensor board over serial, feeds its readings into the
//! garden simulation at a fixed tick rate and pulses the board's LED whenever
//! something is planted. Without a board the garden can be driven from the
//! console with a virtual joystick.

pub mod app;
pub mod config;
pub mod error;
pub mod pacer;
pub mod probe_app;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use app::{AppCommand, GardenApp};
pub use config::{RunnerConfig, SerialConfig, TickConfig};
pub use error::{CommandError, ConfigError, SessionError};
pub use pacer::{PacerStats, TickPacer, TickSummary};
pub use probe_app::ProbeApp;
pub use scheduler::PulseScheduler;
pub use session::{ConnectionStatus, DeviceSession, SessionState};
pub use transport::{
    list_ports, memory_port, MemoryDevice, MemoryPort, PortOpener, SerialLink, SerialPortOpener,
};
