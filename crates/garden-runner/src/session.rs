//! Device session: one serial connection and the latest state decoded from it.
//!
//! A session owns the connection lifecycle, a background read loop and the
//! single slot holding the newest decoded state. The tick loop reads that slot
//! with [`DeviceSession::current_reading`] and never waits on I/O; the read
//! loop overwrites it whenever a complete line parses.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!      ▲                        │                 │
//!      │                        └─fail─▶ ConnectFailed
//!      └──────── EOF / read error / disconnect ───┘
//! ```

use crate::error::SessionError;
use crate::scheduler::PulseScheduler;
use crate::transport::PortOpener;
use garden_metrics::metric_defs;
use garden_protocol::{LedCommand, LineCodec, LineProtocol};
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Size of each read from the port.
const READ_CHUNK: usize = 256;

/// Where a session is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// The last attempt failed. A new attempt may be made.
    ConnectFailed,
}

/// Connection flag plus the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

impl ConnectionStatus {
    fn new(connected: bool, message: impl Into<String>) -> Self {
        ConnectionStatus {
            connected,
            message: message.into(),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::new(false, "Not connected")
    }
}

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// State shared between the session and its read loop.
struct Shared<S> {
    /// Lifecycle state and status message, always updated together.
    connection: Mutex<(SessionState, ConnectionStatus)>,
    latest: Mutex<S>,
    stop: AtomicBool,
}

impl<S> Shared<S> {
    fn set(&self, state: SessionState, status: ConnectionStatus) {
        *self.connection.lock() = (state, status);
    }

    fn state(&self) -> SessionState {
        self.connection.lock().0
    }
}

/// Writes commands to the port. Cloned into scheduled actions.
struct Outbox<P: LineProtocol> {
    writer: SharedWriter,
    shared: Arc<Shared<P::State>>,
}

impl<P: LineProtocol> Clone for Outbox<P> {
    fn clone(&self) -> Self {
        Outbox {
            writer: Arc::clone(&self.writer),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P: LineProtocol> Outbox<P> {
    fn send(&self, command: LedCommand) -> Result<(), SessionError> {
        if self.shared.state() != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }

        let mut writer = self.writer.lock();
        let writer = writer.as_mut().ok_or(SessionError::NotConnected)?;
        let bytes = P::encode(command);

        match writer.write_all(bytes).and_then(|_| writer.flush()) {
            Ok(()) => {
                trace!(protocol = P::NAME, %command, "sent");
                Ok(())
            }
            Err(e) => {
                warn!(protocol = P::NAME, %command, error = %e, "failed to send command");
                metrics::counter!(metric_defs::SERIAL_WRITE_FAILURES.name, "protocol" => P::NAME)
                    .increment(1);
                Err(SessionError::Write(e))
            }
        }
    }
}

/// A connection to one board speaking protocol `P`.
pub struct DeviceSession<P: LineProtocol> {
    shared: Arc<Shared<P::State>>,
    outbox: Outbox<P>,
    reader: Option<JoinHandle<()>>,
    pulses: PulseScheduler,
    port_name: Option<String>,
    _protocol: PhantomData<P>,
}

impl<P: LineProtocol> DeviceSession<P> {
    /// A disconnected session holding the protocol's default state.
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            connection: Mutex::new((SessionState::Disconnected, ConnectionStatus::default())),
            latest: Mutex::new(P::State::default()),
            stop: AtomicBool::new(false),
        });
        let outbox = Outbox {
            writer: Arc::new(Mutex::new(None)),
            shared: Arc::clone(&shared),
        };

        DeviceSession {
            shared,
            outbox,
            reader: None,
            pulses: PulseScheduler::new(),
            port_name: None,
            _protocol: PhantomData,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Whether the session can send and is receiving.
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Connection flag and user-facing message.
    pub fn current_status(&self) -> ConnectionStatus {
        self.shared.connection.lock().1.clone()
    }

    /// State and status read together, so they always agree.
    pub fn connection(&self) -> (SessionState, ConnectionStatus) {
        self.shared.connection.lock().clone()
    }

    /// Newest decoded state. Stale values persist across bad lines and disconnects.
    pub fn current_reading(&self) -> P::State {
        self.shared.latest.lock().clone()
    }

    /// Name of the port last connected to.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// Open the port and start the read loop.
    pub fn connect(&mut self, opener: &dyn PortOpener) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Connected | SessionState::Connecting => {
                let port = self.port_name.clone().unwrap_or_else(|| opener.describe());
                return Err(SessionError::AlreadyConnected(port));
            }
            SessionState::Disconnected | SessionState::ConnectFailed => {}
        }

        // A read loop that ended on its own still has to be joined
        self.join_reader();

        let port = opener.describe();
        self.shared.set(
            SessionState::Connecting,
            ConnectionStatus::new(false, format!("Connecting to {port}...")),
        );
        metrics::counter!(metric_defs::CONNECTION_ATTEMPTS.name, "protocol" => P::NAME).increment(1);

        let link = match opener.open() {
            Ok(link) => link,
            Err(e) => return Err(self.fail_connect(port, e.to_string())),
        };

        self.shared.stop.store(false, Ordering::SeqCst);
        *self.outbox.writer.lock() = Some(link.writer);

        // Set before the read loop starts; from then on it may report Disconnected
        self.shared.set(
            SessionState::Connected,
            ConnectionStatus::new(true, format!("Connected to {}", link.name)),
        );

        let shared = Arc::clone(&self.shared);
        let writer = Arc::clone(&self.outbox.writer);
        let reader = link.reader;
        let spawned = thread::Builder::new()
            .name(format!("{}-reader", P::NAME))
            .spawn(move || read_loop::<P>(reader, shared, writer));

        match spawned {
            Ok(handle) => self.reader = Some(handle),
            Err(e) => {
                self.outbox.writer.lock().take();
                self.fail_connect(port, e.to_string());
                return Err(SessionError::Thread {
                    name: "reader",
                    source: e,
                });
            }
        }

        info!(protocol = P::NAME, port = %link.name, "connected");
        self.port_name = Some(link.name);
        Ok(())
    }

    fn fail_connect(&mut self, port: String, reason: String) -> SessionError {
        warn!(protocol = P::NAME, %port, %reason, "connection failed");
        metrics::counter!(metric_defs::CONNECTION_FAILURES.name, "protocol" => P::NAME).increment(1);
        self.shared.set(
            SessionState::ConnectFailed,
            ConnectionStatus::new(false, format!("Connection failed: {reason}")),
        );
        SessionError::Connection { port, reason }
    }

    /// Write one command. Fails without side effects when not connected.
    pub fn send(&self, command: LedCommand) -> Result<(), SessionError> {
        self.outbox.send(command)
    }

    /// Turn the LED on now and off again after `duration`.
    ///
    /// The off command is best effort: if the session is gone by then it is
    /// skipped with a log line.
    pub fn pulse_led(&mut self, duration: Duration) -> Result<(), SessionError> {
        self.send(LedCommand::On)?;

        let outbox = self.outbox.clone();
        self.pulses
            .schedule(duration, move || {
                if let Err(e) = outbox.send(LedCommand::Off) {
                    debug!(protocol = P::NAME, error = %e, "LED off skipped");
                }
            })
            .map_err(|source| SessionError::Thread {
                name: "led-pulse",
                source,
            })
    }

    /// Close the port. Pending LED pulses are cancelled.
    pub fn disconnect(&mut self) {
        self.pulses.cancel_all();

        let was_open = self.reader.is_some();
        self.shared.stop.store(true, Ordering::SeqCst);
        self.outbox.writer.lock().take();
        self.join_reader();

        if was_open {
            info!(protocol = P::NAME, "disconnected");
            self.shared
                .set(SessionState::Disconnected, ConnectionStatus::new(false, "Disconnected"));
        }
    }

    fn join_reader(&mut self) {
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!(protocol = P::NAME, "read loop panicked");
            }
        }
    }
}

impl<P: LineProtocol> Default for DeviceSession<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LineProtocol> Drop for DeviceSession<P> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

/// Read, frame and decode until the port closes or the session asks to stop.
fn read_loop<P: LineProtocol>(
    mut reader: Box<dyn Read + Send>,
    shared: Arc<Shared<P::State>>,
    writer: SharedWriter,
) {
    let mut codec = LineCodec::new();
    let mut buf = [0u8; READ_CHUNK];

    let reason = loop {
        if shared.stop.load(Ordering::SeqCst) {
            trace!(protocol = P::NAME, "read loop stopped");
            return;
        }

        match reader.read(&mut buf) {
            Ok(0) => break "port closed".to_string(),
            Ok(n) => {
                metrics::counter!(metric_defs::SERIAL_BYTES_RECEIVED.name, "protocol" => P::NAME)
                    .increment(n as u64);
                for line in codec.feed(&buf[..n]) {
                    let applied = P::apply(&line, &mut shared.latest.lock());
                    match applied {
                        Ok(()) => {
                            metrics::counter!(metric_defs::SERIAL_LINES_DECODED.name, "protocol" => P::NAME)
                                .increment(1);
                        }
                        Err(e) => {
                            debug!(protocol = P::NAME, %line, error = %e, "discarding line");
                            metrics::counter!(metric_defs::SERIAL_MALFORMED_LINES.name, "protocol" => P::NAME)
                                .increment(1);
                        }
                    }
                }
            }
            Err(e) if is_transient(e.kind()) => continue,
            Err(e) => break e.to_string(),
        }
    };

    // Closed from the device side
    drop(reader);
    writer.lock().take();
    if !shared.stop.load(Ordering::SeqCst) {
        warn!(protocol = P::NAME, %reason, "connection lost");
        shared.set(
            SessionState::Disconnected,
            ConnectionStatus::new(false, format!("Disconnected: {reason}")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory_port;
    use garden_protocol::{GardenProtocol, Reading};
    use std::time::Instant;

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn test_new_session_defaults() {
        let session = DeviceSession::<GardenProtocol>::new();
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(session.current_reading(), Reading::new(500, 500, false));
        assert_eq!(session.current_status(), ConnectionStatus::new(false, "Not connected"));
    }

    #[test]
    fn test_send_requires_connection() {
        let session = DeviceSession::<GardenProtocol>::new();
        assert!(matches!(session.send(LedCommand::On), Err(SessionError::NotConnected)));
    }

    #[test]
    fn test_transient_errors_do_not_disconnect() {
        let (port, device) = memory_port("mem");
        let mut session = DeviceSession::<GardenProtocol>::new();
        session.connect(&port).unwrap();

        device.fail_read(io::ErrorKind::Interrupted);
        device.send_line("600,300,0");
        assert!(wait_until(|| session.current_reading().moisture == 600));
        assert!(session.is_connected());
    }

    #[test]
    fn test_port_closing_immediately_ends_disconnected() {
        let (port, device) = memory_port("mem");
        device.hang_up();

        let mut session = DeviceSession::<GardenProtocol>::new();
        session.connect(&port).unwrap();
        assert!(wait_until(|| session.state() == SessionState::Disconnected));

        thread::sleep(Duration::from_millis(20));
        let (state, status) = session.connection();
        assert_eq!(state, SessionState::Disconnected);
        assert_eq!(status, ConnectionStatus::new(false, "Disconnected: port closed"));
        assert!(matches!(session.send(LedCommand::On), Err(SessionError::NotConnected)));
    }

    #[test]
    fn test_state_and_status_never_disagree() {
        let (port, device) = memory_port("mem");
        let mut session = DeviceSession::<GardenProtocol>::new();
        session.connect(&port).unwrap();

        device.hang_up();
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let (state, status) = session.connection();
            assert_eq!(state == SessionState::Connected, status.connected);
            if state == SessionState::Disconnected || Instant::now() > deadline {
                break;
            }
        }
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_hard_read_error_disconnects() {
        let (port, device) = memory_port("mem");
        let mut session = DeviceSession::<GardenProtocol>::new();
        session.connect(&port).unwrap();

        device.fail_read(io::ErrorKind::PermissionDenied);
        assert!(wait_until(|| session.state() == SessionState::Disconnected));
        let status = session.current_status();
        assert!(!status.connected);
        assert!(status.message.starts_with("Disconnected: "));
    }
}
