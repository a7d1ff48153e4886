//! Byte transports a device session runs over.
//!
//! A [`PortOpener`] produces a [`SerialLink`]: an independent reader and writer
//! over the same port. [`SerialPortOpener`] opens real hardware through the
//! `serialport` crate; [`memory_port`] builds an in-memory pair for tests and
//! demos.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use garden_protocol::Reading;
use parking_lot::Mutex;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Baud rate both sketches use.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// How long a read waits before reporting a timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// An open port, split into reading and writing halves.
pub struct SerialLink {
    pub name: String,
    pub reader: Box<dyn Read + Send>,
    pub writer: Box<dyn Write + Send>,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink").field("name", &self.name).finish()
    }
}

/// Something that can open a port on request.
pub trait PortOpener: Send + Sync {
    /// Open the port.
    fn open(&self) -> io::Result<SerialLink>;

    /// Human readable name of the port.
    fn describe(&self) -> String;
}

/// Opens a hardware serial port.
#[derive(Debug, Clone)]
pub struct SerialPortOpener {
    pub path: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
}

impl SerialPortOpener {
    /// Opener for `path` at the default baud rate and timeout.
    pub fn new(path: impl Into<String>) -> Self {
        SerialPortOpener {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl PortOpener for SerialPortOpener {
    fn open(&self) -> io::Result<SerialLink> {
        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .timeout(self.read_timeout)
            .open()?;
        let writer = port.try_clone()?;

        Ok(SerialLink {
            name: self.path.clone(),
            reader: Box::new(port),
            writer: Box::new(writer),
        })
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud_rate)
    }
}

/// Names of the serial ports present on this machine.
pub fn list_ports() -> io::Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

// ============================================================================
// In-memory port
// ============================================================================

enum Chunk {
    Data(Vec<u8>),
    HangUp,
    Fail(io::ErrorKind),
}

#[derive(Default)]
struct DeviceShared {
    written: Mutex<Vec<u8>>,
    fail_writes: AtomicBool,
    open_error: Mutex<Option<String>>,
    opens: AtomicUsize,
}

/// Create an in-memory port and the device end that drives it.
pub fn memory_port(name: impl Into<String>) -> (MemoryPort, MemoryDevice) {
    let (tx, rx) = crossbeam_channel::unbounded();
    let shared = Arc::new(DeviceShared::default());
    let port = MemoryPort {
        name: name.into(),
        rx,
        shared: Arc::clone(&shared),
        read_timeout: Duration::from_millis(20),
    };
    (port, MemoryDevice { tx, shared })
}

/// Host end of an in-memory port. Can be opened any number of times.
pub struct MemoryPort {
    name: String,
    rx: Receiver<Chunk>,
    shared: Arc<DeviceShared>,
    read_timeout: Duration,
}

impl PortOpener for MemoryPort {
    fn open(&self) -> io::Result<SerialLink> {
        self.shared.opens.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = self.shared.open_error.lock().clone() {
            return Err(io::Error::new(io::ErrorKind::NotFound, reason));
        }

        Ok(SerialLink {
            name: self.name.clone(),
            reader: Box::new(MemoryReader {
                rx: self.rx.clone(),
                pending: Vec::new(),
                timeout: self.read_timeout,
            }),
            writer: Box::new(MemoryWriter {
                shared: Arc::clone(&self.shared),
            }),
        })
    }

    fn describe(&self) -> String {
        format!("{} (in-memory)", self.name)
    }
}

/// Device end of an in-memory port.
pub struct MemoryDevice {
    tx: Sender<Chunk>,
    shared: Arc<DeviceShared>,
}

impl MemoryDevice {
    /// Deliver raw bytes to the host.
    pub fn send_bytes(&self, bytes: &[u8]) {
        // An empty chunk would read as end of stream
        if bytes.is_empty() {
            return;
        }
        let _ = self.tx.send(Chunk::Data(bytes.to_vec()));
    }

    /// Deliver one line, adding the terminator.
    pub fn send_line(&self, line: &str) {
        self.send_bytes(format!("{line}\n").as_bytes());
    }

    /// Deliver a reading in the garden sketch's wire form.
    pub fn send_reading(&self, reading: &Reading) {
        self.send_bytes(reading.encode().as_bytes());
    }

    /// End the current read stream as if the cable were pulled.
    pub fn hang_up(&self) {
        let _ = self.tx.send(Chunk::HangUp);
    }

    /// Make the host's next read fail with `kind`.
    pub fn fail_read(&self, kind: io::ErrorKind) {
        let _ = self.tx.send(Chunk::Fail(kind));
    }

    /// Make writes from the host fail until turned off again.
    pub fn fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Make opening the port fail with `reason`, or succeed again with `None`.
    pub fn fail_open(&self, reason: Option<&str>) {
        *self.shared.open_error.lock() = reason.map(str::to_string);
    }

    /// Everything the host has written so far.
    pub fn written(&self) -> Vec<u8> {
        self.shared.written.lock().clone()
    }

    /// Take and clear everything the host has written.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut *self.shared.written.lock())
    }

    /// How many times the port has been opened.
    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::Relaxed)
    }
}

struct MemoryReader {
    rx: Receiver<Chunk>,
    pending: Vec<u8>,
    timeout: Duration,
}

impl Read for MemoryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv_timeout(self.timeout) {
                Ok(Chunk::Data(data)) => self.pending = data,
                Ok(Chunk::HangUp) => return Ok(0),
                Ok(Chunk::Fail(kind)) => return Err(io::Error::new(kind, "injected read failure")),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

struct MemoryWriter {
    shared: Arc<DeviceShared>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.shared.fail_writes.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device not writable"));
        }
        self.shared.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
