//! Metric declarations for the rhythm garden.
//!
//! Every metric the host records is declared once in [`metric_defs`] as a
//! [`Metric`] constant, so names are never typed twice and descriptions can be
//! registered with whatever recorder is installed.
//!
//! ```rust
//! use garden_metrics::{metric_defs, MetricKind};
//!
//! assert_eq!(metric_defs::PLANTS_PLANTED.kind, MetricKind::Counter);
//! metrics::counter!(metric_defs::PLANTS_PLANTED.name, "category" => "bass").increment(1);
//! ```
//!
//! With the `prometheus` feature, [`install_prometheus`] serves everything on
//! an HTTP scrape endpoint.

pub use metrics;

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// The kind of metric (counter, gauge, or histogram).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonically increasing.
    Counter,
    /// Goes up and down.
    Gauge,
    /// Distribution of samples.
    Histogram,
}

impl MetricKind {
    /// Lowercase name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric declaration with its metadata.
///
/// Built with const constructors so declarations live in `const` items:
///
/// ```rust
/// use garden_metrics::{Metric, MetricKind};
/// use metrics::Unit;
///
/// const LINES: Metric = Metric::counter("garden.serial.lines")
///     .with_description("Lines decoded")
///     .with_unit(Unit::Count)
///     .with_labels(&["protocol"]);
///
/// assert_eq!(LINES.kind, MetricKind::Counter);
/// assert_eq!(LINES.labels, &["protocol"]);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// Dotted metric name, e.g. `garden.plants.planted`.
    pub name: &'static str,
    pub kind: MetricKind,
    pub description: &'static str,
    pub unit: Option<Unit>,
    /// Label keys recorded alongside the metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Declare a counter.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Declare a gauge.
    pub const fn gauge(name: &'static str) -> Self {
        Self::new(name, MetricKind::Gauge)
    }

    /// Declare a histogram.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register this metric's description with the installed recorder.
    pub fn describe(&self) {
        match (self.kind, self.unit) {
            (MetricKind::Counter, Some(unit)) => {
                describe_counter!(self.name, unit, self.description);
            }
            (MetricKind::Counter, None) => {
                describe_counter!(self.name, self.description);
            }
            (MetricKind::Gauge, Some(unit)) => {
                describe_gauge!(self.name, unit, self.description);
            }
            (MetricKind::Gauge, None) => {
                describe_gauge!(self.name, self.description);
            }
            (MetricKind::Histogram, Some(unit)) => {
                describe_histogram!(self.name, unit, self.description);
            }
            (MetricKind::Histogram, None) => {
                describe_histogram!(self.name, self.description);
            }
        }
    }
}

/// Every metric recorded by the garden host.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Label naming the sketch dialect a session speaks.
    pub const PROTOCOL_LABEL: &[&str] = &["protocol"];

    // Serial link

    /// Raw bytes read from the serial port.
    pub const SERIAL_BYTES_RECEIVED: Metric = Metric::counter("garden.serial.bytes_received")
        .with_description("Bytes read from the serial port")
        .with_unit(Unit::Bytes)
        .with_labels(PROTOCOL_LABEL);

    /// Lines framed and accepted by the parser.
    pub const SERIAL_LINES_DECODED: Metric = Metric::counter("garden.serial.lines_decoded")
        .with_description("Complete lines accepted by the parser")
        .with_unit(Unit::Count)
        .with_labels(PROTOCOL_LABEL);

    /// Lines dropped because they did not parse.
    pub const SERIAL_MALFORMED_LINES: Metric = Metric::counter("garden.serial.malformed_lines")
        .with_description("Lines discarded as malformed")
        .with_unit(Unit::Count)
        .with_labels(PROTOCOL_LABEL);

    /// Outbound commands that failed to write.
    pub const SERIAL_WRITE_FAILURES: Metric = Metric::counter("garden.serial.write_failures")
        .with_description("Outbound commands that failed to write")
        .with_unit(Unit::Count)
        .with_labels(PROTOCOL_LABEL);

    /// Attempts to open the serial port.
    pub const CONNECTION_ATTEMPTS: Metric = Metric::counter("garden.connection.attempts")
        .with_description("Attempts to open the serial port")
        .with_unit(Unit::Count)
        .with_labels(PROTOCOL_LABEL);

    /// Attempts that failed to open the port.
    pub const CONNECTION_FAILURES: Metric = Metric::counter("garden.connection.failures")
        .with_description("Failed attempts to open the serial port")
        .with_unit(Unit::Count)
        .with_labels(PROTOCOL_LABEL);

    // Garden

    /// Plants added, by category.
    pub const PLANTS_PLANTED: Metric = Metric::counter("garden.plants.planted")
        .with_description("Plants added to the garden")
        .with_unit(Unit::Count)
        .with_labels(&["category"]);

    /// Current number of plants.
    pub const PLANT_COUNT: Metric = Metric::gauge("garden.plants.count")
        .with_description("Plants currently in the garden")
        .with_unit(Unit::Count);

    /// Mean plant health.
    pub const GARDEN_HEALTH: Metric = Metric::gauge("garden.health")
        .with_description("Mean plant health, 1 to 100")
        .with_unit(Unit::Percent);

    /// Notes handed to the audio side, by category.
    pub const NOTES_SCHEDULED: Metric = Metric::counter("garden.notes.scheduled")
        .with_description("Notes scheduled for playback")
        .with_unit(Unit::Count)
        .with_labels(&["category"]);

    // Host loop

    /// Ticks that started later than the allowed lag.
    pub const TICK_LAG_WARNINGS: Metric = Metric::counter("garden.tick.lag_warnings")
        .with_description("Ticks that started later than the allowed lag")
        .with_unit(Unit::Count);

    /// How late each tick started.
    pub const TICK_LAG: Metric = Metric::histogram("garden.tick.lag_ms")
        .with_description("Delay between a tick's scheduled and actual start")
        .with_unit(Unit::Milliseconds);

    pub const ALL: &[&Metric] = &[
        &SERIAL_BYTES_RECEIVED,
        &SERIAL_LINES_DECODED,
        &SERIAL_MALFORMED_LINES,
        &SERIAL_WRITE_FAILURES,
        &CONNECTION_ATTEMPTS,
        &CONNECTION_FAILURES,
        &PLANTS_PLANTED,
        &PLANT_COUNT,
        &GARDEN_HEALTH,
        &NOTES_SCHEDULED,
        &TICK_LAG_WARNINGS,
        &TICK_LAG,
    ];
}

/// Every declared metric.
pub fn all_metrics() -> &'static [&'static Metric] {
    metric_defs::ALL
}

/// Register descriptions for every metric. Call once after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

/// Install a Prometheus recorder serving `/metrics` on `addr`, then describe
/// every metric.
#[cfg(feature = "prometheus")]
pub fn install_prometheus(
    addr: std::net::SocketAddr,
) -> Result<(), metrics_exporter_prometheus::BuildError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    describe_metrics();
    Ok(())
}
