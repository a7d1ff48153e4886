//! The garden host: device session, simulation and console commands.

use crate::config::RunnerConfig;
use crate::error::{CommandError, ConfigError};
use crate::pacer::TickPacer;
use crate::session::{ConnectionStatus, DeviceSession, SessionState};
use crate::transport::PortOpener;
use crossbeam_channel::{Receiver, TryRecvError};
use garden_metrics::metric_defs;
use garden_protocol::{GardenProtocol, Reading};
use garden_sim::joystick::reading_from_offset;
use garden_sim::{Garden, PlantedEvent, Position, SimTime, TickOutcome};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A console command.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Connect,
    Disconnect,
    /// Plant by hand, optionally at a preferred spot.
    Plant(Option<Position>),
    /// Move the stand-in joystick to an offset from its centre.
    Joystick { dx: f64, dy: f64 },
    Status,
    Quit,
}

fn parse_number(raw: &str) -> Result<f64, CommandError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CommandError::InvalidNumber(raw.to_string()))
}

fn parse_pair(
    command: &'static str,
    expected: &'static str,
    args: &[&str],
) -> Result<(f64, f64), CommandError> {
    match args {
        [a, b] => Ok((parse_number(a)?, parse_number(b)?)),
        _ => Err(CommandError::MissingArgument { command, expected }),
    }
}

impl FromStr for AppCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?;
        let args: Vec<&str> = words.collect();

        match name.to_ascii_lowercase().as_str() {
            "connect" => Ok(AppCommand::Connect),
            "disconnect" => Ok(AppCommand::Disconnect),
            "plant" if args.is_empty() => Ok(AppCommand::Plant(None)),
            "plant" => {
                let (x, y) = parse_pair("plant", "<x> <y>", &args)?;
                Ok(AppCommand::Plant(Some(Position::new(x, y))))
            }
            "joystick" => {
                let (dx, dy) = parse_pair("joystick", "<dx> <dy>", &args)?;
                Ok(AppCommand::Joystick { dx, dy })
            }
            "status" => Ok(AppCommand::Status),
            "quit" | "exit" => Ok(AppCommand::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// The garden host.
pub struct GardenApp {
    session: DeviceSession<GardenProtocol>,
    garden: Garden,
    opener: Option<Box<dyn PortOpener>>,
    joystick: Reading,
    joystick_radius: f64,
    led_pulse: Duration,
    running: bool,
}

impl GardenApp {
    /// Build the host. Without an opener the garden runs on the joystick only.
    pub fn new(
        config: &RunnerConfig,
        opener: Option<Box<dyn PortOpener>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let garden = Garden::new(config.garden.clone())?;

        Ok(GardenApp {
            session: DeviceSession::new(),
            garden,
            opener,
            joystick: Reading::default(),
            joystick_radius: config.joystick_radius,
            led_pulse: config.led_pulse(),
            running: true,
        })
    }

    pub fn garden(&self) -> &Garden {
        &self.garden
    }

    pub fn session(&self) -> &DeviceSession<GardenProtocol> {
        &self.session
    }

    /// Whether `quit` has been handled.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The reading the next tick will use: the device's when connected, the
    /// joystick's otherwise.
    pub fn current_reading(&self) -> Reading {
        if self.session.is_connected() {
            self.session.current_reading()
        } else {
            self.joystick
        }
    }

    /// Advance the garden by one tick.
    pub fn step(&mut self, now: SimTime) -> TickOutcome {
        let reading = self.current_reading();
        let outcome = self.garden.tick(&reading, now);

        if let Some(planted) = outcome.planted {
            self.on_planted(planted);
        }

        for note in &outcome.notes {
            metrics::counter!(metric_defs::NOTES_SCHEDULED.name, "category" => note.category.to_string())
                .increment(1);
            debug!(
                plant = note.plant_index,
                category = %note.category,
                pitches = ?note.pitches,
                value = note.value.notation(),
                offset_ms = note.offset_ms,
                volume_db = note.volume_db,
                cutoff_hz = ?note.filter_cutoff_hz,
                "note"
            );
        }

        metrics::gauge!(metric_defs::PLANT_COUNT.name).set(self.garden.len() as f64);
        metrics::gauge!(metric_defs::GARDEN_HEALTH.name).set(self.garden.aggregate_health());

        outcome
    }

    fn on_planted(&mut self, planted: PlantedEvent) {
        metrics::counter!(metric_defs::PLANTS_PLANTED.name, "category" => planted.category.to_string())
            .increment(1);
        info!(
            index = planted.index,
            category = %planted.category,
            x = planted.position.x,
            y = planted.position.y,
            "new plant"
        );

        if self.session.is_connected() {
            if let Err(e) = self.session.pulse_led(self.led_pulse) {
                warn!(error = %e, "could not pulse LED");
            }
        }
    }

    /// Run a console command and return the text to show.
    pub fn handle_command(&mut self, command: AppCommand) -> String {
        match command {
            AppCommand::Connect => match &self.opener {
                None => "No serial port configured".to_string(),
                Some(opener) => match self.session.connect(&**opener) {
                    Ok(()) => self.session.current_status().message,
                    Err(e) => e.to_string(),
                },
            },
            AppCommand::Disconnect => {
                self.session.disconnect();
                self.session.current_status().message
            }
            AppCommand::Plant(preferred) => {
                if self.session.is_connected() {
                    return "Planting follows the device button while connected".to_string();
                }
                let planted = self.garden.plant(&self.joystick, true, preferred);
                self.on_planted(planted);
                format!(
                    "Planted {} at ({:.0}, {:.0})",
                    planted.category, planted.position.x, planted.position.y
                )
            }
            AppCommand::Joystick { dx, dy } => {
                self.joystick = reading_from_offset(dx, dy, self.joystick_radius);
                format!(
                    "Joystick: moisture {} light {}",
                    self.joystick.moisture, self.joystick.light
                )
            }
            AppCommand::Status => self.status_line(),
            AppCommand::Quit => {
                self.running = false;
                "Bye".to_string()
            }
        }
    }

    /// One-line summary of the connection and the garden.
    pub fn status_line(&self) -> String {
        let ConnectionStatus { message, .. } = self.session.current_status();
        let reading = self.current_reading();
        let [bass, melody, harmony] = self.garden.category_counts();
        format!(
            "{message} | plants {} (B{bass} M{melody} H{harmony}) | health {:.0} | moisture {} light {} trigger {}",
            self.garden.len(),
            self.garden.aggregate_health(),
            reading.moisture,
            reading.light,
            if reading.triggered { "down" } else { "up" },
        )
    }

    /// Tick until `stop` is set, `quit` is entered or the console closes.
    pub fn run(&mut self, pacer: &mut TickPacer, console: &Receiver<String>, stop: &AtomicBool) {
        let mut last_state = self.session.state();

        while self.running && !stop.load(Ordering::SeqCst) {
            loop {
                match console.try_recv() {
                    Ok(line) if line.trim().is_empty() => {}
                    Ok(line) => match line.parse::<AppCommand>() {
                        Ok(command) => println!("{}", self.handle_command(command)),
                        Err(e) => println!("{e}"),
                    },
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.running = false;
                        break;
                    }
                }
            }

            let now = pacer.wait_for_next_tick();
            self.step(now);

            let (state, status) = self.session.connection();
            if state != last_state {
                if state == SessionState::Disconnected {
                    println!("{}", status.message);
                }
                last_state = state;
            }

            if let Some(summary) = pacer.check_summary() {
                info!(
                    elapsed = %summary.elapsed,
                    ticks = summary.total_ticks,
                    rate_hz = %format!("{:.1}", summary.tick_rate_hz),
                    plants = self.garden.len(),
                    health = %format!("{:.0}", self.garden.aggregate_health()),
                    "garden running"
                );
            }
        }

        self.session.disconnect();
        let stats = pacer.stats();
        info!(
            ticks = stats.ticks,
            lag_warnings = stats.lag_warnings,
            max_lag_ms = stats.max_lag_ms,
            plants = self.garden.len(),
            "garden stopped"
        );
    }
}
