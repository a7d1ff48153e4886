//! `rhythm-garden`: run the garden host, the probe host, or list serial ports.

use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use garden_runner::{
    list_ports, GardenApp, PortOpener, ProbeApp, RunnerConfig, SerialPortOpener, TickPacer,
};
use std::error::Error;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rhythm-garden")]
#[command(about = "A musical garden grown from soil moisture and light")]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the garden
    Garden {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Serial port of the sensor board (overrides the config file)
        #[arg(short, long)]
        port: Option<String>,

        /// Seed for plant placement
        #[arg(long)]
        seed: Option<u64>,

        /// Start with one plant of each kind
        #[arg(long)]
        starter_plants: bool,

        /// Serve Prometheus metrics on this address
        #[cfg(feature = "prometheus")]
        #[arg(long)]
        metrics_addr: Option<std::net::SocketAddr>,
    },

    /// Talk to the bench probe sketch
    Probe {
        /// Serial port of the probe board
        #[arg(short, long)]
        port: String,

        #[arg(long, default_value_t = 9600)]
        baud_rate: u32,
    },

    /// List available serial ports
    ListPorts,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Forward stdin lines to a channel. The channel closes at end of input.
fn spawn_console() -> Result<Receiver<String>, Box<dyn Error>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::Builder::new().name("console".to_string()).spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    })?;
    Ok(rx)
}

fn install_stop_flag() -> Result<Arc<AtomicBool>, Box<dyn Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, stopping...");
        flag.store(true, Ordering::SeqCst);
    })?;
    Ok(stop)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Garden {
            config,
            port,
            seed,
            starter_plants,
            #[cfg(feature = "prometheus")]
            metrics_addr,
        } => {
            let mut config = match config {
                Some(path) => RunnerConfig::load(&path)?,
                None => RunnerConfig::default(),
            };
            if port.is_some() {
                config.serial.port = port;
            }
            if seed.is_some() {
                config.garden.seed = seed;
            }
            if starter_plants {
                config.garden.seed_starter_plants = true;
            }

            #[cfg(feature = "prometheus")]
            if let Some(addr) = metrics_addr {
                garden_metrics::install_prometheus(addr)?;
                tracing::info!(%addr, "serving metrics");
            }

            run_garden(config)
        }
        Commands::Probe { port, baud_rate } => {
            let opener = SerialPortOpener {
                baud_rate,
                ..SerialPortOpener::new(port)
            };
            run_probe(Box::new(opener))
        }
        Commands::ListPorts => {
            let ports = list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found");
            }
            for port in ports {
                println!("{port}");
            }
            Ok(())
        }
    }
}

fn run_garden(config: RunnerConfig) -> Result<(), Box<dyn Error>> {
    let opener = config
        .serial_opener()
        .map(|o| Box::new(o) as Box<dyn PortOpener>);
    let has_port = opener.is_some();
    let mut app = GardenApp::new(&config, opener)?;

    println!("Rhythm garden");
    println!("Commands: connect, disconnect, plant [x y], joystick <dx> <dy>, status, quit");
    if has_port {
        println!("{}", app.handle_command(garden_runner::AppCommand::Connect));
    } else {
        println!("No serial port configured, use the joystick command to set conditions");
    }

    let stop = install_stop_flag()?;
    let console = spawn_console()?;
    let mut pacer = TickPacer::new(&config.tick);
    app.run(&mut pacer, &console, &stop);

    println!("{}", app.status_line());
    Ok(())
}

fn run_probe(opener: Box<dyn PortOpener>) -> Result<(), Box<dyn Error>> {
    let mut app = ProbeApp::new(opener);
    println!("Press Enter (or type 'toggle') to flip the LED, 'status' to show readings, 'quit' to exit");
    match app.connect() {
        Ok(()) => println!("{}", app.session().current_status().message),
        Err(e) => println!("{e}"),
    }

    let stop = install_stop_flag()?;
    let console = spawn_console()?;

    while !stop.load(Ordering::SeqCst) {
        app.refresh();
        match console.recv_timeout(Duration::from_millis(50)) {
            Ok(line) => match line.trim() {
                "" | "toggle" => match app.toggle_led() {
                    Ok(on) => println!("LED {}", if on { "ON" } else { "OFF" }),
                    Err(e) => println!("{e}"),
                },
                "status" => println!("{}", app.status_line()),
                "connect" => match app.connect() {
                    Ok(()) => println!("{}", app.session().current_status().message),
                    Err(e) => println!("{e}"),
                },
                "quit" | "exit" => break,
                other => println!("unknown command '{other}'"),
            },
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    app.disconnect();
    Ok(())
}
