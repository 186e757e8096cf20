use std::{env, time::Instant};

use inquire::Select;
use pzem6l24::{
    config::MeterConfig,
    meter::Meter,
    transport::{self, Clock, Transport},
    types::{Phase, Quantity, Subscription},
};
use serialport::SerialPort;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = 9600;
const MODBUS_UNIT_ID: u8 = 0xF8;
const POLL_INTERVAL_MS: u32 = 5_000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

impl Transport for PortWrapper {
    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        self.0
            .bytes_to_read()
            .map(|count| count as usize)
            .map_err(|e| IoError(e.into()))
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.0
            .clear(serialport::ClearBuffer::Input)
            .map_err(|e| IoError(e.into()))
    }
}

/// Milliseconds since the program started.
pub struct StdClock(Instant);

impl Clock for StdClock {
    fn now(&mut self) -> transport::Instant {
        transport::Instant::from_ticks(self.0.elapsed().as_millis() as u32)
    }

    fn yield_now(&mut self) {
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}

fn printer(label: &'static str) -> Box<dyn FnMut(f32)> {
    Box::new(move |value: f32| println!("{label}: {value:.2}"))
}

fn main() {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        // List available serial ports
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        // Interactive selection
        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    // Open serial port
    let port = serialport::new(&port_name, BAUD_RATE)
        .timeout(std::time::Duration::from_millis(10))
        .open()
        .expect("Failed to open serial port");

    let config = MeterConfig::new(MODBUS_UNIT_ID, POLL_INTERVAL_MS);
    let mut meter: Meter<PortWrapper, StdClock, Box<dyn FnMut(f32)>> =
        Meter::new(PortWrapper(port), StdClock(Instant::now()), config);

    let subscriptions = [
        (Quantity::Voltage, Phase::A, "Voltage A (V)"),
        (Quantity::Voltage, Phase::B, "Voltage B (V)"),
        (Quantity::Voltage, Phase::C, "Voltage C (V)"),
        (Quantity::Voltage, Phase::Combined, "Voltage avg (V)"),
        (Quantity::Current, Phase::A, "Current A (A)"),
        (Quantity::Current, Phase::B, "Current B (A)"),
        (Quantity::Current, Phase::C, "Current C (A)"),
        (Quantity::Frequency, Phase::A, "Frequency (Hz)"),
        (Quantity::ActivePower, Phase::Combined, "Active power (W)"),
        (Quantity::ApparentPower, Phase::Combined, "Apparent power (VA)"),
        (Quantity::PowerFactor, Phase::Combined, "Power factor"),
        (Quantity::ActiveEnergy, Phase::Combined, "Active energy (kWh)"),
        (Quantity::VoltagePhaseAngle, Phase::B, "Voltage angle B (deg)"),
        (Quantity::VoltagePhaseAngle, Phase::C, "Voltage angle C (deg)"),
    ];
    for (quantity, phase, label) in subscriptions {
        meter
            .register_observer(Subscription::new(quantity, phase), printer(label))
            .expect("Too many observers");
    }

    meter.setup().expect("Failed to clear serial input");
    meter.dump_config();

    loop {
        if let Some(summary) = meter.service() {
            println!(
                "--- {} of 13 register groups read ---",
                summary.succeeded()
            );
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}
