//! This crate provides a driver for the PZEM-6L24 three-phase power meter.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag, and needs no allocator.
//!
//! It uses Modbus RTU under the hood ("read input registers" only), and is suitable for
//! interfacing with the meter over serial/UART or RS485.
//!
//! The serial port used for meter comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//!
//! A [meter::Meter] polls every register group of the meter in a fixed order, keeps the latest
//! value of each (quantity, phase) cell in a [table::MeasurementTable], and pushes defined values
//! to registered [observer::Sink]s. A group that fails to read only loses its own cells until the
//! next poll.
//!
//! ```no_run
//! # fn demo<T: pzem6l24::transport::Transport, C: pzem6l24::transport::Clock>(port: T, clock: C) {
//! use pzem6l24::{
//!     config::MeterConfig,
//!     meter::Meter,
//!     types::{Phase, Quantity, Subscription},
//! };
//!
//! let mut meter: Meter<T, C, fn(f32)> = Meter::new(port, clock, MeterConfig::default());
//! meter
//!     .register_observer(Subscription::new(Quantity::Voltage, Phase::Combined), |v| {
//!         let _ = v;
//!     })
//!     .ok();
//! meter.setup().ok();
//! loop {
//!     meter.service();
//! }
//! # }
//! ```

#![cfg_attr(feature = "no_std", no_std)]

pub mod config;
pub mod crc;
pub mod decode;
pub mod error;
pub mod meter;
pub mod observer;
pub mod reader;
pub mod register;
pub mod table;
pub mod transport;
pub mod types;

#[cfg(test)]
mod mock_serial;
